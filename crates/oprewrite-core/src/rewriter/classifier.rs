/*!
# Type Classifier

Decides whether an operand is of the configured target type, looking through
transparent conversion wrappers first.
*/

use crate::tree::{ExprTree, NodeId, NodeKind};

/// Structural, side-effect free operand classification
#[derive(Debug, Clone)]
pub struct TypeClassifier {
    target_type: String,
}

impl TypeClassifier {
    pub fn new(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
        }
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// Strip `ImplicitConversion` wrappers until a real expression is reached
    pub fn underlying(&self, tree: &ExprTree, mut expr: NodeId) -> NodeId {
        loop {
            let node = tree.node(expr);
            match (&node.kind, node.operands.first()) {
                (NodeKind::ImplicitConversion, Some(inner)) => expr = *inner,
                _ => return expr,
            }
        }
    }

    pub fn is_target_type(&self, tree: &ExprTree, expr: NodeId) -> bool {
        let inner = self.underlying(tree, expr);
        tree.node(inner)
            .ty
            .as_deref()
            .is_some_and(|ty| canonical_type_name(ty) == self.target_type)
    }
}

/// Drop cv-qualifiers and a trailing reference from a written type name
pub fn canonical_type_name(ty: &str) -> &str {
    let mut name = ty.trim();
    loop {
        let stripped = name
            .strip_prefix("const ")
            .or_else(|| name.strip_prefix("volatile "))
            .or_else(|| name.strip_suffix('&'))
            .or_else(|| name.strip_suffix(" const"));
        match stripped {
            Some(rest) => name = rest.trim(),
            None => return name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;

    #[test]
    fn test_underlying_strips_nested_conversions() {
        let mut builder = TreeBuilder::new("lambda");
        let lambda = builder.leaf(0..6, Some("float"));
        let once = builder.implicit(lambda, Some("double"));
        let twice = builder.implicit(once, Some("complex"));
        let tree = builder.finish(twice);

        let classifier = TypeClassifier::new("complex");
        assert_eq!(classifier.underlying(&tree, twice), lambda);
        // the wrapper's own type does not count
        assert!(!classifier.is_target_type(&tree, twice));
    }

    #[test]
    fn test_target_type_matches_qualified_spellings() {
        let mut builder = TreeBuilder::new("z w v");
        let z = builder.leaf(0..1, Some("const complex &"));
        let w = builder.leaf(2..3, Some("complex"));
        let v = builder.leaf(4..5, Some("complex*"));
        let root = builder.other(0..5, vec![z, w, v], None);
        let tree = builder.finish(root);

        let classifier = TypeClassifier::new("complex");
        assert!(classifier.is_target_type(&tree, z));
        assert!(classifier.is_target_type(&tree, w));
        assert!(!classifier.is_target_type(&tree, v));
        assert!(!classifier.is_target_type(&tree, root));
    }

    #[test]
    fn test_canonical_type_name() {
        assert_eq!(canonical_type_name("const complex&"), "complex");
        assert_eq!(canonical_type_name(" volatile float "), "float");
        assert_eq!(canonical_type_name("complex const &"), "complex");
        assert_eq!(canonical_type_name("complex*"), "complex*");
    }
}
