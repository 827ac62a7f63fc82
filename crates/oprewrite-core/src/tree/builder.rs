// Programmatic construction of expression trees over a source string
// Used by tests and by front ends that already know node kinds and types.

use crate::source::SourceRange;

use super::{BinaryOp, ExprNode, ExprTree, NodeId, NodeKind};

/// Builds an `ExprTree` bottom-up: children are created before parents
pub struct TreeBuilder<'s> {
    source: &'s str,
    tree: ExprTree,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            tree: ExprTree::new(),
        }
    }

    /// Range of the first occurrence of `needle`.
    ///
    /// Needles that start or end with an identifier character only match at
    /// identifier boundaries, so `eta` is not found inside `cosTheta`.
    pub fn locate(&self, needle: &str) -> Option<SourceRange> {
        self.locate_nth(needle, 0)
    }

    /// Range of the `nth` (zero-based) boundary-respecting occurrence of `needle`
    pub fn locate_nth(&self, needle: &str, nth: usize) -> Option<SourceRange> {
        let bytes = self.source.as_bytes();
        let starts_word = needle.bytes().next().is_some_and(is_ident_byte);
        let ends_word = needle.bytes().last().is_some_and(is_ident_byte);

        self.source
            .match_indices(needle)
            .map(|(begin, _)| SourceRange::new(begin, begin + needle.len()))
            .filter(|range| {
                let clean_start = !starts_word
                    || range.begin == 0
                    || !is_ident_byte(bytes[range.begin - 1]);
                let clean_end =
                    !ends_word || range.end == bytes.len() || !is_ident_byte(bytes[range.end]);
                clean_start && clean_end
            })
            .nth(nth)
    }

    /// Range spanning from the start of `first` to the end of `last`
    pub fn cover(&self, first: NodeId, last: NodeId) -> SourceRange {
        SourceRange::new(self.tree.node(first).range.begin, self.tree.node(last).range.end)
    }

    /// Typed leaf such as an identifier or literal
    pub fn leaf(&mut self, range: impl Into<SourceRange>, ty: Option<&str>) -> NodeId {
        self.tree.push(
            ExprNode::new(NodeKind::Other, range.into())
                .with_type(ty.map(str::to_string))
                .with_syntax("leaf"),
        )
    }

    /// Operator call spanning from its left operand to its right operand
    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId, ty: Option<&str>) -> NodeId {
        let range = self.cover(left, right);
        self.tree.push(
            ExprNode::new(NodeKind::BinaryOperatorCall(op), range)
                .with_type(ty.map(str::to_string))
                .with_children(vec![left, right])
                .with_operands(vec![left, right])
                .with_syntax("binary"),
        )
    }

    /// Converting constructor call whose text occupies `range`
    pub fn construct(&mut self, range: impl Into<SourceRange>, args: Vec<NodeId>, ty: Option<&str>) -> NodeId {
        self.tree.push(
            ExprNode::new(NodeKind::ConvertingConstructorCall, range.into())
                .with_type(ty.map(str::to_string))
                .with_children(args.clone())
                .with_operands(args)
                .with_syntax("construct"),
        )
    }

    /// Transparent conversion around `inner`, sharing its range
    pub fn implicit(&mut self, inner: NodeId, ty: Option<&str>) -> NodeId {
        let range = self.tree.node(inner).range;
        self.tree.push(
            ExprNode::new(NodeKind::ImplicitConversion, range)
                .with_type(ty.map(str::to_string))
                .with_children(vec![inner])
                .with_operands(vec![inner])
                .with_syntax("implicit"),
        )
    }

    /// Any other node (statement, parenthesized expression, call, ...)
    pub fn other(&mut self, range: impl Into<SourceRange>, children: Vec<NodeId>, ty: Option<&str>) -> NodeId {
        self.tree.push(
            ExprNode::new(NodeKind::Other, range.into())
                .with_type(ty.map(str::to_string))
                .with_children(children)
                .with_syntax("other"),
        )
    }

    /// Push a fully specified node
    pub fn node(&mut self, node: ExprNode) -> NodeId {
        self.tree.push(node)
    }

    pub fn finish(mut self, root: NodeId) -> ExprTree {
        self.tree.set_root(root);
        self.tree
    }
}

fn is_ident_byte(byte: u8) -> bool {
    byte == b'_' || byte.is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_respects_identifier_boundaries() {
        let builder = TreeBuilder::new("cosTheta + eta/lambda");
        assert_eq!(builder.locate("eta"), Some(SourceRange::new(11, 14)));
        assert_eq!(builder.locate("cosTheta"), Some(SourceRange::new(0, 8)));
        assert_eq!(builder.locate("/"), Some(SourceRange::new(14, 15)));
        assert_eq!(builder.locate("theta"), None);
    }

    #[test]
    fn test_locate_nth_occurrence() {
        let builder = TreeBuilder::new("a*b + a*c");
        assert_eq!(builder.locate_nth("a", 1), Some(SourceRange::new(6, 7)));
        assert_eq!(builder.locate_nth("a", 2), None);
    }

    #[test]
    fn test_binary_covers_its_operands() {
        let source = "x * y";
        let mut builder = TreeBuilder::new(source);
        let x = builder.leaf(0..1, Some("complex"));
        let y = builder.leaf(4..5, Some("float"));
        let mul = builder.binary(BinaryOp::Mul, x, y, Some("complex"));
        let tree = builder.finish(mul);

        let node = tree.node(mul);
        assert_eq!(node.range, SourceRange::new(0, 5));
        assert_eq!(node.operands, vec![x, y]);
        assert_eq!(tree.root(), Some(mul));
    }
}
