/*!
# Rewritten-Set Tracker

Memo of source ranges already folded into a completed replacement. Marking a
node marks its whole subtree, which is what lets the ambient traversal skip
descendants an ancestor has already consumed.
*/

use std::collections::BTreeSet;

use crate::source::SourceRange;
use crate::tree::{ExprTree, NodeId};

/// Grow-only set of rewritten ranges for one pass
#[derive(Debug, Default)]
pub struct RewrittenSet {
    ranges: BTreeSet<SourceRange>,
}

impl RewrittenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the range of `node` and of every node below it
    pub fn mark(&mut self, tree: &ExprTree, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let current = tree.node(id);
            // a range already present was marked together with its subtree
            if self.ranges.insert(current.range) {
                stack.extend(current.children.iter().copied());
            }
        }
    }

    pub fn is_unrewritten(&self, range: SourceRange) -> bool {
        !self.ranges.contains(&range)
    }

    pub fn contains(&self, range: SourceRange) -> bool {
        self.ranges.contains(&range)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{BinaryOp, TreeBuilder};

    #[test]
    fn test_mark_covers_whole_subtree() {
        let source = "a + b * c";
        let mut builder = TreeBuilder::new(source);
        let a = builder.leaf(0..1, Some("complex"));
        let b = builder.leaf(4..5, Some("complex"));
        let c = builder.leaf(8..9, Some("complex"));
        let mul = builder.binary(BinaryOp::Mul, b, c, Some("complex"));
        let add = builder.binary(BinaryOp::Add, a, mul, Some("complex"));
        let tree = builder.finish(add);

        let mut set = RewrittenSet::new();
        assert!(set.is_unrewritten(tree.node(c).range));

        set.mark(&tree, mul);
        assert!(!set.is_unrewritten(tree.node(mul).range));
        assert!(!set.is_unrewritten(tree.node(b).range));
        assert!(!set.is_unrewritten(tree.node(c).range));
        assert!(set.is_unrewritten(tree.node(a).range));
        assert!(set.is_unrewritten(tree.node(add).range));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_marking_twice_is_harmless() {
        let mut builder = TreeBuilder::new("x");
        let x = builder.leaf(0..1, None);
        let tree = builder.finish(x);

        let mut set = RewrittenSet::new();
        set.mark(&tree, x);
        set.mark(&tree, x);
        assert_eq!(set.len(), 1);
        assert!(set.contains(SourceRange::new(0, 1)));
    }
}
