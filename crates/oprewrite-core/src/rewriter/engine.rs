/*!
# Rewrite Engine

Walks the expression tree top-down and replaces every target-type operator
call and converting constructor call with an explicit free-function call.

Operands are rewritten eagerly, at the moment their parent is processed, so
the parent's replacement is composed from already-final operand text. That
operand-first order is driven by an explicit worklist rather than the call
stack, so arbitrarily long operator chains are fine. The
parent then marks its whole subtree as rewritten and the later, ambient
visits of those descendants become no-ops.
*/

use std::collections::BTreeSet;

use tracing::{debug, trace, warn};

use crate::source::SourceRange;
use crate::tree::{BinaryOp, ExprTree, NodeId, NodeKind};
use crate::{Result, RewriteConfig, RewriteError};

use super::classifier::TypeClassifier;
use super::edit_buffer::EditBuffer;
use super::report::{RewriteOutput, RewriteReport, RewriteWarning};
use super::tracker::RewrittenSet;

/// How a node is being reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    /// By the ambient pre-order traversal; the traversal itself descends
    Traversal,
    /// As (part of) an operand whose text a parent is about to use
    Operand,
}

/// Pending engine work
#[derive(Debug, Clone, Copy)]
enum Task {
    Visit {
        id: NodeId,
        reach: Reach,
        depth: usize,
    },
    /// Both operands are settled; synthesize the operator call
    FinishOperator(NodeId),
    /// Every argument is settled; synthesize the conversion call
    FinishConstructor(NodeId),
}

/// Single-pass rewriter over one source buffer and its tree
pub struct RewriteEngine<'a> {
    tree: &'a ExprTree,
    classifier: TypeClassifier,
    rewritten: RewrittenSet,
    edits: EditBuffer<'a>,
    report: RewriteReport,
    warned: BTreeSet<SourceRange>,
    max_depth: Option<usize>,
}

impl<'a> RewriteEngine<'a> {
    pub fn new(source: &'a str, tree: &'a ExprTree, config: &RewriteConfig) -> Self {
        Self {
            tree,
            classifier: TypeClassifier::new(config.target_type.clone()),
            rewritten: RewrittenSet::new(),
            edits: EditBuffer::new(source),
            report: RewriteReport::new(),
            warned: BTreeSet::new(),
            max_depth: config.max_depth,
        }
    }

    /// Visit every node of the tree in pre-order, then finalize
    pub fn run(mut self) -> Result<RewriteOutput> {
        let tree = self.tree;
        for id in tree.preorder() {
            self.visit(id)?;
        }
        self.finish()
    }

    /// Process one node as the ambient traversal reaches it
    pub fn visit(&mut self, id: NodeId) -> Result<()> {
        self.rewrite_node(id, Reach::Traversal)
    }

    pub fn is_unrewritten(&self, id: NodeId) -> bool {
        self.rewritten.is_unrewritten(self.tree.node(id).range)
    }

    /// Current text of a node, reflecting every rewrite made so far
    pub fn text_of(&self, id: NodeId) -> Result<String> {
        self.edits.text_for(self.tree.node(id).range)
    }

    pub fn report(&self) -> &RewriteReport {
        &self.report
    }

    /// Splice all edits into the source and hand back text, report and edits
    pub fn finish(self) -> Result<RewriteOutput> {
        let text = self.edits.finalize()?;
        let edits = self
            .edits
            .edits()
            .map(|(range, text)| (range, text.to_string()))
            .collect();
        Ok(RewriteOutput {
            text,
            report: self.report,
            edits,
        })
    }

    /// Drain the worklist seeded with `id`; operands run before their parent finishes
    fn rewrite_node(&mut self, id: NodeId, reach: Reach) -> Result<()> {
        let mut work = vec![Task::Visit {
            id,
            reach,
            depth: 0,
        }];

        while let Some(task) = work.pop() {
            match task {
                Task::Visit { id, reach, depth } => self.expand(id, reach, depth, &mut work)?,
                Task::FinishOperator(id) => self.finish_operator_call(id)?,
                Task::FinishConstructor(id) => self.finish_constructor_call(id)?,
            }
        }
        Ok(())
    }

    fn expand(&mut self, id: NodeId, reach: Reach, depth: usize, work: &mut Vec<Task>) -> Result<()> {
        let tree = self.tree;
        let node = tree.node(id);

        if let Some(limit) = self.max_depth {
            if depth > limit {
                return Err(RewriteError::NestingTooDeep {
                    range: node.range,
                    limit,
                });
            }
        }

        self.report.nodes_visited += 1;
        if !self.rewritten.is_unrewritten(node.range) {
            self.report.skipped_revisits += 1;
            trace!(range = %node.range, "already rewritten, skipping");
            return Ok(());
        }

        let operand = |id: NodeId| Task::Visit {
            id,
            reach: Reach::Operand,
            depth: depth + 1,
        };

        match &node.kind {
            NodeKind::BinaryOperatorCall(op) if op.is_arithmetic() => {
                let &[left, right] = node.operands.as_slice() else {
                    return Err(RewriteError::MalformedNode {
                        range: node.range,
                        message: format!(
                            "operator call `{op}` has {} operands, expected 2",
                            node.operands.len()
                        ),
                    });
                };
                work.push(Task::FinishOperator(id));
                work.push(operand(self.classifier.underlying(tree, right)));
                work.push(operand(self.classifier.underlying(tree, left)));
            }
            NodeKind::ConvertingConstructorCall => {
                work.push(Task::FinishConstructor(id));
                work.extend(
                    node.operands
                        .iter()
                        .rev()
                        .map(|&arg| operand(self.classifier.underlying(tree, arg))),
                );
            }
            _ if reach == Reach::Operand => {
                // the parent is about to read this node's text, so anything
                // rewritable inside it has to be settled first
                work.extend(node.children.iter().rev().map(|&child| operand(child)));
            }
            _ => {}
        }
        Ok(())
    }

    fn finish_operator_call(&mut self, id: NodeId) -> Result<()> {
        let tree = self.tree;
        let node = tree.node(id);
        let (NodeKind::BinaryOperatorCall(op), &[left, right]) = (&node.kind, node.operands.as_slice()) else {
            return Ok(());
        };
        let Some(op_name) = op.function_name() else {
            return Ok(());
        };

        let left = self.classifier.underlying(tree, left);
        let right = self.classifier.underlying(tree, right);
        let target = self.classifier.target_type().to_string();
        let function = match (
            self.classifier.is_target_type(tree, left),
            self.classifier.is_target_type(tree, right),
        ) {
            (true, true) => format!("{target}_{op_name}"),
            (true, false) => format!("{target}_{op_name}_real"),
            (false, true) => format!("real_{op_name}_{target}"),
            (false, false) => {
                self.warn_unclassified(id, op, left, right);
                return Ok(());
            }
        };

        let text = format!(
            "{function}({},{})",
            self.text_of(left)?,
            self.text_of(right)?
        );
        self.commit(id, &function, text)
    }

    fn finish_constructor_call(&mut self, id: NodeId) -> Result<()> {
        let tree = self.tree;
        let node = tree.node(id);

        let args = node
            .operands
            .iter()
            .map(|&operand| self.text_of(self.classifier.underlying(tree, operand)))
            .collect::<Result<Vec<_>>>()?;

        let function = format!("to_{}", self.classifier.target_type());
        let text = format!("{function}({})", args.join(","));
        self.commit(id, &function, text)
    }

    fn commit(&mut self, id: NodeId, function: &str, text: String) -> Result<()> {
        let range = self.tree.node(id).range;
        debug!(%range, %function, replacement = %text, "rewriting");

        self.edits.replace(range, text)?;
        self.rewritten.mark(self.tree, id);
        self.report.record_rewrite(function);
        Ok(())
    }

    fn warn_unclassified(&mut self, id: NodeId, op: &BinaryOp, left: NodeId, right: NodeId) {
        let tree = self.tree;
        let range = tree.node(id).range;
        if !self.warned.insert(range) {
            return;
        }

        let left_type = tree.node(left).ty.clone();
        let right_type = tree.node(right).ty.clone();
        warn!(
            %range,
            operator = %op,
            left = ?left_type,
            right = ?right_type,
            target = %self.classifier.target_type(),
            "operator call has no operand of the target type; leaving it unchanged"
        );

        self.report.warnings.push(RewriteWarning {
            range,
            operator: op.spelling().to_string(),
            left_type,
            right_type,
            message: format!(
                "neither operand of `{op}` is of type `{}`",
                self.classifier.target_type()
            ),
        });
    }
}
