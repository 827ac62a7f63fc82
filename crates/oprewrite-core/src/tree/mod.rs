// Expression tree handed from a front end to the rewrite engine
// Nodes live in an arena and are addressed by NodeId; the engine only reads it.

pub mod builder;
pub use builder::TreeBuilder;

use std::fmt;

use serde::Serialize;

use crate::source::SourceRange;

/// Index of a node inside its owning `ExprTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

/// Binary operator spelling of an operator call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Any other spelling (`==`, `<`, `%`, ...); never rewritten
    Other(String),
}

impl BinaryOp {
    pub fn from_spelling(spelling: &str) -> Self {
        match spelling {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            other => BinaryOp::Other(other.to_string()),
        }
    }

    pub fn spelling(&self) -> &str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Other(spelling) => spelling,
        }
    }

    /// Name fragment used in synthesized calls, `None` for unsupported spellings
    pub fn function_name(&self) -> Option<&'static str> {
        match self {
            BinaryOp::Add => Some("add"),
            BinaryOp::Sub => Some("sub"),
            BinaryOp::Mul => Some("mul"),
            BinaryOp::Div => Some("div"),
            BinaryOp::Other(_) => None,
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        self.function_name().is_some()
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

/// What the engine needs to know about a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// Call of an overloaded binary operator; operands are `[left, right]`
    BinaryOperatorCall(BinaryOp),
    /// Construction of a target-type value from its arguments
    ConvertingConstructorCall,
    /// Transparent conversion wrapping exactly one operand
    ImplicitConversion,
    /// Anything else
    Other,
}

/// A node of the expression tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExprNode {
    pub kind: NodeKind,
    pub range: SourceRange,
    /// Resolved static type name, when the node is a typed expression
    pub ty: Option<String>,
    /// All structural children, in source order
    pub children: Vec<NodeId>,
    /// Operand sub-expressions, in order; a subset of the descendants
    pub operands: Vec<NodeId>,
    /// Front-end syntax label, for diagnostics
    pub syntax: &'static str,
}

impl ExprNode {
    pub fn new(kind: NodeKind, range: SourceRange) -> Self {
        Self {
            kind,
            range,
            ty: None,
            children: Vec::new(),
            operands: Vec::new(),
            syntax: "expr",
        }
    }

    pub fn with_type(mut self, ty: Option<String>) -> Self {
        self.ty = ty;
        self
    }

    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = children;
        self
    }

    pub fn with_operands(mut self, operands: Vec<NodeId>) -> Self {
        self.operands = operands;
        self
    }

    pub fn with_syntax(mut self, syntax: &'static str) -> Self {
        self.syntax = syntax;
        self
    }
}

/// Arena-backed expression tree for one source file
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExprTree {
    nodes: Vec<ExprNode>,
    root: Option<NodeId>,
}

impl ExprTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; its children must already be in the tree
    pub fn push(&mut self, node: ExprNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&ExprNode> {
        self.nodes.get(id.0)
    }

    /// Node by id. Ids are only handed out by `push`, so they are always valid
    /// for the tree that produced them.
    pub fn node(&self, id: NodeId) -> &ExprNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order walk of the whole tree, starting at the root
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    /// First node in pre-order whose range is exactly `range`
    pub fn find_by_range(&self, range: SourceRange) -> Option<NodeId> {
        self.preorder().find(|id| self.node(*id).range == range)
    }

    /// Nodes of the given kind, in pre-order
    pub fn nodes_of_kind<'t>(&'t self, kind: &'t NodeKind) -> impl Iterator<Item = NodeId> + 't {
        self.preorder()
            .filter(move |id| std::mem::discriminant(&self.node(*id).kind) == std::mem::discriminant(kind))
    }
}

/// Depth-first pre-order iterator over node ids
pub struct Preorder<'t> {
    tree: &'t ExprTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = &self.tree.node(id).children;
        self.stack.extend(children.iter().rev().copied());
        Some(id)
    }
}
