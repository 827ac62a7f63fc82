use anyhow::{anyhow, Result};
use std::collections::HashMap;
use tracing::{debug, warn};
use tree_sitter::Node;

use crate::rewriter::classifier::canonical_type_name;
use crate::source::SourceRange;
use crate::tree::{BinaryOp, ExprNode, ExprTree, NodeId, NodeKind};

use super::scope::{find_function_declarator, node_text, unwrap_declarator, TypeEnv};
use super::Frontend;

/// Arithmetic promotion order for builtin operand types
const ARITHMETIC_RANK: &[&str] = &[
    "bool",
    "char",
    "short",
    "int",
    "unsigned",
    "unsigned int",
    "long",
    "unsigned long",
    "long long",
    "unsigned long long",
    "float",
    "double",
    "long double",
];

/// C++ front end using tree-sitter-cpp
///
/// Every named syntax node becomes an expression node. Binary expressions with
/// an operand of the target type become operator calls, and calls or braced
/// literals naming the target type become converting constructor calls.
pub struct CppFrontend {
    parser: tree_sitter::Parser,
    target_type: String,
}

impl CppFrontend {
    pub fn new(target_type: impl Into<String>) -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .map_err(|e| anyhow!("Failed to set C++ language: {}", e))?;

        Ok(Self {
            parser,
            target_type: target_type.into(),
        })
    }
}

impl Frontend for CppFrontend {
    fn parse(&mut self, source: &str) -> Result<ExprTree> {
        let syntax = self
            .parser
            .parse(source, None)
            .ok_or_else(|| anyhow!("Failed to parse C++ source"))?;
        let root = syntax.root_node();

        if root.has_error() {
            warn!(
                errors = count_errors(root),
                "C++ source has syntax errors; rewriting the recovered tree"
            );
        }

        let mut lowering = Lowering {
            source,
            target: &self.target_type,
            env: TypeEnv::collect(root, source),
            records: Vec::new(),
            tree: ExprTree::new(),
            lowered: HashMap::new(),
        };
        let root_id = lowering
            .lower(root)
            .ok_or_else(|| anyhow!("C++ syntax tree has no root"))?;
        let mut tree = lowering.tree;
        tree.set_root(root_id);

        debug!(nodes = tree.len(), "lowered C++ syntax tree");
        Ok(tree)
    }

    fn name(&self) -> &'static str {
        "cpp"
    }
}

fn count_errors(root: Node<'_>) -> usize {
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            count += 1;
        }
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }
    count
}

/// Numeric literal type from its spelling
fn number_type(text: &str) -> &'static str {
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("0x") || lower.starts_with("0b") {
        return "int";
    }
    if lower.ends_with('f') {
        "float"
    } else if lower.contains('.') || lower.contains('e') {
        "double"
    } else if lower.ends_with('l') {
        "long"
    } else {
        "int"
    }
}

/// Result type of a builtin arithmetic operation
fn promote(left: Option<String>, right: Option<String>) -> Option<String> {
    match (left, right) {
        (Some(l), Some(r)) => {
            let rank = |ty: &str| {
                ARITHMETIC_RANK
                    .iter()
                    .position(|known| *known == canonical_type_name(ty))
            };
            match (rank(&l), rank(&r)) {
                (Some(a), Some(b)) if b > a => Some(r),
                _ => Some(l),
            }
        }
        (l, r) => l.or(r),
    }
}

fn is_boolean_operator(op: &str) -> bool {
    matches!(op, "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" | "and" | "or")
}

/// Lowers one tree-sitter syntax tree into an `ExprTree`
struct Lowering<'s> {
    source: &'s str,
    target: &'s str,
    env: TypeEnv,
    /// Enclosing struct/class names, innermost last
    records: Vec<String>,
    tree: ExprTree,
    /// tree-sitter node id to lowered node
    lowered: HashMap<usize, NodeId>,
}

/// Lowering work for one syntax node
enum Step<'t> {
    /// Open any scope the node introduces, then queue its children
    Enter(Node<'t>),
    /// Children are lowered; their ids start at this index of the result stack
    Exit(Node<'t>, usize),
}

fn opens_scope(kind: &str) -> bool {
    matches!(
        kind,
        "compound_statement"
            | "for_statement"
            | "for_range_loop"
            | "while_statement"
            | "do_statement"
            | "if_statement"
            | "switch_statement"
            | "lambda_expression"
            | "catch_clause"
    )
}

fn is_record(kind: &str) -> bool {
    matches!(kind, "struct_specifier" | "class_specifier" | "union_specifier")
}

impl<'s> Lowering<'s> {
    /// Post-order walk on an explicit stack; nesting depth is bounded only by memory
    fn lower(&mut self, root: Node<'_>) -> Option<NodeId> {
        let mut work = vec![Step::Enter(root)];
        let mut results: Vec<NodeId> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Step::Enter(node) => {
                    self.enter(node);
                    work.push(Step::Exit(node, results.len()));
                    let mut cursor = node.walk();
                    let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
                    work.extend(children.into_iter().rev().map(Step::Enter));
                }
                Step::Exit(node, mark) => {
                    let children = results.split_off(mark);
                    let id = self.exit(node, children);
                    results.push(id);
                }
            }
        }

        results.pop()
    }

    fn enter(&mut self, node: Node<'_>) {
        let kind = node.kind();
        if kind == "function_definition" {
            self.env.push_scope();
            let params = node
                .child_by_field_name("declarator")
                .and_then(find_function_declarator)
                .and_then(|declarator| declarator.child_by_field_name("parameters"));
            self.bind_parameters(params);
        } else if is_record(kind) {
            if let Some(name) = node.child_by_field_name("name") {
                self.records.push(node_text(name, self.source).to_string());
            }
        } else if opens_scope(kind) {
            self.env.push_scope();
            match kind {
                "for_range_loop" => self.bind_declarators(node),
                "lambda_expression" => {
                    let params = node
                        .child_by_field_name("declarator")
                        .and_then(|declarator| declarator.child_by_field_name("parameters"));
                    self.bind_parameters(params);
                }
                _ => {}
            }
        }
    }

    fn exit(&mut self, node: Node<'_>, children: Vec<NodeId>) -> NodeId {
        let kind = node.kind();
        match kind {
            "declaration" | "condition_declaration" => {
                // initializers are typed before the declared names come into scope
                self.bind_declarators(node);
                self.push(node, NodeKind::Other, None, children)
            }
            "binary_expression" => self.lower_binary(node, children),
            "call_expression" => self.lower_call(node, children),
            "compound_literal_expression" => self.lower_compound_literal(node, children),
            _ => {
                let ty = self.expression_type(node);
                let id = self.push(node, NodeKind::Other, ty, children);
                if kind == "function_definition" || opens_scope(kind) {
                    self.env.pop_scope();
                } else if is_record(kind) && node.child_by_field_name("name").is_some() {
                    self.records.pop();
                }
                id
            }
        }
    }

    fn push(&mut self, node: Node<'_>, kind: NodeKind, ty: Option<String>, children: Vec<NodeId>) -> NodeId {
        self.push_with_operands(node, kind, ty, children, Vec::new())
    }

    fn push_with_operands(
        &mut self,
        node: Node<'_>,
        kind: NodeKind,
        ty: Option<String>,
        children: Vec<NodeId>,
        operands: Vec<NodeId>,
    ) -> NodeId {
        let range = SourceRange::new(node.start_byte(), node.end_byte());
        let id = self.tree.push(
            ExprNode::new(kind, range)
                .with_type(ty)
                .with_children(children)
                .with_operands(operands)
                .with_syntax(node.kind()),
        );
        self.lowered.insert(node.id(), id);
        id
    }

    fn bind_parameters(&mut self, params: Option<Node<'_>>) {
        let Some(params) = params else {
            return;
        };
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if matches!(
                param.kind(),
                "parameter_declaration" | "optional_parameter_declaration"
            ) {
                self.bind_declarators(param);
            }
        }
    }

    /// Bring every name declared by `node` into the innermost scope
    fn bind_declarators(&mut self, node: Node<'_>) {
        let Some(base) = node.child_by_field_name("type") else {
            return;
        };
        let base = node_text(base, self.source);

        let mut cursor = node.walk();
        let declarators: Vec<Node<'_>> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            let Some(decl) = unwrap_declarator(declarator, self.source) else {
                continue;
            };
            if decl.function {
                continue;
            }

            let ty = if base == "auto" {
                declarator
                    .child_by_field_name("value")
                    .and_then(|value| self.type_of(value))
            } else {
                Some(decl.type_from(base))
            };
            if let Some(ty) = ty {
                self.env.bind(decl.name, ty);
            }
        }
    }

    fn lower_binary(&mut self, node: Node<'_>, children: Vec<NodeId>) -> NodeId {
        let op = node
            .child_by_field_name("operator")
            .map(|op| op.kind())
            .unwrap_or("");

        let left = node.child_by_field_name("left").and_then(|n| self.lowered_id(n));
        let right = node.child_by_field_name("right").and_then(|n| self.lowered_id(n));
        let (Some(left), Some(right)) = (left, right) else {
            return self.push(node, NodeKind::Other, None, children);
        };

        let left_ty = self.tree.node(left).ty.clone();
        let right_ty = self.tree.node(right).ty.clone();
        let involves_target = self.is_target(left_ty.as_deref()) || self.is_target(right_ty.as_deref());

        let ty = if is_boolean_operator(op) {
            Some("bool".to_string())
        } else if involves_target {
            Some(self.target.to_string())
        } else {
            promote(left_ty, right_ty)
        };

        if involves_target {
            self.push_with_operands(
                node,
                NodeKind::BinaryOperatorCall(BinaryOp::from_spelling(op)),
                ty,
                children,
                vec![left, right],
            )
        } else {
            self.push(node, NodeKind::Other, ty, children)
        }
    }

    fn lower_call(&mut self, node: Node<'_>, children: Vec<NodeId>) -> NodeId {
        let callee = node.child_by_field_name("function");
        let callee_name = callee
            .filter(|callee| matches!(callee.kind(), "identifier" | "type_identifier"))
            .map(|callee| node_text(callee, self.source));

        if callee_name == Some(self.target) {
            let args = node
                .child_by_field_name("arguments")
                .map(|args| self.arguments(args))
                .unwrap_or_default();
            return self.push_construction(node, children, args);
        }

        let ty = callee_name
            .and_then(|name| self.env.return_type(name))
            .map(str::to_string);
        self.push(node, NodeKind::Other, ty, children)
    }

    fn lower_compound_literal(&mut self, node: Node<'_>, children: Vec<NodeId>) -> NodeId {
        let ty = node
            .child_by_field_name("type")
            .map(|ty| node_text(ty, self.source).to_string());

        if ty.as_deref() == Some(self.target) {
            let args = node
                .child_by_field_name("value")
                .map(|value| self.arguments(value))
                .unwrap_or_default();
            return self.push_construction(node, children, args);
        }

        self.push(node, NodeKind::Other, ty, children)
    }

    /// A construction of the target type; a single target-typed argument is a copy
    fn push_construction(&mut self, node: Node<'_>, children: Vec<NodeId>, args: Vec<NodeId>) -> NodeId {
        let ty = Some(self.target.to_string());
        let is_copy = matches!(args.as_slice(), [arg] if self.is_target(self.tree.node(*arg).ty.as_deref()));

        if is_copy {
            self.push(node, NodeKind::Other, ty, children)
        } else {
            self.push_with_operands(node, NodeKind::ConvertingConstructorCall, ty, children, args)
        }
    }

    /// Lowered argument expressions of an argument or initializer list
    fn arguments(&self, list: Node<'_>) -> Vec<NodeId> {
        let mut cursor = list.walk();
        list.named_children(&mut cursor)
            .filter(|arg| !arg.is_extra())
            .filter_map(|arg| self.lowered_id(arg))
            .collect()
    }

    fn lowered_id(&self, node: Node<'_>) -> Option<NodeId> {
        self.lowered.get(&node.id()).copied()
    }

    fn type_of(&self, node: Node<'_>) -> Option<String> {
        self.lowered_id(node)
            .and_then(|id| self.tree.node(id).ty.clone())
    }

    fn is_target(&self, ty: Option<&str>) -> bool {
        ty.is_some_and(|ty| canonical_type_name(ty) == self.target)
    }

    fn current_record(&self) -> Option<&str> {
        self.records.last().map(String::as_str)
    }

    /// Static type of an expression whose children are already lowered
    fn expression_type(&self, node: Node<'_>) -> Option<String> {
        let field = |name: &str| node.child_by_field_name(name);

        match node.kind() {
            "identifier" => self
                .env
                .lookup(node_text(node, self.source), self.current_record())
                .map(str::to_string),
            "this" => self.current_record().map(|record| format!("{record}*")),
            "number_literal" => Some(number_type(node_text(node, self.source)).to_string()),
            "char_literal" => Some("char".to_string()),
            "string_literal" | "raw_string_literal" | "concatenated_string" => {
                Some("const char*".to_string())
            }
            "true" | "false" => Some("bool".to_string()),
            "sizeof_expression" => Some("size_t".to_string()),
            "parenthesized_expression" => {
                let mut cursor = node.walk();
                let inner = node
                    .named_children(&mut cursor)
                    .find(|child| !child.is_extra());
                inner.and_then(|inner| self.type_of(inner))
            }
            "field_expression" => {
                let object = field("argument").and_then(|arg| self.type_of(arg))?;
                let member = field("field")?;
                let record = canonical_type_name(object.trim_end_matches('*'));
                self.env
                    .field_type(record, node_text(member, self.source))
                    .map(str::to_string)
            }
            "unary_expression" => {
                let op = field("operator").map(|op| op.kind());
                if op == Some("!") {
                    Some("bool".to_string())
                } else {
                    field("argument").and_then(|arg| self.type_of(arg))
                }
            }
            "pointer_expression" => {
                let inner = field("argument").and_then(|arg| self.type_of(arg))?;
                match field("operator").map(|op| op.kind()) {
                    Some("*") => inner.strip_suffix('*').map(str::to_string),
                    _ => Some(format!("{inner}*")),
                }
            }
            "subscript_expression" => {
                let inner = field("argument").and_then(|arg| self.type_of(arg))?;
                inner.strip_suffix('*').map(str::to_string)
            }
            "update_expression" => field("argument").and_then(|arg| self.type_of(arg)),
            "conditional_expression" => field("consequence")
                .and_then(|branch| self.type_of(branch))
                .or_else(|| field("alternative").and_then(|branch| self.type_of(branch))),
            "assignment_expression" => field("left").and_then(|left| self.type_of(left)),
            "comma_expression" => field("right").and_then(|right| self.type_of(right)),
            "cast_expression" => field("type").map(|ty| node_text(ty, self.source).to_string()),
            _ => None,
        }
    }
}
