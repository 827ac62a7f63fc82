// Declaration tables and lexical scopes for C++ type resolution
// Approximate: no overloads, templates or namespaces.

use std::collections::HashMap;

use tree_sitter::Node;

/// What a declarator declares once pointers and references are peeled off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator<'s> {
    pub name: &'s str,
    /// One per pointer or array level
    pub pointers: usize,
    /// Whether a function declarator was crossed on the way down
    pub function: bool,
}

impl Declarator<'_> {
    /// Full declared type for base type `base`
    pub fn type_from(&self, base: &str) -> String {
        let mut ty = base.to_string();
        ty.extend(std::iter::repeat('*').take(self.pointers));
        ty
    }
}

/// Text of `node` within `source`
pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Peel a declarator down to the declared name
pub fn unwrap_declarator<'s>(node: Node<'_>, source: &'s str) -> Option<Declarator<'s>> {
    let mut current = node;
    let mut pointers = 0;
    let mut function = false;

    loop {
        match current.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "operator_name"
            | "destructor_name" | "qualified_identifier" => {
                return Some(Declarator {
                    name: node_text(current, source),
                    pointers,
                    function,
                });
            }
            "pointer_declarator" | "array_declarator" => {
                pointers += 1;
                current = current.child_by_field_name("declarator")?;
            }
            "function_declarator" => {
                function = true;
                current = current.child_by_field_name("declarator")?;
            }
            "init_declarator" => {
                current = current.child_by_field_name("declarator")?;
            }
            "reference_declarator" | "parenthesized_declarator" => {
                let mut cursor = current.walk();
                let inner = current.named_children(&mut cursor).next()?;
                current = inner;
            }
            _ => return None,
        }
    }
}

/// First `function_declarator` along a declarator chain
pub fn find_function_declarator(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    loop {
        match current.kind() {
            "function_declarator" => return Some(current),
            "pointer_declarator" | "init_declarator" => {
                current = current.child_by_field_name("declarator")?;
            }
            "reference_declarator" | "parenthesized_declarator" => {
                let mut cursor = current.walk();
                let inner = current.named_children(&mut cursor).next()?;
                current = inner;
            }
            _ => return None,
        }
    }
}

/// Type information gathered ahead of lowering plus the live scope stack
#[derive(Debug, Default)]
pub struct TypeEnv {
    /// `scopes[0]` holds file-level declarations
    scopes: Vec<HashMap<String, String>>,
    records: HashMap<String, HashMap<String, String>>,
    functions: HashMap<String, String>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            ..Default::default()
        }
    }

    /// Collect record fields and function return types from the whole file
    pub fn collect(root: Node<'_>, source: &str) -> Self {
        let mut env = Self::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            match node.kind() {
                "struct_specifier" | "class_specifier" | "union_specifier" => {
                    env.collect_record(node, source);
                }
                "function_definition" | "declaration" | "field_declaration" => {
                    env.collect_function(node, source);
                }
                _ => {}
            }

            let mut cursor = node.walk();
            stack.extend(node.named_children(&mut cursor));
        }

        env
    }

    fn collect_record(&mut self, node: Node<'_>, source: &str) {
        let (Some(name), Some(body)) = (
            node.child_by_field_name("name"),
            node.child_by_field_name("body"),
        ) else {
            return;
        };

        let mut fields = HashMap::new();
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() != "field_declaration" {
                continue;
            }
            let Some(base) = member.child_by_field_name("type") else {
                continue;
            };
            let base = node_text(base, source);
            let mut decl_cursor = member.walk();
            for declarator in member.children_by_field_name("declarator", &mut decl_cursor) {
                if let Some(decl) = unwrap_declarator(declarator, source) {
                    if !decl.function {
                        fields.insert(decl.name.to_string(), decl.type_from(base));
                    }
                }
            }
        }

        self.records
            .entry(node_text(name, source).to_string())
            .or_default()
            .extend(fields);
    }

    fn collect_function(&mut self, node: Node<'_>, source: &str) {
        let Some(base) = node.child_by_field_name("type") else {
            return;
        };
        let base = node_text(base, source);

        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            if let Some(decl) = unwrap_declarator(declarator, source) {
                if decl.function {
                    self.functions
                        .insert(decl.name.to_string(), decl.type_from(base));
                }
            }
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        // the file scope is never popped
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn bind(&mut self, name: &str, ty: String) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    /// Resolve a variable: block scopes, then fields of `record`, then file scope
    pub fn lookup(&self, name: &str, record: Option<&str>) -> Option<&str> {
        let local = self.scopes[1..]
            .iter()
            .rev()
            .find_map(|scope| scope.get(name));
        if let Some(ty) = local {
            return Some(ty);
        }

        record
            .and_then(|record| self.field_type(record, name))
            .or_else(|| self.scopes[0].get(name).map(String::as_str))
    }

    pub fn field_type(&self, record: &str, field: &str) -> Option<&str> {
        self.records
            .get(record)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    pub fn return_type(&self, function: &str) -> Option<&str> {
        self.functions.get(function).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_prefers_innermost_scope() {
        let mut env = TypeEnv::new();
        env.bind("x", "int".to_string());
        env.push_scope();
        env.bind("x", "complex".to_string());
        assert_eq!(env.lookup("x", None), Some("complex"));
        env.pop_scope();
        assert_eq!(env.lookup("x", None), Some("int"));

        // the file scope survives extra pops
        env.pop_scope();
        assert_eq!(env.lookup("x", None), Some("int"));
    }

    #[test]
    fn test_declarator_type_counts_pointers() {
        let decl = Declarator {
            name: "p",
            pointers: 2,
            function: false,
        };
        assert_eq!(decl.type_from("complex"), "complex**");
    }
}
