//! Closed mapping from tree-sitter node kinds to declaration shapes.
//!
//! Every pattern analyzer and resolver goes through these helpers instead of
//! matching raw node kinds, so an unknown shape is simply "not a declaration".

use super::utils::{children, has_token, named_children, node_text};
use std::collections::HashSet;
use tracescope_api::SymbolKind;
use tree_sitter::Node;

pub const FUNCTION_EXPRESSION_KINDS: &[&str] = &[
    "function_expression",
    "function",
    "generator_function",
    "arrow_function",
];

pub fn is_function_expression(kind: &str) -> bool {
    FUNCTION_EXPRESSION_KINDS.contains(&kind)
}

/// Node kinds that own a parameter list and (usually) a body.
pub fn is_function_like(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "generator_function_declaration"
            | "function_signature"
            | "method_definition"
            | "method_signature"
            | "abstract_method_signature"
    ) || is_function_expression(kind)
}

/// Declaration kind of a declaration node, if it is one.
pub fn declaration_kind(node: Node<'_>, source: &str) -> Option<SymbolKind> {
    let kind = match node.kind() {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            SymbolKind::Function
        }
        "class_declaration" | "abstract_class_declaration" | "class" => SymbolKind::Class,
        "interface_declaration" => SymbolKind::Interface,
        "type_alias_declaration" => SymbolKind::TypeAlias,
        "enum_declaration" => SymbolKind::Enum,
        "enum_assignment" => SymbolKind::EnumMember,
        "property_identifier" | "string"
            if node.parent().map(|p| p.kind()) == Some("enum_body") =>
        {
            SymbolKind::EnumMember
        }
        "variable_declarator" => SymbolKind::Variable,
        "required_parameter" | "optional_parameter" => {
            if is_parameter_property(node) {
                SymbolKind::Property
            } else {
                SymbolKind::Parameter
            }
        }
        "import_specifier" | "namespace_import" | "import_require_clause" => SymbolKind::Import,
        "identifier" if node.parent().map(|p| p.kind()) == Some("import_clause") => {
            SymbolKind::Import
        }
        "method_definition" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(n, source))
                .unwrap_or("");
            if name == "constructor" {
                SymbolKind::Constructor
            } else if has_token(node, "get") || has_token(node, "set") {
                SymbolKind::Accessor
            } else {
                SymbolKind::Method
            }
        }
        "method_signature" | "abstract_method_signature" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(n, source))
                .unwrap_or("");
            if name == "constructor" {
                SymbolKind::Constructor
            } else {
                SymbolKind::Method
            }
        }
        "public_field_definition" | "property_signature" => SymbolKind::Property,
        "internal_module" | "module" => SymbolKind::Namespace,
        "type_parameter" => SymbolKind::TypeParameter,
        _ => return None,
    };
    Some(kind)
}

/// The identifier node naming a declaration node.
pub fn declaration_name(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "property_identifier" | "string" | "identifier" => Some(node),
        "import_specifier" => node
            .child_by_field_name("alias")
            .or_else(|| node.child_by_field_name("name")),
        "namespace_import" | "import_require_clause" => named_children(node)
            .into_iter()
            .find(|c| c.kind() == "identifier"),
        "required_parameter" | "optional_parameter" => node
            .child_by_field_name("pattern")
            .filter(|p| matches!(p.kind(), "identifier" | "this")),
        "variable_declarator" => node
            .child_by_field_name("name")
            .filter(|n| n.kind() == "identifier"),
        "class" => node.child_by_field_name("name"),
        _ => node.child_by_field_name("name"),
    }
}

/// `constructor(private readonly repo: Repo)` style parameter properties.
pub fn is_parameter_property(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let has_modifier = node.children(&mut cursor).any(|c| {
        c.kind() == "accessibility_modifier"
            || c.kind() == "override_modifier"
            || (!c.is_named() && c.kind() == "readonly")
    });
    has_modifier
}

/// Identifier nodes bound by a binding pattern (identifier, object or array
/// destructuring, defaults, rest elements).
pub fn binding_names(pattern: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    collect_binding_names(pattern, &mut out);
    out
}

fn collect_binding_names<'a>(node: Node<'a>, out: &mut Vec<Node<'a>>) {
    match node.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => out.push(node),
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            for child in named_children(node) {
                collect_binding_names(child, out);
            }
        }
        "pair_pattern" => {
            if let Some(value) = node.child_by_field_name("value") {
                collect_binding_names(value, out);
            }
        }
        "assignment_pattern" | "object_assignment_pattern" => {
            if let Some(left) = node.child_by_field_name("left") {
                collect_binding_names(left, out);
            }
        }
        _ => {}
    }
}

/// Unwraps `export` / `declare` wrappers around a statement.
pub fn unwrap_statement(stmt: Node<'_>) -> Option<Node<'_>> {
    match stmt.kind() {
        "export_statement" => stmt
            .child_by_field_name("declaration")
            .and_then(unwrap_statement),
        "ambient_declaration" => named_children(stmt)
            .into_iter()
            .find(|c| c.kind() != "comment")
            .and_then(unwrap_statement),
        "expression_statement" => named_children(stmt)
            .into_iter()
            .find(|c| matches!(c.kind(), "internal_module" | "module"))
            .or(Some(stmt)),
        _ => Some(stmt),
    }
}

/// Declarations introduced by one statement, as (declaration, name) pairs.
pub fn statement_declarations(stmt: Node<'_>) -> Vec<(Node<'_>, Node<'_>)> {
    let mut out = Vec::new();
    let Some(inner) = unwrap_statement(stmt) else {
        return out;
    };
    match inner.kind() {
        "function_declaration"
        | "generator_function_declaration"
        | "function_signature"
        | "class_declaration"
        | "abstract_class_declaration"
        | "interface_declaration"
        | "type_alias_declaration"
        | "enum_declaration"
        | "internal_module"
        | "module" => {
            if let Some(name) = declaration_name(inner) {
                out.push((inner, name));
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            for declarator in named_children(inner) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name) = declarator.child_by_field_name("name") {
                    for binding in binding_names(name) {
                        out.push((declarator, binding));
                    }
                }
            }
        }
        _ => {}
    }
    out
}

/// Every declaration directly contained in a statement list (program,
/// statement block or namespace body).
pub fn block_declarations(block: Node<'_>) -> Vec<(Node<'_>, Node<'_>)> {
    named_children(block)
        .into_iter()
        .flat_map(statement_declarations)
        .collect()
}

/// The body node of a class or interface declaration.
pub fn type_body(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("body")
        .or_else(|| {
            named_children(node)
                .into_iter()
                .find(|c| matches!(c.kind(), "class_body" | "interface_body" | "object_type"))
        })
}

/// Members of a class, interface or enum, as (declaration, name) pairs.
/// Constructor parameter properties are reported as class members.
pub fn type_members(node: Node<'_>) -> Vec<(Node<'_>, Node<'_>)> {
    let mut out = Vec::new();
    let Some(body) = type_body(node) else {
        return out;
    };
    for member in named_children(body) {
        match member.kind() {
            "method_definition"
            | "method_signature"
            | "abstract_method_signature"
            | "public_field_definition"
            | "property_signature" => {
                if let Some(name) = member.child_by_field_name("name") {
                    out.push((member, name));
                }
                if member.kind() == "method_definition" {
                    collect_parameter_properties(member, &mut out);
                }
            }
            "property_identifier" | "string" if body.kind() == "enum_body" => {
                out.push((member, member));
            }
            "enum_assignment" => {
                if let Some(name) = member.child_by_field_name("name") {
                    out.push((member, name));
                }
            }
            _ => {}
        }
    }
    out
}

fn collect_parameter_properties<'a>(method: Node<'a>, out: &mut Vec<(Node<'a>, Node<'a>)>) {
    let Some(params) = method.child_by_field_name("parameters") else {
        return;
    };
    for param in named_children(params) {
        if is_parameter_property(param) {
            if let Some(name) = declaration_name(param) {
                out.push((param, name));
            }
        }
    }
}

/// Parameters of a function-like node, as (parameter, binding name) pairs.
/// Destructured parameters produce one pair per bound identifier.
pub fn parameters(function: Node<'_>) -> Vec<Node<'_>> {
    if let Some(params) = function.child_by_field_name("parameters") {
        return named_children(params)
            .into_iter()
            .filter(|p| matches!(p.kind(), "required_parameter" | "optional_parameter"))
            .collect();
    }
    // `x => x + 1`
    function
        .child_by_field_name("parameter")
        .into_iter()
        .collect()
}

/// Display name of a parameter node (destructured patterns render as text).
pub fn parameter_name<'a>(param: Node<'_>, source: &'a str) -> &'a str {
    if param.kind() == "identifier" {
        return node_text(param, source);
    }
    param
        .child_by_field_name("pattern")
        .map(|p| node_text(p, source))
        .unwrap_or_else(|| node_text(param, source))
}

/// Function node carrying the parameters/body of a callable declaration.
pub fn function_node(decl: Node<'_>) -> Option<Node<'_>> {
    if is_function_like(decl.kind()) {
        return Some(decl);
    }
    match decl.kind() {
        "variable_declarator" | "public_field_definition" | "pair" | "assignment_expression" => {
            let value = decl
                .child_by_field_name("value")
                .or_else(|| decl.child_by_field_name("right"))?;
            let value = super::utils::unwrap_expression(value);
            is_function_expression(value.kind()).then_some(value)
        }
        _ => None,
    }
}

/// Nearest named callable enclosing `node`, as (declaration, name).
///
/// Anonymous function expressions (callbacks) are transparent: a call inside
/// `items.map(x => save(x))` belongs to the function containing the `map`.
pub fn enclosing_callable(node: Node<'_>) -> Option<(Node<'_>, Node<'_>)> {
    let mut current = node.parent();
    while let Some(n) = current {
        if matches!(
            n.kind(),
            "function_declaration" | "generator_function_declaration" | "method_definition"
        ) {
            if let Some(name) = n.child_by_field_name("name") {
                return Some((n, name));
            }
        } else if is_function_expression(n.kind()) {
            if let Some(owner) = function_owner(n) {
                return Some(owner);
            }
        }
        current = n.parent();
    }
    None
}

/// The named declaration a function expression is bound to, if any.
pub fn function_owner(function: Node<'_>) -> Option<(Node<'_>, Node<'_>)> {
    let holder = super::utils::outermost_wrapper(function);
    let parent = holder.parent()?;
    match parent.kind() {
        "variable_declarator" => {
            let name = parent.child_by_field_name("name")?;
            (name.kind() == "identifier").then_some((parent, name))
        }
        "public_field_definition" | "pair" => {
            let name = parent
                .child_by_field_name("name")
                .or_else(|| parent.child_by_field_name("key"))?;
            Some((parent, name))
        }
        _ => {
            if let Some(name) = function.child_by_field_name("name") {
                return Some((function, name));
            }
            None
        }
    }
}

/// Names exported through `export { a, b as c }` clauses (without a
/// `from` source) and `export default a` in this file.
pub fn local_export_names(root: Node<'_>, source: &str) -> HashSet<String> {
    let mut names = HashSet::new();
    for stmt in named_children(root) {
        if stmt.kind() != "export_statement" || stmt.child_by_field_name("source").is_some() {
            continue;
        }
        for child in named_children(stmt) {
            if child.kind() == "export_clause" {
                for spec in named_children(child) {
                    if spec.kind() == "export_specifier" {
                        if let Some(name) = spec.child_by_field_name("name") {
                            names.insert(node_text(name, source).to_string());
                        }
                    }
                }
            }
        }
        if has_token(stmt, "default") {
            if let Some(value) = stmt.child_by_field_name("value") {
                if value.kind() == "identifier" {
                    names.insert(node_text(value, source).to_string());
                }
            }
        }
    }
    names
}

/// True when the declaration node sits directly under an `export` statement
/// (through `declare` and declaration-list wrappers).
pub fn has_export_modifier(decl: Node<'_>) -> bool {
    let mut current = decl.parent();
    while let Some(n) = current {
        match n.kind() {
            "export_statement" => return true,
            "lexical_declaration" | "variable_declaration" | "ambient_declaration" => {
                current = n.parent();
            }
            _ => return false,
        }
    }
    false
}

/// Modifier keywords present on a declaration.
pub fn modifiers(decl: Node<'_>, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut holders = vec![decl];
    let mut parent = decl.parent();
    while let Some(p) = parent {
        match p.kind() {
            "export_statement" | "ambient_declaration" | "lexical_declaration"
            | "variable_declaration" => {
                holders.push(p);
                parent = p.parent();
            }
            _ => break,
        }
    }
    for holder in holders {
        for child in children(holder) {
            let text = match child.kind() {
                "accessibility_modifier" | "override_modifier" => node_text(child, source),
                "export" | "default" | "declare" | "abstract" | "static" | "async" | "readonly"
                | "const" | "get" | "set" | "let" | "var"
                    if !child.is_named() =>
                {
                    child.kind()
                }
                _ => continue,
            };
            if !out.iter().any(|m| m == text) {
                out.push(text.to_string());
            }
        }
    }
    if decl.kind() == "abstract_class_declaration" && !out.iter().any(|m| m == "abstract") {
        out.push("abstract".to_string());
    }
    out
}

/// Abstract classes and abstract members.
pub fn is_abstract(decl: Node<'_>) -> bool {
    decl.kind() == "abstract_class_declaration"
        || decl.kind() == "abstract_method_signature"
        || has_token(decl, "abstract")
}

/// The `module`/`internal_module` body of a namespace declaration.
pub fn namespace_body(decl: Node<'_>) -> Option<Node<'_>> {
    decl.child_by_field_name("body")
}
