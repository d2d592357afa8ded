use tree_sitter::Node;

/// Source text covered by `node`.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

/// 1-indexed start line of `node`.
pub fn line_of(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// 1-indexed end line of `node`.
pub fn end_line_of(node: Node<'_>) -> u32 {
    node.end_position().row as u32 + 1
}

pub fn named_children<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

pub fn children<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// True if `node` has an anonymous child token with exactly this kind
/// (`abstract`, `static`, `async`, `const`, `get`, ...).
pub fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

/// Strips wrappers that do not change which value an expression denotes:
/// parentheses, `as`, `satisfies`, `!` and `<T>` assertions.
pub fn unwrap_expression(mut node: Node<'_>) -> Node<'_> {
    loop {
        let inner = match node.kind() {
            "parenthesized_expression" | "as_expression" | "satisfies_expression"
            | "non_null_expression" | "type_assertion" => first_expression_child(node),
            _ => None,
        };
        match inner {
            Some(n) => node = n,
            None => return node,
        }
    }
}

fn first_expression_child(node: Node<'_>) -> Option<Node<'_>> {
    if let Some(expr) = node.child_by_field_name("expression") {
        return Some(expr);
    }
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "type_arguments" && c.kind() != "comment");
    found
}

/// Walks up from `node` while the parent is a transparent expression wrapper.
pub fn outermost_wrapper(mut node: Node<'_>) -> Node<'_> {
    while let Some(parent) = node.parent() {
        match parent.kind() {
            "parenthesized_expression" | "as_expression" | "satisfies_expression"
            | "non_null_expression" | "type_assertion" => node = parent,
            _ => break,
        }
    }
    node
}

/// Nearest ancestor (excluding `node`) satisfying `pred`.
pub fn find_ancestor<'a>(node: Node<'a>, pred: impl Fn(&Node<'a>) -> bool) -> Option<Node<'a>> {
    let mut current = node.parent();
    while let Some(n) = current {
        if pred(&n) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Pre-order visit of every node under `root` (including `root`).
pub fn visit_descendants<'a>(root: Node<'a>, mut f: impl FnMut(Node<'a>)) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        f(node);
        let mut cursor = node.walk();
        let kids: Vec<Node<'a>> = node.children(&mut cursor).collect();
        for child in kids.into_iter().rev() {
            stack.push(child);
        }
    }
}

/// Strips the surrounding quotes of a string literal node's text.
pub fn string_literal_value(node: Node<'_>, source: &str) -> String {
    let text = node_text(node, source);
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

/// True for the identifier-like token kinds that can name a symbol.
pub fn is_identifier_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "type_identifier"
            | "property_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern"
            | "private_property_identifier"
    )
}
