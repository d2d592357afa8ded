//! A small structural type model derived from annotations and expressions.

use super::{Checker, Decl, DeclKey, Meaning, SyntacticChecker, decl_of_node};
use crate::parser::syntax::{function_node, parameter_name, parameters};
use crate::parser::utils::{has_token, named_children, node_text, unwrap_expression, visit_descendants};
use crate::project::SourceFile;
use std::fmt;
use tracescope_api::SymbolKind;
use tree_sitter::Node;

/// Nesting bound for expression/declaration type inference.
const MAX_INFERENCE_DEPTH: u8 = 12;

#[derive(Debug, Clone)]
pub enum TsType<'a> {
    Primitive(&'a str),
    Literal(&'a str),
    /// Class, interface or enum instance type.
    Reference { decl: Decl<'a>, args: Vec<TsType<'a>> },
    Alias {
        decl: Decl<'a>,
        target: Box<TsType<'a>>,
        args: Vec<TsType<'a>>,
    },
    TypeParam(Decl<'a>),
    /// A single enum member used as a type or value.
    EnumLiteral(Decl<'a>),
    /// A name that resolved to nothing in the project (standard library).
    Named { name: &'a str, args: Vec<TsType<'a>> },
    Union(Vec<TsType<'a>>),
    Intersection(Vec<TsType<'a>>),
    Array(Box<TsType<'a>>),
    Tuple(Vec<TsType<'a>>),
    Function(Box<Signature<'a>>),
    /// Object type literal; members are looked up syntactically.
    Object { file: &'a SourceFile, node: Node<'a> },
    /// The value side of a class, enum or namespace (`typeof X`).
    TypeOf(Decl<'a>),
    Unknown,
}

#[derive(Debug, Clone)]
pub struct Signature<'a> {
    pub parameters: Vec<(&'a str, TsType<'a>)>,
    pub return_type: TsType<'a>,
}

impl<'a> TsType<'a> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, TsType::Unknown)
    }

    /// Function-shaped: a function type, an alias of one, or a union with a
    /// function member.
    pub fn is_function_like(&self) -> bool {
        match self {
            TsType::Function(_) => true,
            TsType::Alias { target, .. } => target.is_function_like(),
            TsType::Union(members) | TsType::Intersection(members) => {
                members.iter().any(TsType::is_function_like)
            }
            TsType::Named { name, .. } => *name == "Function",
            _ => false,
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[TsType<'_>], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[TsType<'_>]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    f.write_str("<")?;
    write_joined(f, args, ", ")?;
    f.write_str(">")
}

impl fmt::Display for TsType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TsType::Primitive(text) | TsType::Literal(text) => f.write_str(text),
            TsType::Reference { decl, args } | TsType::Alias { decl, args, .. } => {
                f.write_str(decl.name())?;
                write_args(f, args)
            }
            TsType::TypeParam(decl) => f.write_str(decl.name()),
            TsType::EnumLiteral(decl) => f.write_str(&decl.display_name()),
            TsType::Named { name, args } => {
                f.write_str(name)?;
                write_args(f, args)
            }
            TsType::Union(members) => write_joined(f, members, " | "),
            TsType::Intersection(members) => write_joined(f, members, " & "),
            TsType::Array(element) => match **element {
                TsType::Union(_) | TsType::Intersection(_) | TsType::Function(_) => {
                    write!(f, "({})[]", element)
                }
                _ => write!(f, "{}[]", element),
            },
            TsType::Tuple(elements) => {
                f.write_str("[")?;
                write_joined(f, elements, ", ")?;
                f.write_str("]")
            }
            TsType::Function(signature) => {
                f.write_str("(")?;
                for (i, (name, ty)) in signature.parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, ") => {}", signature.return_type)
            }
            TsType::Object { file, node } => f.write_str(node_text(*node, &file.text)),
            TsType::TypeOf(decl) => write!(f, "typeof {}", decl.name()),
            TsType::Unknown => f.write_str("unknown"),
        }
    }
}

impl<'a> SyntacticChecker<'a> {
    pub(super) fn annotation_type(
        &self,
        file: &'a SourceFile,
        node: Node<'a>,
        expanding: &mut Vec<DeclKey>,
    ) -> TsType<'a> {
        let text = node_text(node, &file.text);
        match node.kind() {
            "type_annotation" | "opting_type_annotation" | "omitting_type_annotation"
            | "parenthesized_type" | "readonly_type" | "optional_type" | "rest_type" => {
                match named_children(node).into_iter().next() {
                    Some(inner) => self.annotation_type(file, inner, expanding),
                    None => TsType::Unknown,
                }
            }
            "predefined_type" => TsType::Primitive(text),
            "literal_type" | "template_literal_type" => TsType::Literal(text),
            "type_identifier" | "nested_type_identifier" => {
                self.named_type(file, node, Vec::new(), expanding)
            }
            "generic_type" => {
                let args = node
                    .child_by_field_name("type_arguments")
                    .map(|a| {
                        named_children(a)
                            .into_iter()
                            .map(|t| self.annotation_type(file, t, expanding))
                            .collect()
                    })
                    .unwrap_or_default();
                match node.child_by_field_name("name") {
                    Some(name) => self.named_type(file, name, args, expanding),
                    None => TsType::Unknown,
                }
            }
            "union_type" => {
                let mut members = Vec::new();
                for child in named_children(node) {
                    match self.annotation_type(file, child, expanding) {
                        TsType::Union(inner) => members.extend(inner),
                        other => members.push(other),
                    }
                }
                TsType::Union(members)
            }
            "intersection_type" => {
                let mut members = Vec::new();
                for child in named_children(node) {
                    match self.annotation_type(file, child, expanding) {
                        TsType::Intersection(inner) => members.extend(inner),
                        other => members.push(other),
                    }
                }
                TsType::Intersection(members)
            }
            "array_type" => match named_children(node).into_iter().next() {
                Some(inner) => TsType::Array(Box::new(self.annotation_type(file, inner, expanding))),
                None => TsType::Unknown,
            },
            "tuple_type" => TsType::Tuple(
                named_children(node)
                    .into_iter()
                    .map(|element| {
                        // `[name: T]` labelled members carry the type last.
                        let target = if element.kind() == "tuple_parameter"
                            || element.kind() == "optional_tuple_parameter"
                        {
                            element.child_by_field_name("type").unwrap_or(element)
                        } else {
                            element
                        };
                        self.annotation_type(file, target, expanding)
                    })
                    .collect(),
            ),
            "function_type" | "constructor_type" => {
                TsType::Function(Box::new(self.signature_from_node(file, node, 0, expanding)))
            }
            "object_type" => TsType::Object { file, node },
            "type_query" => match named_children(node).into_iter().next() {
                Some(target) => self.expression_type(file, target, 0),
                None => TsType::Unknown,
            },
            "type_predicate" | "type_predicate_annotation" => TsType::Primitive("boolean"),
            "asserts" | "asserts_annotation" => TsType::Primitive("void"),
            _ => TsType::Unknown,
        }
    }

    /// A (possibly qualified) type name with arguments.
    fn named_type(
        &self,
        file: &'a SourceFile,
        name_node: Node<'a>,
        args: Vec<TsType<'a>>,
        expanding: &mut Vec<DeclKey>,
    ) -> TsType<'a> {
        let resolved = match name_node.kind() {
            "nested_type_identifier" => self.resolve_qualified(file, name_node),
            _ => self.resolve_name(file, name_node, node_text(name_node, &file.text), Meaning::Type),
        }
        .map(|s| self.resolve_symbol(s));
        let Some(symbol) = resolved else {
            return TsType::Named {
                name: node_text(name_node, &file.text),
                args,
            };
        };
        self.type_of_type_decl(*symbol.first(), args, expanding)
    }

    pub(super) fn type_of_type_decl(
        &self,
        decl: Decl<'a>,
        args: Vec<TsType<'a>>,
        expanding: &mut Vec<DeclKey>,
    ) -> TsType<'a> {
        match decl.kind {
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::Enum => {
                TsType::Reference { decl, args }
            }
            SymbolKind::TypeAlias => {
                let key = decl.key();
                if expanding.contains(&key) {
                    return TsType::Alias {
                        decl,
                        target: Box::new(TsType::Unknown),
                        args,
                    };
                }
                expanding.push(key);
                let target = decl
                    .node
                    .child_by_field_name("value")
                    .map(|v| self.annotation_type(decl.file, v, expanding))
                    .unwrap_or(TsType::Unknown);
                expanding.pop();
                TsType::Alias {
                    decl,
                    target: Box::new(target),
                    args,
                }
            }
            SymbolKind::TypeParameter => TsType::TypeParam(decl),
            SymbolKind::EnumMember => TsType::EnumLiteral(decl),
            SymbolKind::Namespace => TsType::TypeOf(decl),
            _ => TsType::Named {
                name: decl.name(),
                args,
            },
        }
    }

    /// Parameters and return type of a function-like node. Unannotated
    /// parameters take their default value's type; an unannotated return is
    /// inferred from `return` expressions.
    pub(super) fn signature_from_node(
        &self,
        file: &'a SourceFile,
        function: Node<'a>,
        depth: u8,
        expanding: &mut Vec<DeclKey>,
    ) -> Signature<'a> {
        let parameters = parameters(function)
            .into_iter()
            .map(|param| {
                let name = parameter_name(param, &file.text);
                let ty = match param.child_by_field_name("type") {
                    Some(annotation) => self.annotation_type(file, annotation, expanding),
                    None => match param.child_by_field_name("value") {
                        Some(default) => self.expression_type(file, default, depth + 1),
                        None => TsType::Unknown,
                    },
                };
                (name, ty)
            })
            .collect();
        let return_type = match function.child_by_field_name("return_type") {
            Some(annotation) => self.annotation_type(file, annotation, expanding),
            None => self.inferred_return_type(file, function, depth + 1),
        };
        Signature {
            parameters,
            return_type,
        }
    }

    pub fn inferred_return_type(&self, file: &'a SourceFile, function: Node<'a>, depth: u8) -> TsType<'a> {
        if depth > MAX_INFERENCE_DEPTH {
            return TsType::Unknown;
        }
        let Some(body) = function.child_by_field_name("body") else {
            return TsType::Unknown;
        };
        let inner = if body.kind() == "statement_block" {
            let mut returned = Vec::new();
            visit_descendants(body, |n| {
                if n.kind() == "return_statement" && owning_function(n) == Some(function) {
                    if let Some(expr) = named_children(n).into_iter().next() {
                        returned.push(expr);
                    }
                }
            });
            let mut types: Vec<TsType<'a>> = returned
                .into_iter()
                .map(|expr| self.expression_type(file, expr, depth + 1))
                .filter(|t| !t.is_unknown())
                .collect();
            match types.len() {
                0 => TsType::Unknown,
                1 => types.remove(0),
                _ => TsType::Union(types),
            }
        } else {
            self.expression_type(file, body, depth + 1)
        };
        if has_token(function, "async") && !inner.is_unknown() {
            return TsType::Named {
                name: "Promise",
                args: vec![inner],
            };
        }
        inner
    }

    pub(super) fn declaration_type(&self, decl: &Decl<'a>, depth: u8) -> TsType<'a> {
        if depth > MAX_INFERENCE_DEPTH {
            return TsType::Unknown;
        }
        let file = decl.file;
        let mut expanding = Vec::new();
        match decl.kind {
            SymbolKind::Class | SymbolKind::Enum | SymbolKind::Namespace => TsType::TypeOf(*decl),
            SymbolKind::Interface | SymbolKind::TypeAlias | SymbolKind::TypeParameter => TsType::Unknown,
            SymbolKind::EnumMember => TsType::EnumLiteral(*decl),
            SymbolKind::Import => {
                if decl.is_alias() {
                    match self.resolve_alias_chain(super::Symbol::single(*decl)) {
                        Some(symbol) if !symbol.first().is_alias() => {
                            self.declaration_type(symbol.first(), depth + 1)
                        }
                        _ => TsType::Unknown,
                    }
                } else {
                    // Namespace imports behave like namespaces.
                    TsType::TypeOf(*decl)
                }
            }
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Constructor => {
                let function = function_node(decl.node).unwrap_or(decl.node);
                TsType::Function(Box::new(self.signature_from_node(file, function, depth, &mut expanding)))
            }
            SymbolKind::Accessor => {
                let signature = self.signature_from_node(file, decl.node, depth, &mut expanding);
                if has_token(decl.node, "set") {
                    signature
                        .parameters
                        .into_iter()
                        .next()
                        .map(|(_, t)| t)
                        .unwrap_or(TsType::Unknown)
                } else {
                    signature.return_type
                }
            }
            SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Property => {
                if decl.node.kind() == "for_in_statement" {
                    return self.contextual_parameter_type(decl, depth);
                }
                // Destructured bindings have no single annotation.
                let whole_binding = decl
                    .node
                    .child_by_field_name("name")
                    .or_else(|| decl.node.child_by_field_name("pattern"))
                    .map(|n| n == decl.name_node)
                    .unwrap_or(decl.node == decl.name_node);
                if !whole_binding {
                    return TsType::Unknown;
                }
                if let Some(annotation) = decl.node.child_by_field_name("type") {
                    return self.annotation_type(file, annotation, &mut expanding);
                }
                if let Some(function) = function_node(decl.node) {
                    return TsType::Function(Box::new(
                        self.signature_from_node(file, function, depth, &mut expanding),
                    ));
                }
                match decl.node.child_by_field_name("value") {
                    Some(value) => self.expression_type(file, value, depth + 1),
                    None => TsType::Unknown,
                }
            }
        }
    }

    /// A `for (const x of xs)` binding gets the element type of `xs`.
    fn contextual_parameter_type(&self, decl: &Decl<'a>, depth: u8) -> TsType<'a> {
        let is_of_loop = crate::parser::utils::children(decl.node)
            .iter()
            .any(|c| !c.is_named() && c.kind() == "of");
        if !is_of_loop || decl.node.child_by_field_name("left") != Some(decl.name_node) {
            return TsType::Unknown;
        }
        let Some(right) = decl.node.child_by_field_name("right") else {
            return TsType::Unknown;
        };
        match self.expression_type(decl.file, right, depth + 1) {
            TsType::Array(element) => *element,
            TsType::Named { name: "Array" | "ReadonlyArray", mut args } if !args.is_empty() => args.remove(0),
            _ => TsType::Unknown,
        }
    }

    /// Best-effort static type of an expression.
    pub fn expression_type(&self, file: &'a SourceFile, expr: Node<'a>, depth: u8) -> TsType<'a> {
        if depth > MAX_INFERENCE_DEPTH {
            return TsType::Unknown;
        }
        let mut expanding = Vec::new();
        match expr.kind() {
            "parenthesized_expression" | "non_null_expression" | "satisfies_expression" => {
                self.expression_type(file, unwrap_expression(expr), depth + 1)
            }
            "as_expression" => {
                let annotation = named_children(expr)
                    .into_iter()
                    .filter(|c| c.kind() != "comment")
                    .nth(1);
                match annotation {
                    Some(annotation) => self.annotation_type(file, annotation, &mut expanding),
                    None => self.expression_type(file, unwrap_expression(expr), depth + 1),
                }
            }
            "type_assertion" => {
                let annotation = named_children(expr)
                    .into_iter()
                    .find(|c| c.kind() == "type_arguments")
                    .and_then(|args| named_children(args).into_iter().next());
                match annotation {
                    Some(annotation) => self.annotation_type(file, annotation, &mut expanding),
                    None => self.expression_type(file, unwrap_expression(expr), depth + 1),
                }
            }
            "identifier" => match self.resolve_at(file, expr) {
                Some(symbol) => self.declaration_type(symbol.first(), depth + 1),
                None => TsType::Unknown,
            },
            "this" => match self.enclosing_class(file, expr) {
                Some(class) => TsType::Reference {
                    decl: class,
                    args: Vec::new(),
                },
                None => TsType::Unknown,
            },
            "new_expression" => {
                let Some(constructor) = expr.child_by_field_name("constructor") else {
                    return TsType::Unknown;
                };
                let args = expr
                    .child_by_field_name("type_arguments")
                    .map(|a| {
                        named_children(a)
                            .into_iter()
                            .map(|t| self.annotation_type(file, t, &mut expanding))
                            .collect()
                    })
                    .unwrap_or_default();
                match self.expression_type(file, constructor, depth + 1) {
                    TsType::TypeOf(decl) if decl.kind == SymbolKind::Class => TsType::Reference { decl, args },
                    _ => TsType::Unknown,
                }
            }
            "call_expression" => {
                let Some(function) = expr.child_by_field_name("function") else {
                    return TsType::Unknown;
                };
                let callee = self.expression_type(file, function, depth + 1);
                self.signatures_of(&callee, depth + 1)
                    .into_iter()
                    .next()
                    .map(|s| s.return_type)
                    .unwrap_or(TsType::Unknown)
            }
            "member_expression" => match self.resolve_member_expression(file, expr) {
                Some(symbol) => {
                    let symbol = self.resolve_symbol(symbol);
                    self.declaration_type(symbol.first(), depth + 1)
                }
                None => TsType::Unknown,
            },
            "subscript_expression" => {
                let Some(object) = expr.child_by_field_name("object") else {
                    return TsType::Unknown;
                };
                match self.expression_type(file, object, depth + 1) {
                    TsType::Array(element) => *element,
                    _ => TsType::Unknown,
                }
            }
            "await_expression" => {
                let Some(inner) = named_children(expr).into_iter().next() else {
                    return TsType::Unknown;
                };
                match self.expression_type(file, inner, depth + 1) {
                    TsType::Named { name: "Promise", mut args } if !args.is_empty() => args.remove(0),
                    other => other,
                }
            }
            "ternary_expression" => {
                let branches: Vec<TsType<'a>> = ["consequence", "alternative"]
                    .iter()
                    .filter_map(|f| expr.child_by_field_name(f))
                    .map(|b| self.expression_type(file, b, depth + 1))
                    .filter(|t| !t.is_unknown())
                    .collect();
                match branches.len() {
                    0 => TsType::Unknown,
                    1 => branches.into_iter().next().unwrap_or(TsType::Unknown),
                    _ => TsType::Union(branches),
                }
            }
            "binary_expression" => {
                let op = expr
                    .child_by_field_name("operator")
                    .map(|o| node_text(o, &file.text))
                    .unwrap_or("");
                match op {
                    "??" | "||" => match expr.child_by_field_name("left") {
                        Some(left) => self.expression_type(file, left, depth + 1),
                        None => TsType::Unknown,
                    },
                    "===" | "!==" | "==" | "!=" | "<" | ">" | "<=" | ">=" | "instanceof" | "in" => {
                        TsType::Primitive("boolean")
                    }
                    _ => TsType::Unknown,
                }
            }
            "array" => {
                let first = named_children(expr).into_iter().find(|c| c.kind() != "comment");
                match first {
                    Some(element) => TsType::Array(Box::new(self.expression_type(file, element, depth + 1))),
                    None => TsType::Array(Box::new(TsType::Unknown)),
                }
            }
            "string" | "template_string" => TsType::Primitive("string"),
            "number" => TsType::Primitive("number"),
            "true" | "false" => TsType::Primitive("boolean"),
            "null" => TsType::Primitive("null"),
            "undefined" => TsType::Primitive("undefined"),
            "arrow_function" | "function_expression" | "function" | "generator_function" => {
                TsType::Function(Box::new(self.signature_from_node(file, expr, depth, &mut expanding)))
            }
            "class" => match decl_of_node(file, expr) {
                Some(decl) => TsType::TypeOf(decl),
                None => TsType::Unknown,
            },
            _ => TsType::Unknown,
        }
    }

    pub(super) fn signatures_of(&self, ty: &TsType<'a>, depth: u8) -> Vec<Signature<'a>> {
        if depth > MAX_INFERENCE_DEPTH {
            return Vec::new();
        }
        match ty {
            TsType::Function(signature) => vec![(**signature).clone()],
            TsType::Alias { target, .. } => self.signatures_of(target, depth + 1),
            TsType::Union(members) | TsType::Intersection(members) => members
                .iter()
                .flat_map(|m| self.signatures_of(m, depth + 1))
                .collect(),
            TsType::Reference { decl, .. } if decl.kind == SymbolKind::Interface => {
                self.call_members(decl.file, decl.node, depth)
            }
            TsType::Object { file, node } => self.call_members(file, *node, depth),
            _ => Vec::new(),
        }
    }

    /// `(x: T): R` call signature members of an interface or object type.
    fn call_members(&self, file: &'a SourceFile, holder: Node<'a>, depth: u8) -> Vec<Signature<'a>> {
        let body = crate::parser::syntax::type_body(holder).unwrap_or(holder);
        let mut expanding = Vec::new();
        named_children(body)
            .into_iter()
            .filter(|m| m.kind() == "call_signature")
            .map(|m| self.signature_from_node(file, m, depth, &mut expanding))
            .collect()
    }
}

/// The innermost function-like node containing `node`.
pub fn owning_function(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.parent();
    while let Some(n) = current {
        if crate::parser::syntax::is_function_like(n.kind()) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}
