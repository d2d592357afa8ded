//! User-defined types flowing through a callable's parameters and return.

use super::AnalysisContext;
use crate::checker::{Checker, Decl, DeclKey, TsType, decl_of_node};
use crate::parser::syntax::{function_node, parameter_name, parameters, type_members};
use crate::parser::utils::{named_children, node_text, visit_descendants};
use std::collections::{BTreeMap, HashSet};
use tracescope_api::{SymbolKind, SymbolRef, TypeFlow, TypeFlowEntry};
use tree_sitter::Node;

/// Primitives and standard-library generics never reported as user types.
const EXCLUDED_TYPES: &[&str] = &[
    "string", "number", "boolean", "bigint", "symbol", "object", "any", "unknown", "never",
    "void", "undefined", "null", "Array", "ReadonlyArray", "Promise", "PromiseLike", "Record",
    "Partial", "Required", "Readonly", "Pick", "Omit", "Exclude", "Extract", "NonNullable",
    "ReturnType", "Parameters", "InstanceType", "Awaited", "Map", "Set", "WeakMap", "WeakSet",
    "ReadonlyMap", "ReadonlySet", "Iterable", "Iterator", "IterableIterator", "AsyncIterable",
    "AsyncIterator", "Generator", "AsyncGenerator", "Date", "RegExp", "Error", "Function",
    "Object", "String", "Number", "Boolean", "Symbol", "BigInt", "JSON", "Math",
];

pub struct TypeFlowResolver<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
}

/// Deduplicating collector keyed by (file, line).
#[derive(Default)]
struct Collected {
    refs: BTreeMap<(String, u32), SymbolRef>,
}

impl Collected {
    fn into_sorted(self) -> Vec<SymbolRef> {
        self.refs.into_values().collect()
    }
}

impl<'c, 'a> TypeFlowResolver<'c, 'a> {
    pub fn new(ctx: &'c AnalysisContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn type_flow(&self, decl: &Decl<'a>) -> TypeFlow {
        let checker = &self.ctx.checker;
        let callable = callable_decl(decl);
        let function = callable.as_ref().and_then(|c| function_node(c.node));
        let signature = callable
            .as_ref()
            .and_then(|c| checker.call_signatures(&checker.type_of_declaration(c)).into_iter().next());

        let mut parameter_entries = Vec::new();
        let mut return_entry = None;
        if let (Some(callable), Some(function)) = (callable, function) {
            let file = callable.file;
            for (position, param) in parameters(function).into_iter().enumerate() {
                let ty = signature
                    .as_ref()
                    .and_then(|s| s.parameters.get(position))
                    .map(|(_, t)| t.clone())
                    .unwrap_or(TsType::Unknown);
                let annotation = param.child_by_field_name("type");
                parameter_entries.push(self.entry(
                    parameter_name(param, &file.text).to_string(),
                    annotation,
                    &ty,
                    &callable,
                ));
            }
            let is_constructor = callable.kind == SymbolKind::Constructor;
            if !is_constructor {
                let ty = signature.map(|s| s.return_type).unwrap_or(TsType::Unknown);
                let annotation = function.child_by_field_name("return_type");
                if annotation.is_some() || !ty.is_unknown() {
                    return_entry = Some(self.entry("return".to_string(), annotation, &ty, &callable));
                }
            }
        }

        let mut all = Collected::default();
        for entry in parameter_entries.iter().chain(return_entry.iter()) {
            for r in &entry.resolved_types {
                all.refs
                    .entry((r.file_path.clone(), r.line))
                    .or_insert_with(|| r.clone());
            }
        }
        TypeFlow {
            symbol: self.ctx.symbol_ref(decl),
            parameters: parameter_entries,
            return_type: return_entry,
            referenced_types: all.into_sorted(),
        }
    }

    fn entry(&self, name: String, annotation: Option<Node<'a>>, ty: &TsType<'a>, owner: &Decl<'a>) -> TypeFlowEntry {
        let mut collected = Collected::default();
        if let Some(annotation) = annotation {
            self.annotation_pass(owner, annotation, &mut collected);
        }
        let mut visited = HashSet::new();
        self.semantic_pass(ty, &mut collected, &mut visited);
        let type_text = match annotation {
            Some(annotation) => annotation_text(annotation, &owner.file.text),
            None => ty.to_string(),
        };
        TypeFlowEntry {
            name,
            type_text,
            resolved_types: collected.into_sorted(),
        }
    }

    /// Every type name written in the annotation, resolved through imports.
    fn annotation_pass(&self, owner: &Decl<'a>, annotation: Node<'a>, out: &mut Collected) {
        let file = owner.file;
        let mut names = Vec::new();
        visit_descendants(annotation, |node: Node<'a>| {
            let is_name = match node.kind() {
                "type_identifier" => node
                    .parent()
                    .map(|p| p.kind() != "nested_type_identifier" || p.child_by_field_name("name") == Some(node))
                    .unwrap_or(true),
                // `typeof value`
                "identifier" => node.parent().map(|p| p.kind() == "type_query").unwrap_or(false),
                _ => false,
            };
            if is_name {
                names.push(node);
            }
        });
        for node in names {
            let Some(symbol) = self.ctx.checker.resolve_at(file, node) else {
                continue;
            };
            for decl in &symbol.declarations {
                self.add(decl, out);
            }
        }
    }

    /// Decomposes the checker's type into the user declarations it touches.
    fn semantic_pass(&self, ty: &TsType<'a>, out: &mut Collected, visited: &mut HashSet<DeclKey>) {
        match ty {
            TsType::Reference { decl, args } => {
                self.add(decl, out);
                for arg in args {
                    self.semantic_pass(arg, out, visited);
                }
            }
            TsType::Alias { decl, target, args } => {
                self.add(decl, out);
                for arg in args {
                    self.semantic_pass(arg, out, visited);
                }
                if visited.insert(decl.key()) {
                    self.semantic_pass(target, out, visited);
                }
            }
            TsType::EnumLiteral(member) => {
                if let Some(parent) = member.container() {
                    self.add(&parent, out);
                }
            }
            TsType::TypeOf(decl) => {
                if matches!(decl.kind, SymbolKind::Class | SymbolKind::Enum) {
                    self.add(decl, out);
                }
            }
            TsType::Named { args, .. } => {
                for arg in args {
                    self.semantic_pass(arg, out, visited);
                }
            }
            TsType::Union(members) | TsType::Intersection(members) | TsType::Tuple(members) => {
                for member in members {
                    self.semantic_pass(member, out, visited);
                }
            }
            TsType::Array(element) => self.semantic_pass(element, out, visited),
            TsType::Function(signature) => {
                for (_, param) in &signature.parameters {
                    self.semantic_pass(param, out, visited);
                }
                self.semantic_pass(&signature.return_type, out, visited);
            }
            TsType::Primitive(_)
            | TsType::Literal(_)
            | TsType::TypeParam(_)
            | TsType::Object { .. }
            | TsType::Unknown => {}
        }
    }

    fn add(&self, decl: &Decl<'a>, out: &mut Collected) {
        let decl = match decl.kind {
            SymbolKind::EnumMember => match decl.container() {
                Some(parent) => parent,
                None => return,
            },
            _ => *decl,
        };
        let is_type = matches!(
            decl.kind,
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::TypeAlias | SymbolKind::Enum
        );
        if !is_type || !decl.is_user() || EXCLUDED_TYPES.contains(&decl.name()) {
            return;
        }
        let reference = self.ctx.symbol_ref(&decl);
        out.refs
            .entry((reference.file_path.clone(), reference.line))
            .or_insert(reference);
    }
}

/// The declaration whose signature is traced; classes use their constructor.
fn callable_decl<'a>(decl: &Decl<'a>) -> Option<Decl<'a>> {
    if decl.kind == SymbolKind::Class {
        return type_members(decl.node)
            .into_iter()
            .find(|(member, name)| {
                member.kind() == "method_definition" && node_text(*name, &decl.file.text) == "constructor"
            })
            .and_then(|(member, _)| decl_of_node(decl.file, member));
    }
    function_node(decl.node).map(|_| *decl)
}

/// Annotation text without the leading `:`.
fn annotation_text(annotation: Node<'_>, source: &str) -> String {
    match annotation.kind() {
        "type_annotation" => named_children(annotation)
            .into_iter()
            .next()
            .map(|t| node_text(t, source).to_string())
            .unwrap_or_default(),
        _ => node_text(annotation, source).trim_start_matches(':').trim().to_string(),
    }
}
