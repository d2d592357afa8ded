//! Property access, qualified names and heritage clauses.

use super::{Decl, DeclKey, Meaning, Symbol, SyntacticChecker, TsType, decl_of_node, make_decl};
use crate::parser::syntax::type_members;
use crate::parser::utils::{find_ancestor, named_children, node_text, unwrap_expression};
use crate::project::SourceFile;
use std::collections::HashSet;
use tracescope_api::SymbolKind;
use tree_sitter::Node;

/// Resolved heritage of a class or interface.
#[derive(Debug, Default)]
pub struct Heritage<'a> {
    /// Class `extends` target.
    pub extends: Option<Symbol<'a>>,
    /// Class `implements` targets and interface `extends` targets.
    pub implements: Vec<Symbol<'a>>,
}

impl<'a> SyntacticChecker<'a> {
    /// `object.property` to the declarations of `property`.
    pub fn resolve_member_expression(&self, file: &'a SourceFile, member: Node<'a>) -> Option<Symbol<'a>> {
        let object = unwrap_expression(member.child_by_field_name("object")?);
        let property = member.child_by_field_name("property")?;
        let name = node_text(property, &file.text);

        let found = match object.kind() {
            "this" => {
                let class = self.enclosing_class(file, object)?;
                self.type_member(&class, name)
            }
            "super" => {
                let class = self.enclosing_class(file, object)?;
                let heritage = self.heritage(&class);
                let parent = heritage.extends?;
                self.type_member(parent.first(), name)
            }
            _ => {
                let ty = self.expression_type(file, object, 0);
                self.members_of_type(&ty, name, 0)
            }
        };
        Symbol::new(found)
    }

    /// `ns.Type` / `ns.inner.value` qualified names.
    pub fn resolve_qualified(&self, file: &'a SourceFile, node: Node<'a>) -> Option<Symbol<'a>> {
        let children = named_children(node);
        let (left, right) = match (children.first(), children.last()) {
            (Some(l), Some(r)) if children.len() >= 2 => (*l, *r),
            _ => return None,
        };
        let container = match left.kind() {
            "identifier" | "type_identifier" => {
                let text = node_text(left, &file.text);
                self.resolve_name(file, left, text, Meaning::Any)
            }
            "nested_identifier" | "nested_type_identifier" | "member_expression" => {
                self.resolve_qualified(file, left)
            }
            _ => None,
        }?;
        let container = self.resolve_symbol(container);
        let name = node_text(right, &file.text);
        let mut found = Vec::new();
        for decl in &container.declarations {
            found.extend(self.namespace_member(decl, name));
        }
        Symbol::new(found)
    }

    /// Nearest class whose body contains `node`.
    pub fn enclosing_class(&self, file: &'a SourceFile, node: Node<'a>) -> Option<Decl<'a>> {
        let class = find_ancestor(node, |n| {
            matches!(n.kind(), "class_declaration" | "abstract_class_declaration" | "class")
        })?;
        decl_of_node(file, class)
    }

    /// Member `name` of a class or interface, searching supertypes
    /// depth-first when the type does not declare it.
    pub fn type_member(&self, decl: &Decl<'a>, name: &str) -> Vec<Decl<'a>> {
        let mut visited = HashSet::new();
        self.type_member_inner(decl, name, &mut visited)
    }

    fn type_member_inner(&self, decl: &Decl<'a>, name: &str, visited: &mut HashSet<DeclKey>) -> Vec<Decl<'a>> {
        if !visited.insert(decl.key()) {
            return Vec::new();
        }
        // Merged interface declarations contribute members too.
        let holders: Vec<Decl<'a>> = if decl.kind == SymbolKind::Interface {
            self.merged(*decl)
                .declarations
                .into_iter()
                .filter(|d| d.kind == SymbolKind::Interface)
                .collect()
        } else {
            vec![*decl]
        };
        let mut found = Vec::new();
        for holder in &holders {
            found.extend(
                type_members(holder.node)
                    .into_iter()
                    .filter(|(_, n)| node_text(*n, &holder.file.text).trim_matches(['"', '\'']) == name)
                    .filter_map(|(d, n)| make_decl(holder.file, d, n)),
            );
        }
        if !found.is_empty() {
            return found;
        }
        for holder in &holders {
            let heritage = self.heritage(holder);
            for parent in heritage.extends.iter().chain(heritage.implements.iter()) {
                for parent_decl in &parent.declarations {
                    let inherited = self.type_member_inner(parent_decl, name, visited);
                    if !inherited.is_empty() {
                        return inherited;
                    }
                }
            }
        }
        Vec::new()
    }

    /// Members named `name` reachable on a value of type `ty`.
    pub fn members_of_type(&self, ty: &TsType<'a>, name: &str, depth: u8) -> Vec<Decl<'a>> {
        if depth > 8 {
            return Vec::new();
        }
        match ty {
            TsType::Reference { decl, .. } => match decl.kind {
                SymbolKind::Enum => Vec::new(),
                _ => self.type_member(decl, name),
            },
            TsType::Alias { target, .. } => self.members_of_type(target, name, depth + 1),
            TsType::TypeParam(decl) => {
                let constraint = decl.node.child_by_field_name("constraint");
                match constraint.and_then(|c| named_children(c).into_iter().next()) {
                    Some(c) => {
                        let bound = self.annotation_type(decl.file, c, &mut Vec::new());
                        self.members_of_type(&bound, name, depth + 1)
                    }
                    None => Vec::new(),
                }
            }
            TsType::Union(members) | TsType::Intersection(members) => members
                .iter()
                .map(|m| self.members_of_type(m, name, depth + 1))
                .find(|found| !found.is_empty())
                .unwrap_or_default(),
            TsType::TypeOf(decl) => self.namespace_member(decl, name),
            TsType::Object { file, node } => named_children(*node)
                .into_iter()
                .filter(|m| matches!(m.kind(), "property_signature" | "method_signature"))
                .filter_map(|m| {
                    let n = m.child_by_field_name("name")?;
                    (node_text(n, &file.text) == name).then(|| make_decl(file, m, n)).flatten()
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Heritage identifiers of a class or interface resolved to declarations.
    pub fn heritage(&self, decl: &Decl<'a>) -> Heritage<'a> {
        let (extends, implements) = heritage_nodes(decl.node);
        Heritage {
            extends: extends
                .first()
                .and_then(|target| self.resolve_heritage_node(decl.file, *target)),
            implements: implements
                .into_iter()
                .filter_map(|ty| self.resolve_heritage_node(decl.file, ty))
                .collect(),
        }
    }

    fn resolve_heritage_node(&self, file: &'a SourceFile, node: Node<'a>) -> Option<Symbol<'a>> {
        let symbol = match node.kind() {
            "identifier" => self.resolve_name(file, node, node_text(node, &file.text), Meaning::Value),
            "type_identifier" => self.resolve_name(file, node, node_text(node, &file.text), Meaning::Type),
            "generic_type" => {
                let name = node.child_by_field_name("name")?;
                return self.resolve_heritage_node(file, name);
            }
            "member_expression" => self.resolve_member_expression(file, node),
            "nested_type_identifier" | "nested_identifier" => self.resolve_qualified(file, node),
            _ => None,
        }?;
        let symbol = self.resolve_symbol(symbol);
        let decls: Vec<Decl<'a>> = symbol
            .declarations
            .into_iter()
            .filter(|d| matches!(d.kind, SymbolKind::Class | SymbolKind::Interface | SymbolKind::TypeAlias))
            .collect();
        Symbol::new(decls)
    }
}

/// Raw heritage expression nodes, in source order: (`extends`, others).
/// Interface `extends` lists land in the second vector.
fn heritage_nodes(decl_node: Node<'_>) -> (Vec<Node<'_>>, Vec<Node<'_>>) {
    let mut extends = Vec::new();
    let mut implements = Vec::new();
    for holder in named_children(decl_node) {
        match holder.kind() {
            "class_heritage" => {
                for clause in named_children(holder) {
                    match clause.kind() {
                        "extends_clause" => extends.extend(
                            clause
                                .child_by_field_name("value")
                                .or_else(|| named_children(clause).into_iter().next()),
                        ),
                        "implements_clause" => implements.extend(named_children(clause)),
                        _ => {}
                    }
                }
            }
            "extends_type_clause" => implements.extend(named_children(holder)),
            _ => {}
        }
    }
    (extends, implements)
}
