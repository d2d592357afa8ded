//! Symbol and type queries over the parsed project.
//!
//! Resolvers only talk to the [`Checker`] capability trait; the
//! [`SyntacticChecker`] implementation answers those queries from syntax
//! trees and the module link table of a [`ProjectIndex`].

pub mod exports;
pub mod members;
pub mod scope;
pub mod types;

use crate::parser::syntax::{binding_names, declaration_kind, declaration_name, type_members};
use crate::parser::utils::{find_ancestor, line_of, node_text};
use crate::project::{FileId, ProjectIndex, SourceFile};
use std::collections::HashSet;
use std::fmt;
use tracescope_api::SymbolKind;
use tree_sitter::Node;

pub use scope::Meaning;
pub use types::{Signature, TsType};

/// Identity of a declaration: file plus start byte of its name token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclKey {
    pub file: FileId,
    pub start: usize,
}

/// One syntax node introducing a name.
#[derive(Clone, Copy)]
pub struct Decl<'a> {
    pub file: &'a SourceFile,
    pub kind: SymbolKind,
    /// The declaration node (`class_declaration`, `variable_declarator`, ...).
    pub node: Node<'a>,
    /// The token naming it; the `default` keyword for anonymous defaults.
    pub name_node: Node<'a>,
}

impl<'a> Decl<'a> {
    pub fn name(&self) -> &'a str {
        let text = node_text(self.name_node, &self.file.text);
        text.trim_matches(|c| c == '"' || c == '\'')
    }

    pub fn key(&self) -> DeclKey {
        DeclKey {
            file: self.file.id,
            start: self.name_node.start_byte(),
        }
    }

    /// 1-indexed line of the name token.
    pub fn line(&self) -> u32 {
        line_of(self.name_node)
    }

    pub fn is_user(&self) -> bool {
        self.file.is_user
    }

    pub fn same_as(&self, other: &Decl<'_>) -> bool {
        self.key() == other.key()
    }

    /// Import bindings that stand for another module's export.
    pub fn is_alias(&self) -> bool {
        self.kind == SymbolKind::Import
            && matches!(self.node.kind(), "import_specifier" | "identifier")
    }

    /// Variables and fields holding a function report as functions/methods.
    pub fn effective_kind(&self) -> SymbolKind {
        match self.kind {
            SymbolKind::Variable if crate::parser::syntax::function_node(self.node).is_some() => {
                SymbolKind::Function
            }
            SymbolKind::Property if crate::parser::syntax::function_node(self.node).is_some() => {
                SymbolKind::Method
            }
            other => other,
        }
    }

    pub fn is_member(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Method
                | SymbolKind::Property
                | SymbolKind::Accessor
                | SymbolKind::Constructor
                | SymbolKind::EnumMember
        ) && self.container().is_some()
    }

    /// The class, interface or enum declaring this member.
    pub fn container(&self) -> Option<Decl<'a>> {
        let owner = find_ancestor(self.node, |n| {
            matches!(
                n.kind(),
                "class_declaration"
                    | "abstract_class_declaration"
                    | "class"
                    | "interface_declaration"
                    | "enum_declaration"
            )
        })?;
        let body_holder = find_ancestor(self.node, |n| {
            matches!(n.kind(), "class_body" | "interface_body" | "object_type" | "enum_body")
        })?;
        if body_holder.parent() != Some(owner) {
            return None;
        }
        decl_of_node(self.file, owner)
    }

    /// `Class.member` for members, the plain name otherwise.
    pub fn display_name(&self) -> String {
        match self.container().filter(|_| self.is_member()) {
            Some(owner) => format!("{}.{}", owner.name(), self.name()),
            None => self.name().to_string(),
        }
    }
}

impl fmt::Debug for Decl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} at {}:{}",
            self.kind,
            self.name(),
            self.file.rel_path,
            self.line()
        )
    }
}

/// A semantic identity owning one or more merged declarations.
#[derive(Debug, Clone)]
pub struct Symbol<'a> {
    pub name: &'a str,
    pub declarations: Vec<Decl<'a>>,
}

impl<'a> Symbol<'a> {
    pub fn new(declarations: Vec<Decl<'a>>) -> Option<Self> {
        let first = declarations.first()?;
        Some(Self {
            name: first.name(),
            declarations,
        })
    }

    pub fn single(decl: Decl<'a>) -> Self {
        Self {
            name: decl.name(),
            declarations: vec![decl],
        }
    }

    /// The declaration queries report when they need exactly one.
    pub fn first(&self) -> &Decl<'a> {
        &self.declarations[0]
    }

    pub fn keys(&self) -> HashSet<DeclKey> {
        self.declarations.iter().map(Decl::key).collect()
    }

    pub fn contains(&self, decl: &Decl<'_>) -> bool {
        self.declarations.iter().any(|d| d.same_as(decl))
    }
}

/// The semantic queries resolvers need from a type checker.
pub trait Checker<'a> {
    /// Symbol named by the identifier-like `node`, without following aliases.
    fn symbol_at_location(&self, file: &'a SourceFile, node: Node<'a>) -> Option<Symbol<'a>>;

    /// Follows import/re-export aliases to the first non-alias symbol.
    /// `None` when the chain cannot be completed or loops.
    fn resolve_alias_chain(&self, symbol: Symbol<'a>) -> Option<Symbol<'a>>;

    fn call_signatures(&self, ty: &TsType<'a>) -> Vec<Signature<'a>>;

    fn type_arguments(&self, ty: &TsType<'a>) -> Vec<TsType<'a>>;

    fn type_from_annotation(&self, file: &'a SourceFile, annotation: Node<'a>) -> TsType<'a>;

    fn type_of_declaration(&self, decl: &Decl<'a>) -> TsType<'a>;
}

/// [`Checker`] answering from syntax alone.
pub struct SyntacticChecker<'a> {
    pub index: &'a ProjectIndex,
}

impl<'a> SyntacticChecker<'a> {
    pub fn new(index: &'a ProjectIndex) -> Self {
        Self { index }
    }

    /// `symbol_at_location` followed by the alias chain, falling back to the
    /// unresolved symbol when the chain breaks.
    pub fn resolve_at(&self, file: &'a SourceFile, node: Node<'a>) -> Option<Symbol<'a>> {
        let symbol = self.symbol_at_location(file, node)?;
        Some(self.resolve_symbol(symbol))
    }

    pub fn resolve_symbol(&self, symbol: Symbol<'a>) -> Symbol<'a> {
        if !symbol.first().is_alias() {
            return symbol;
        }
        match self.resolve_alias_chain(symbol.clone()) {
            Some(resolved) => resolved,
            None => symbol,
        }
    }

    /// All declarations merged with `decl` (overloads, interface merging,
    /// class + namespace), in source order.
    pub fn merged(&self, decl: Decl<'a>) -> Symbol<'a> {
        if let Some(owner) = decl.container().filter(|_| decl.is_member()) {
            let name = decl.name();
            let members: Vec<Decl<'a>> = type_members(owner.node)
                .into_iter()
                .filter(|(_, n)| node_text(*n, &decl.file.text).trim_matches(['"', '\'']) == name)
                .filter_map(|(d, n)| make_decl(decl.file, d, n))
                .collect();
            if members.iter().any(|m| m.same_as(&decl)) {
                return Symbol::new(members).unwrap_or_else(|| Symbol::single(decl));
            }
            return Symbol::single(decl);
        }
        if matches!(decl.kind, SymbolKind::Parameter | SymbolKind::TypeParameter | SymbolKind::Import) {
            return Symbol::single(decl);
        }
        match self.resolve_name(decl.file, decl.node, decl.name(), Meaning::Any) {
            Some(symbol) if symbol.contains(&decl) => symbol,
            _ => Symbol::single(decl),
        }
    }

    /// Declaration whose name token is `node`, if it is one.
    pub fn decl_for_name(&self, file: &'a SourceFile, node: Node<'a>) -> Option<Decl<'a>> {
        if let Some(kind) = declaration_kind(node, &file.text) {
            return Some(Decl {
                file,
                kind,
                node,
                name_node: node,
            });
        }
        let parent = node.parent()?;
        if declaration_name(parent) == Some(node) {
            if let Some(decl) = make_decl(file, parent, node) {
                return Some(decl);
            }
        }
        // Destructured bindings.
        let mut holder = parent;
        while matches!(
            holder.kind(),
            "object_pattern"
                | "array_pattern"
                | "pair_pattern"
                | "assignment_pattern"
                | "object_assignment_pattern"
                | "rest_pattern"
        ) {
            holder = holder.parent()?;
        }
        let pattern = match holder.kind() {
            "variable_declarator" => holder.child_by_field_name("name")?,
            "required_parameter" | "optional_parameter" => holder.child_by_field_name("pattern")?,
            _ => return None,
        };
        if !binding_names(pattern).contains(&node) {
            return None;
        }
        let kind = if holder.kind() == "variable_declarator" {
            SymbolKind::Variable
        } else {
            SymbolKind::Parameter
        };
        Some(Decl {
            file,
            kind,
            node: holder,
            name_node: node,
        })
    }

    pub fn file(&self, id: FileId) -> &'a SourceFile {
        self.index.file(id)
    }
}

/// Builds a [`Decl`] for a declaration node and its name token.
pub fn make_decl<'a>(file: &'a SourceFile, node: Node<'a>, name_node: Node<'a>) -> Option<Decl<'a>> {
    let kind = declaration_kind(node, &file.text)?;
    Some(Decl {
        file,
        kind,
        node,
        name_node,
    })
}

/// [`Decl`] for a declaration node, naming anonymous ones by their first
/// token (`default`, `class`, `function`).
pub fn decl_of_node<'a>(file: &'a SourceFile, node: Node<'a>) -> Option<Decl<'a>> {
    let kind = declaration_kind(node, &file.text)?;
    let name_node = declaration_name(node).or_else(|| node.child(0))?;
    Some(Decl {
        file,
        kind,
        node,
        name_node,
    })
}

impl<'a> Checker<'a> for SyntacticChecker<'a> {
    fn symbol_at_location(&self, file: &'a SourceFile, node: Node<'a>) -> Option<Symbol<'a>> {
        let parent = node.parent()?;
        let text = node_text(node, &file.text);

        // Import specifier: `name` is the remote export, `alias` the local binding.
        if parent.kind() == "import_specifier" {
            let decl = make_decl(file, parent, declaration_name(parent)?)?;
            let is_remote_name = parent.child_by_field_name("alias").is_some()
                && parent.child_by_field_name("name") == Some(node);
            if is_remote_name {
                return self.resolve_import(&decl);
            }
            return Some(Symbol::single(decl));
        }
        if parent.kind() == "export_specifier" {
            return self.export_specifier_symbol(file, parent);
        }

        if let Some(decl) = self.decl_for_name(file, node) {
            return Some(self.merged(decl));
        }

        match parent.kind() {
            "member_expression" if parent.child_by_field_name("property") == Some(node) => {
                return self.resolve_member_expression(file, parent);
            }
            "nested_type_identifier" | "nested_identifier"
                if parent.child_by_field_name("name") == Some(node)
                    || parent.named_child(parent.named_child_count().saturating_sub(1) as u32) == Some(node) =>
            {
                return self.resolve_qualified(file, parent);
            }
            _ => {}
        }

        match node.kind() {
            "type_identifier" => self.resolve_name(file, node, text, Meaning::Type),
            "identifier" | "shorthand_property_identifier" => {
                let meaning = if in_type_context(node) {
                    Meaning::Any
                } else {
                    Meaning::Value
                };
                self.resolve_name(file, node, text, meaning)
            }
            "this" => self.enclosing_class(file, node).map(Symbol::single),
            _ => None,
        }
    }

    fn resolve_alias_chain(&self, symbol: Symbol<'a>) -> Option<Symbol<'a>> {
        let mut current = symbol;
        let mut seen = HashSet::new();
        loop {
            let first = *current.first();
            if !first.is_alias() {
                return Some(current);
            }
            if !seen.insert(first.key()) {
                tracing::debug!("alias cycle at {:?}", first);
                return None;
            }
            current = self.resolve_import(&first)?;
        }
    }

    fn call_signatures(&self, ty: &TsType<'a>) -> Vec<Signature<'a>> {
        self.signatures_of(ty, 0)
    }

    fn type_arguments(&self, ty: &TsType<'a>) -> Vec<TsType<'a>> {
        match ty {
            TsType::Reference { args, .. }
            | TsType::Alias { args, .. }
            | TsType::Named { args, .. } => args.clone(),
            _ => Vec::new(),
        }
    }

    fn type_from_annotation(&self, file: &'a SourceFile, annotation: Node<'a>) -> TsType<'a> {
        let mut expanding = Vec::new();
        self.annotation_type(file, annotation, &mut expanding)
    }

    fn type_of_declaration(&self, decl: &Decl<'a>) -> TsType<'a> {
        self.declaration_type(decl, 0)
    }
}

/// True inside a type annotation, type arguments or a `typeof` query.
pub fn in_type_context(node: Node<'_>) -> bool {
    find_ancestor(node, |n| {
        matches!(
            n.kind(),
            "type_annotation"
                | "type_arguments"
                | "type_query"
                | "implements_clause"
                | "extends_type_clause"
                | "type_alias_declaration"
        )
    })
    .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::parser::TsParser;
    use crate::parser::utils::visit_descendants;
    use std::fs;

    fn build(files: &[(&str, &str)]) -> (tempfile::TempDir, ProjectIndex) {
        let dir = tempfile::tempdir().unwrap();
        for (rel, text) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }
        let index = ProjectIndex::build(dir.path(), EngineConfig::default(), &TsParser::new()).unwrap();
        (dir, index)
    }

    fn find_identifier<'a>(file: &'a SourceFile, text: &str, nth: usize) -> Node<'a> {
        let mut found = Vec::new();
        visit_descendants(file.root_node(), |n| {
            if crate::parser::utils::is_identifier_kind(n.kind()) && file.text_of(n) == text {
                found.push(n);
            }
        });
        found[nth]
    }

    #[test]
    fn test_import_resolves_through_barrel_alias() {
        let (_dir, index) = build(&[
            ("src/user.ts", "export class User {}\n"),
            ("src/index.ts", "export { User as Account } from './user';\n"),
            ("src/main.ts", "import { Account } from './index';\nconst a = new Account();\n"),
        ]);
        let checker = SyntacticChecker::new(&index);
        let main = index.find_file("src/main.ts").unwrap();
        let usage = find_identifier(main, "Account", 1);
        let symbol = checker.resolve_at(main, usage).unwrap();
        assert_eq!(symbol.first().name(), "User");
        assert_eq!(symbol.first().file.rel_path, "src/user.ts");
    }

    #[test]
    fn test_interface_and_namespace_merge() {
        let (_dir, index) = build(&[(
            "a.ts",
            "export interface Box { a: number }\nexport namespace Box { export const x = 1; }\nlet b: Box;\n",
        )]);
        let checker = SyntacticChecker::new(&index);
        let file = index.find_file("a.ts").unwrap();
        let usage = find_identifier(file, "Box", 2);
        let symbol = checker.resolve_at(file, usage).unwrap();
        assert_eq!(symbol.declarations.len(), 2);
        assert_eq!(symbol.first().kind, SymbolKind::Interface);
    }

    #[test]
    fn test_member_through_typed_parameter() {
        let (_dir, index) = build(&[(
            "a.ts",
            "class Repo { save(x: number) {} }\nfunction run(repo: Repo) { repo.save(1); }\n",
        )]);
        let checker = SyntacticChecker::new(&index);
        let file = index.find_file("a.ts").unwrap();
        let usage = find_identifier(file, "save", 1);
        let symbol = checker.resolve_at(file, usage).unwrap();
        assert_eq!(symbol.first().display_name(), "Repo.save");
    }
}
