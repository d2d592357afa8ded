//! Module exports, import alias hops and ambient module shims.

use super::scope::import_bindings;
use super::{Decl, Meaning, Symbol, SyntacticChecker, decl_of_node, make_decl};
use crate::parser::syntax::{
    block_declarations, declaration_kind, declaration_name, namespace_body, statement_declarations,
    type_members,
};
use crate::parser::utils::{find_ancestor, has_token, named_children, node_text, string_literal_value};
use crate::project::{FileId, SourceFile};
use std::collections::HashSet;
use tracescope_api::SymbolKind;
use tree_sitter::Node;

/// How an import binding names the remote export.
enum ImportedName<'s> {
    Named(&'s str),
    Default,
    Namespace,
}

impl<'a> SyntacticChecker<'a> {
    /// One alias hop: the declarations an import binding stands for.
    ///
    /// Strategies, in order: the primary module link; every other candidate
    /// file of the specifier, searched by the original exported name;
    /// matching `declare module` blocks.
    pub fn resolve_import(&self, decl: &Decl<'a>) -> Option<Symbol<'a>> {
        let file = decl.file;
        let statement = find_ancestor(decl.node, |n| n.kind() == "import_statement")?;
        let specifier = import_source(statement, decl.node, &file.text)?;
        let imported = imported_name(decl, &file.text);
        let export_name = match imported {
            ImportedName::Named(name) => name,
            ImportedName::Default => "default",
            ImportedName::Namespace => return Some(Symbol::single(*decl)),
        };

        let candidates = self.index.linked(file.id, &specifier);
        if let Some(primary) = candidates.first() {
            let found = self.module_export(*primary, export_name);
            if let Some(symbol) = Symbol::new(found) {
                return Some(symbol);
            }
        }
        for candidate in candidates.iter().skip(1) {
            let found = self.module_export(*candidate, export_name);
            if let Some(symbol) = Symbol::new(found) {
                tracing::debug!("'{}' found in fallback candidate for '{}'", export_name, specifier);
                return Some(symbol);
            }
        }
        let ambient = self.ambient_export(&specifier, export_name);
        if let Some(symbol) = Symbol::new(ambient) {
            tracing::debug!("'{}' resolved through ambient module '{}'", export_name, specifier);
            return Some(symbol);
        }
        tracing::debug!("could not resolve import '{}' from '{}'", export_name, specifier);
        None
    }

    /// Declarations exported from `file` under `name`.
    pub fn module_export(&self, file: FileId, name: &str) -> Vec<Decl<'a>> {
        let mut visited = HashSet::new();
        let source = self.file(file);
        self.block_exports(source, source.root_node(), name, false, &mut visited)
    }

    /// Exports of a module body. In ambient module blocks every declaration
    /// is exported.
    fn block_exports(
        &self,
        file: &'a SourceFile,
        block: Node<'a>,
        name: &str,
        ambient: bool,
        visited: &mut HashSet<(FileId, usize, String)>,
    ) -> Vec<Decl<'a>> {
        if !visited.insert((file.id, block.start_byte(), name.to_string())) {
            return Vec::new();
        }
        let mut local = Vec::new();
        let mut stars = Vec::new();

        for stmt in named_children(block) {
            if ambient && stmt.kind() != "export_statement" {
                for (decl, name_node) in statement_declarations(stmt) {
                    if node_text(name_node, &file.text) == name {
                        local.extend(make_decl(file, decl, name_node));
                    }
                }
                continue;
            }
            if stmt.kind() != "export_statement" {
                continue;
            }
            let is_default = has_token(stmt, "default");
            let source = stmt.child_by_field_name("source");

            if let Some(declaration) = stmt.child_by_field_name("declaration") {
                if is_default {
                    if name == "default" {
                        local.extend(decl_of_node(file, declaration));
                    }
                } else {
                    for (decl, name_node) in statement_declarations(stmt) {
                        if node_text(name_node, &file.text) == name {
                            local.extend(make_decl(file, decl, name_node).or(Some(Decl {
                                file,
                                kind: SymbolKind::Variable,
                                node: decl,
                                name_node,
                            })));
                        }
                    }
                }
                continue;
            }

            if let Some(value) = stmt.child_by_field_name("value") {
                if is_default && name == "default" {
                    local.extend(self.default_value_decls(file, stmt, value));
                }
                continue;
            }

            // `export = target;`
            if has_token(stmt, "=") {
                if let Some(target) = named_children(stmt).into_iter().find(|c| c.kind() != "comment") {
                    let decls = self.default_value_decls(file, stmt, target);
                    if name == "default" {
                        local.extend(decls);
                    } else {
                        for decl in decls {
                            local.extend(self.namespace_member(&decl, name));
                        }
                    }
                }
                continue;
            }

            let mut clause = None;
            let mut namespace_export = None;
            for child in named_children(stmt) {
                match child.kind() {
                    "export_clause" => clause = Some(child),
                    "namespace_export" => namespace_export = Some(child),
                    _ => {}
                }
            }

            if let Some(clause) = clause {
                for spec in named_children(clause) {
                    if spec.kind() != "export_specifier" {
                        continue;
                    }
                    let Some(local_name) = spec.child_by_field_name("name") else {
                        continue;
                    };
                    let exported = spec.child_by_field_name("alias").unwrap_or(local_name);
                    if string_literal_value(exported, &file.text) != name {
                        continue;
                    }
                    let original = string_literal_value(local_name, &file.text);
                    match source {
                        Some(src) => {
                            let specifier = string_literal_value(src, &file.text);
                            local.extend(self.reexported(file, &specifier, &original, visited));
                        }
                        None => {
                            if let Some(symbol) = self.resolve_name(file, stmt, &original, Meaning::Any) {
                                local.extend(symbol.declarations);
                            }
                        }
                    }
                }
                continue;
            }

            if let Some(ns) = namespace_export {
                let ns_name = named_children(ns).into_iter().find(|c| c.kind() != "comment");
                if let Some(ns_name) = ns_name {
                    if string_literal_value(ns_name, &file.text) == name {
                        local.push(Decl {
                            file,
                            kind: SymbolKind::Namespace,
                            node: ns,
                            name_node: ns_name,
                        });
                    }
                }
                continue;
            }

            // `export * from './x'` never re-exports a default.
            if let Some(src) = source {
                if name != "default" {
                    stars.push(string_literal_value(src, &file.text));
                }
            }
        }

        if !local.is_empty() {
            return local;
        }
        for specifier in stars {
            let found = self.reexported(file, &specifier, name, visited);
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    fn reexported(
        &self,
        file: &'a SourceFile,
        specifier: &str,
        name: &str,
        visited: &mut HashSet<(FileId, usize, String)>,
    ) -> Vec<Decl<'a>> {
        for target in self.index.linked(file.id, specifier) {
            let target_file = self.file(*target);
            let found = self.block_exports(target_file, target_file.root_node(), name, false, visited);
            if !found.is_empty() {
                return found;
            }
        }
        self.ambient_export(specifier, name)
    }

    /// `export default <expr>` / `export = <expr>`: identifiers resolve to
    /// their declarations; anything else is an anonymous value.
    fn default_value_decls(&self, file: &'a SourceFile, stmt: Node<'a>, value: Node<'a>) -> Vec<Decl<'a>> {
        if value.kind() == "identifier" {
            let text = node_text(value, &file.text);
            if let Some(symbol) = self.resolve_name(file, stmt, text, Meaning::Any) {
                return symbol.declarations;
            }
            return Vec::new();
        }
        if let Some(decl) = decl_of_node(file, value).filter(|_| declaration_name(value).is_some()) {
            return vec![decl];
        }
        let Some(keyword) = crate::parser::utils::children(stmt)
            .into_iter()
            .find(|c| !c.is_named() && matches!(c.kind(), "default" | "="))
        else {
            return Vec::new();
        };
        let kind = declaration_kind(value, &file.text).unwrap_or(SymbolKind::Variable);
        vec![Decl {
            file,
            kind,
            node: value,
            name_node: keyword,
        }]
    }

    /// Exports named `name` of every `declare module` block matching
    /// `specifier` (including `*` wildcard module names).
    pub fn ambient_export(&self, specifier: &str, name: &str) -> Vec<Decl<'a>> {
        let mut found = Vec::new();
        let mut visited = HashSet::new();
        for module in self.index.all_ambient_modules() {
            if !ambient_name_matches(&module.name, specifier) {
                continue;
            }
            let Some(body) = self.index.ambient_module_node(module).and_then(namespace_body) else {
                continue;
            };
            let file = self.file(module.file);
            found.extend(self.block_exports(file, body, name, true, &mut visited));
        }
        found
    }

    /// Member `name` reached through a namespace-like declaration: import
    /// namespaces, `export * as ns`, namespaces, enums and classes.
    pub fn namespace_member(&self, decl: &Decl<'a>, name: &str) -> Vec<Decl<'a>> {
        let file = decl.file;
        match decl.node.kind() {
            "namespace_import" | "import_require_clause" => {
                let Some(statement) = find_ancestor(decl.node, |n| n.kind() == "import_statement") else {
                    return Vec::new();
                };
                let Some(specifier) = import_source(statement, decl.node, &file.text) else {
                    return Vec::new();
                };
                let mut visited = HashSet::new();
                self.reexported(file, &specifier, name, &mut visited)
            }
            "namespace_export" => {
                let Some(statement) = decl.node.parent() else {
                    return Vec::new();
                };
                let Some(src) = statement.child_by_field_name("source") else {
                    return Vec::new();
                };
                let specifier = string_literal_value(src, &file.text);
                let mut visited = HashSet::new();
                self.reexported(file, &specifier, name, &mut visited)
            }
            "internal_module" | "module" => {
                let Some(body) = namespace_body(decl.node) else {
                    return Vec::new();
                };
                let mut out: Vec<Decl<'a>> = block_declarations(body)
                    .into_iter()
                    .filter(|(_, n)| node_text(*n, &file.text) == name)
                    .filter_map(|(d, n)| make_decl(file, d, n))
                    .collect();
                if out.is_empty() {
                    // Nested `export import X = ...` and re-exported imports.
                    out.extend(import_bindings(file, body).into_iter().filter(|d| d.name() == name));
                }
                out
            }
            "enum_declaration" | "class_declaration" | "abstract_class_declaration" | "class"
            | "interface_declaration" => type_members(decl.node)
                .into_iter()
                .filter(|(_, n)| node_text(*n, &file.text).trim_matches(['"', '\'']) == name)
                .filter_map(|(d, n)| make_decl(file, d, n))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Symbol for either side of an `export { a as b }` specifier.
    pub fn export_specifier_symbol(&self, file: &'a SourceFile, spec: Node<'a>) -> Option<Symbol<'a>> {
        let statement = spec.parent().and_then(|c| c.parent())?;
        let local_name = spec.child_by_field_name("name")?;
        let original = string_literal_value(local_name, &file.text);
        match statement.child_by_field_name("source") {
            Some(src) => {
                let specifier = string_literal_value(src, &file.text);
                let mut visited = HashSet::new();
                Symbol::new(self.reexported(file, &specifier, &original, &mut visited))
            }
            None => self.resolve_name(file, statement, &original, Meaning::Any),
        }
    }
}

/// Module specifier of the import statement owning `binding`.
fn import_source(statement: Node<'_>, binding: Node<'_>, source: &str) -> Option<String> {
    if let Some(src) = statement.child_by_field_name("source") {
        return Some(string_literal_value(src, source));
    }
    let clause = if binding.kind() == "import_require_clause" {
        binding
    } else {
        named_children(statement)
            .into_iter()
            .find(|c| c.kind() == "import_require_clause")?
    };
    let src = clause
        .child_by_field_name("source")
        .or_else(|| named_children(clause).into_iter().find(|c| c.kind() == "string"))?;
    Some(string_literal_value(src, source))
}

fn imported_name<'s>(decl: &Decl<'_>, source: &'s str) -> ImportedName<'s> {
    match decl.node.kind() {
        "import_specifier" => match decl.node.child_by_field_name("name") {
            Some(name) => {
                let text = node_text(name, source);
                ImportedName::Named(text.trim_matches(|c| c == '"' || c == '\''))
            }
            None => ImportedName::Default,
        },
        "identifier" => ImportedName::Default,
        _ => ImportedName::Namespace,
    }
}

/// `declare module "*.svg"` style names match by prefix and suffix.
pub fn ambient_name_matches(declared: &str, specifier: &str) -> bool {
    match declared.split_once('*') {
        Some((prefix, suffix)) => {
            specifier.len() >= prefix.len() + suffix.len()
                && specifier.starts_with(prefix)
                && specifier.ends_with(suffix)
        }
        None => declared == specifier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_name_patterns() {
        assert!(ambient_name_matches("*.svg", "./logo.svg"));
        assert!(!ambient_name_matches("*.svg", "./logo.png"));
        assert!(ambient_name_matches("virtual:config", "virtual:config"));
        assert!(!ambient_name_matches("virtual:config", "virtual:other"));
    }
}
