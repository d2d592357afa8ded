use super::AnalysisContext;
use crate::checker::{Decl, Symbol, make_decl};
use crate::error::{Result, TracescopeError};
use crate::parser::syntax::{declaration_kind, declaration_name, type_members};
use crate::parser::utils::{end_line_of, is_identifier_kind, line_of, node_text, visit_descendants};
use crate::project::SourceFile;
use tracescope_api::{SymbolKind, SymbolQuery};
use tree_sitter::Node;

/// Finds the authoritative declaration for a (file hint, name) pair.
pub struct SymbolLocator<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
}

const BINDING_PRIORITY: u8 = 7;

/// Search stages in priority order; lower wins on ambiguity.
fn priority(kind: SymbolKind) -> u8 {
    match kind {
        SymbolKind::Function => 0,
        SymbolKind::Class => 1,
        SymbolKind::Interface => 2,
        SymbolKind::TypeAlias => 3,
        SymbolKind::Enum | SymbolKind::EnumMember => 4,
        SymbolKind::Variable => 5,
        SymbolKind::Method
        | SymbolKind::Constructor
        | SymbolKind::Accessor
        | SymbolKind::Property => 6,
        // Reached only through the identifier scan.
        _ => BINDING_PRIORITY,
    }
}

impl<'c, 'a> SymbolLocator<'c, 'a> {
    pub fn new(ctx: &'c AnalysisContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn locate(&self, query: &SymbolQuery) -> Result<Decl<'a>> {
        let name = query.name.trim();
        if name.is_empty() {
            return Err(TracescopeError::InvalidArgument("empty symbol name".to_string()));
        }

        // `Container.member`
        if let Some((container, member)) = name.rsplit_once('.') {
            if !container.is_empty() && !member.is_empty() {
                let outer = SymbolQuery {
                    name: container.to_string(),
                    file: query.file.clone(),
                    line: None,
                };
                if let Ok(owner) = self.locate(&outer) {
                    if let Some(found) = self.member_of(&owner, member) {
                        return Ok(found);
                    }
                }
                return Err(self.not_found(name, query));
            }
        }

        let hinted = query
            .file
            .as_deref()
            .and_then(|hint| self.ctx.index.find_file(hint));
        match (&query.file, hinted) {
            (_, Some(file)) => self
                .locate_in_file(file, name, query.line)
                .ok_or_else(|| self.not_found(name, query)),
            (Some(hint), None) => {
                tracing::debug!("file hint '{}' is not indexed, scanning all files", hint);
                self.scan_all(name, query)
            }
            (None, None) => self.scan_all(name, query),
        }
    }

    /// Declarations proper win anywhere in the project before bindings that
    /// only mention the name (imports, parameters) are considered.
    fn scan_all(&self, name: &str, query: &SymbolQuery) -> Result<Decl<'a>> {
        let files = self.ctx.index.files();
        files
            .iter()
            .find_map(|file| pick(self.declarations(file, name, true), None))
            .or_else(|| files.iter().find_map(|file| self.locate_in_file(file, name, None)))
            .ok_or_else(|| self.not_found(name, query))
    }

    fn not_found(&self, name: &str, query: &SymbolQuery) -> TracescopeError {
        let scanned_files = match query.file.as_deref().and_then(|h| self.ctx.index.find_file(h)) {
            Some(_) => 1,
            None => self.ctx.index.files().len(),
        };
        TracescopeError::SymbolNotFound {
            name: name.to_string(),
            scanned_files,
        }
    }

    /// Best declaration named `name` in one file.
    pub fn locate_in_file(&self, file: &'a SourceFile, name: &str, line: Option<u32>) -> Option<Decl<'a>> {
        let mut candidates = self.declarations(file, name, false);
        if candidates.is_empty() {
            candidates = self.identifier_scan(file, name);
        }
        pick(candidates, line).map(|decl| self.through_import(decl))
    }

    /// Declaration nodes named `name`; `primary` keeps only the kinds with a
    /// search stage of their own.
    fn declarations(&self, file: &'a SourceFile, name: &str, primary: bool) -> Vec<Decl<'a>> {
        let mut candidates: Vec<Decl<'a>> = Vec::new();
        visit_descendants(file.root_node(), |node| {
            let Some(kind) = declaration_kind(node, &file.text) else {
                return;
            };
            if primary && priority(kind) >= BINDING_PRIORITY {
                return;
            }
            let Some(name_node) = declaration_name(node) else {
                return;
            };
            if unquote(node_text(name_node, &file.text)) != name {
                return;
            }
            if let Some(decl) = make_decl(file, node, name_node) {
                candidates.push(decl);
            }
        });
        candidates
    }

    /// An import binding stands for the declaration it brings in.
    fn through_import(&self, decl: Decl<'a>) -> Decl<'a> {
        if !decl.is_alias() {
            return decl;
        }
        *self.ctx.checker.resolve_symbol(Symbol::single(decl)).first()
    }

    /// Last resort: any identifier whose parent produces a declaration
    /// (destructuring, parameters, imports).
    fn identifier_scan(&self, file: &'a SourceFile, name: &str) -> Vec<Decl<'a>> {
        let mut found = Vec::new();
        visit_descendants(file.root_node(), |node: Node<'a>| {
            if !is_identifier_kind(node.kind()) || node_text(node, &file.text) != name {
                return;
            }
            if let Some(decl) = self.ctx.checker.decl_for_name(file, node) {
                found.push(decl);
            }
        });
        found
    }

    fn member_of(&self, owner: &Decl<'a>, member: &str) -> Option<Decl<'a>> {
        match owner.kind {
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::Enum => {
                let own: Vec<Decl<'a>> = type_members(owner.node)
                    .into_iter()
                    .filter(|(_, n)| unquote(node_text(*n, &owner.file.text)) == member)
                    .filter_map(|(d, n)| make_decl(owner.file, d, n))
                    .collect();
                if let Some(first) = own.first() {
                    return Some(*first);
                }
                self.ctx.checker.type_member(owner, member).into_iter().next()
            }
            _ => self.ctx.checker.namespace_member(owner, member).into_iter().next(),
        }
    }
}

fn pick<'a>(mut candidates: Vec<Decl<'a>>, line: Option<u32>) -> Option<Decl<'a>> {
    if let Some(line) = line {
        let containing = candidates
            .iter()
            .filter(|d| line_of(d.node) <= line && line <= end_line_of(d.node))
            .min_by_key(|d| (priority(d.kind), d.node.end_byte() - d.node.start_byte()));
        if let Some(found) = containing {
            return Some(*found);
        }
    }
    // Stable: ties keep source order.
    candidates.sort_by_key(|d| priority(d.kind));
    candidates.into_iter().next()
}

fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_prefers_functions_over_variables() {
        assert!(priority(SymbolKind::Function) < priority(SymbolKind::Class));
        assert!(priority(SymbolKind::Enum) < priority(SymbolKind::Variable));
        assert!(priority(SymbolKind::Variable) < priority(SymbolKind::Constructor));
        assert!(priority(SymbolKind::Constructor) < priority(SymbolKind::Parameter));
    }
}
