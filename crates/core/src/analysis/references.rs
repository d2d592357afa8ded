//! Project-wide usage search and classification.

use super::AnalysisContext;
use crate::checker::{Decl, DeclKey, Symbol, in_type_context};
use crate::parser::utils::{find_ancestor, is_identifier_kind, line_of, named_children, node_text, outermost_wrapper, string_literal_value, visit_descendants};
use crate::project::{FileId, SourceFile};
use crate::util::Deadline;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracescope_api::{FileReferences, ReExport, ReferenceSummary, UsageKind};
use tree_sitter::Node;

/// One usage of a symbol's name.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceSite<'a> {
    pub file: &'a SourceFile,
    pub node: Node<'a>,
    pub line: u32,
    pub kind: UsageKind,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub include_tests: bool,
    pub deadline: Deadline,
    /// Stop after the first hit.
    pub first_only: bool,
    /// Skip the target's own `export { x }` clauses, which publish it
    /// without using it.
    pub skip_local_exports: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_tests: true,
            deadline: Deadline::unbounded(),
            first_only: false,
            skip_local_exports: false,
        }
    }
}

/// Result of one search; `partial` when the deadline cut it short.
#[derive(Debug, Default)]
pub struct SearchResult<'a> {
    pub sites: Vec<ReferenceSite<'a>>,
    pub partial: bool,
}

pub struct ReferenceFinder<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
}

impl<'c, 'a> ReferenceFinder<'c, 'a> {
    pub fn new(ctx: &'c AnalysisContext<'a>) -> Self {
        Self { ctx }
    }

    /// Every usage of `target` in user files. Declaration name tokens of
    /// the target itself are never reported.
    pub fn find(&self, target: &Symbol<'a>, options: SearchOptions) -> SearchResult<'a> {
        let keys = target.keys();
        let names = self.search_names(target);
        let mut result = SearchResult::default();

        for id in self.candidate_files(&names) {
            if options.deadline.expired() {
                tracing::debug!("reference search for '{}' timed out", target.name);
                result.partial = true;
                break;
            }
            let file = self.ctx.index.file(id);
            if !file.is_user || (!options.include_tests && file.is_test) {
                continue;
            }
            self.scan_file(file, &names, &keys, &options, &mut result.sites);
            if options.first_only && !result.sites.is_empty() {
                break;
            }
        }
        result.sites.sort_by(|a, b| {
            a.file
                .rel_path
                .cmp(&b.file.rel_path)
                .then(a.node.start_byte().cmp(&b.node.start_byte()))
        });
        result
    }

    fn scan_file(
        &self,
        file: &'a SourceFile,
        names: &BTreeSet<String>,
        keys: &HashSet<DeclKey>,
        options: &SearchOptions,
        out: &mut Vec<ReferenceSite<'a>>,
    ) {
        let checker = &self.ctx.checker;
        let mut hits = Vec::new();
        visit_descendants(file.root_node(), |node: Node<'a>| {
            if !is_identifier_kind(node.kind()) || !names.contains(node_text(node, &file.text)) {
                return;
            }
            let own_site = keys.contains(&DeclKey {
                file: file.id,
                start: node.start_byte(),
            });
            if own_site || is_shadowed_alias_name(node) {
                return;
            }
            if options.skip_local_exports && is_local_export_name(node) {
                return;
            }
            hits.push(node);
        });
        for node in hits {
            let Some(symbol) = checker.resolve_at(file, node) else {
                continue;
            };
            if symbol.declarations.iter().any(|d| keys.contains(&d.key())) {
                out.push(ReferenceSite {
                    file,
                    node,
                    line: line_of(node),
                    kind: classify(node),
                });
            }
        }
    }

    /// The symbol's name plus every alias it is imported or re-exported
    /// under (`import { a as b }`, `export { a as b }`), transitively.
    pub fn search_names(&self, target: &Symbol<'a>) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        names.insert(target.name.to_string());
        let mut pending = vec![target.name.to_string()];
        while let Some(name) = pending.pop() {
            for id in self.ctx.index.files_with_token(&name) {
                let file = self.ctx.index.file(*id);
                visit_descendants(file.root_node(), |node| {
                    if !matches!(node.kind(), "import_specifier" | "export_specifier") {
                        return;
                    }
                    let (Some(original), Some(alias)) =
                        (node.child_by_field_name("name"), node.child_by_field_name("alias"))
                    else {
                        return;
                    };
                    if unquote(node_text(original, &file.text)) == name {
                        let alias = unquote(node_text(alias, &file.text)).to_string();
                        if names.insert(alias.clone()) {
                            pending.push(alias);
                        }
                    }
                });
            }
        }
        names
    }

    fn candidate_files(&self, names: &BTreeSet<String>) -> Vec<FileId> {
        let mut ids: Vec<FileId> = names
            .iter()
            .flat_map(|n| self.ctx.index.files_with_token(n).iter().copied())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort();
        ids
    }

    /// Barrel modules exposing `target` under a name, through
    /// `export { x as y } from` or a local `export { x as y }`.
    pub fn re_exports(&self, target: &Symbol<'a>) -> Vec<ReExport> {
        let keys = target.keys();
        let names = self.search_names(target);
        let mut out = Vec::new();
        for id in self.candidate_files(&names) {
            let file = self.ctx.index.file(id);
            if !file.is_user {
                continue;
            }
            for stmt in named_children(file.root_node()) {
                if stmt.kind() != "export_statement" {
                    continue;
                }
                let source = stmt.child_by_field_name("source");
                let Some(clause) = named_children(stmt).into_iter().find(|c| c.kind() == "export_clause") else {
                    continue;
                };
                for spec in named_children(clause) {
                    if spec.kind() != "export_specifier" {
                        continue;
                    }
                    let Some(name) = spec.child_by_field_name("name") else {
                        continue;
                    };
                    let alias = spec.child_by_field_name("alias");
                    if source.is_none() && alias.is_none() {
                        // Plain local export, not an indirection.
                        continue;
                    }
                    if !names.contains(unquote(node_text(name, &file.text))) {
                        continue;
                    }
                    let Some(symbol) = self.ctx.checker.export_specifier_symbol(file, spec) else {
                        continue;
                    };
                    let symbol = self.ctx.checker.resolve_symbol(symbol);
                    if !symbol.declarations.iter().any(|d| keys.contains(&d.key())) {
                        continue;
                    }
                    let exported_as = unquote(node_text(alias.unwrap_or(name), &file.text)).to_string();
                    let from = match source {
                        Some(source) => string_literal_value(source, &file.text),
                        None => symbol.first().file.rel_path.clone(),
                    };
                    out.push(ReExport {
                        exported_as,
                        file: file.rel_path.clone(),
                        from,
                    });
                }
            }
        }
        out.sort_by(|a, b| a.file.cmp(&b.file).then(a.exported_as.cmp(&b.exported_as)));
        out
    }

    /// Aggregated answer for the references query.
    pub fn summarize(&self, decl: &Decl<'a>, options: SearchOptions) -> ReferenceSummary {
        let target = self.ctx.checker.merged(*decl);
        let result = self.find(&target, options);

        let mut per_file: BTreeMap<&str, (BTreeSet<u32>, BTreeSet<UsageKind>, bool)> = BTreeMap::new();
        for site in &result.sites {
            let entry = per_file
                .entry(site.file.rel_path.as_str())
                .or_insert_with(|| (BTreeSet::new(), BTreeSet::new(), site.file.is_test));
            entry.0.insert(site.line);
            entry.1.insert(site.kind);
        }
        let files: Vec<FileReferences> = per_file
            .into_iter()
            .map(|(path, (lines, kinds, is_test))| FileReferences {
                file_path: path.to_string(),
                lines: lines.into_iter().collect(),
                usage_kinds: kinds.into_iter().collect(),
                is_test_file: is_test,
            })
            .collect();

        ReferenceSummary {
            symbol: self.ctx.symbol_ref(decl),
            total_count: result.sites.len(),
            file_count: files.len(),
            files,
            re_exports: self.re_exports(&target),
            partial: result.partial,
        }
    }
}

/// `import { a as b }` / `export { a as b }`: the alias token is reported
/// through the original name on the same specifier.
fn is_shadowed_alias_name(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    matches!(parent.kind(), "import_specifier" | "export_specifier")
        && parent.child_by_field_name("alias") == Some(node)
        && parent.child_by_field_name("name").is_some()
}

/// The `x` of a source-less `export { x }` / `export { x as y }`.
fn is_local_export_name(node: Node<'_>) -> bool {
    let Some(spec) = node.parent().filter(|p| p.kind() == "export_specifier") else {
        return false;
    };
    if spec.child_by_field_name("name") != Some(node) {
        return false;
    }
    find_ancestor(spec, |n| n.kind() == "export_statement")
        .is_some_and(|stmt| stmt.child_by_field_name("source").is_none())
}

/// Usage kind of one reference, by precedence import > call > type >
/// write > read.
pub fn classify(node: Node<'_>) -> UsageKind {
    if is_import_position(node) {
        return UsageKind::Import;
    }
    let expr = match node.parent() {
        Some(p) if p.kind() == "member_expression" && p.child_by_field_name("property") == Some(node) => p,
        _ => node,
    };
    let outer = outermost_wrapper(expr);
    if let Some(parent) = outer.parent() {
        let is_callee = match parent.kind() {
            "call_expression" => parent.child_by_field_name("function") == Some(outer),
            "new_expression" => parent.child_by_field_name("constructor") == Some(outer),
            _ => false,
        };
        if is_callee {
            return UsageKind::Call;
        }
    }
    if node.kind() == "type_identifier" || in_type_context(node) || in_heritage(node) {
        return UsageKind::Type;
    }
    if is_write_position(node, outer) {
        return UsageKind::Write;
    }
    UsageKind::Read
}

fn is_import_position(node: Node<'_>) -> bool {
    find_ancestor(node, |n| {
        matches!(
            n.kind(),
            "import_specifier" | "import_clause" | "namespace_import" | "import_require_clause" | "export_specifier"
        )
    })
    .is_some()
}

fn in_heritage(node: Node<'_>) -> bool {
    find_ancestor(node, |n| {
        matches!(n.kind(), "class_heritage" | "extends_clause" | "implements_clause")
    })
    .is_some()
}

fn is_write_position(node: Node<'_>, outer: Node<'_>) -> bool {
    let Some(parent) = outer.parent() else {
        return false;
    };
    match parent.kind() {
        "assignment_expression" | "augmented_assignment_expression" => {
            parent.child_by_field_name("left") == Some(outer)
        }
        "update_expression" => true,
        "variable_declarator" => parent.child_by_field_name("name") == Some(outer),
        _ => is_pattern_binding(node),
    }
}

/// A name a destructuring pattern binds or assigns. Default values and
/// computed keys inside the pattern are reads.
fn is_pattern_binding(node: Node<'_>) -> bool {
    let mut current = node;
    while let Some(parent) = current.parent() {
        let bound = match parent.kind() {
            "object_pattern" | "array_pattern" | "rest_pattern" => true,
            "shorthand_property_identifier_pattern" => true,
            "pair_pattern" => parent.child_by_field_name("value") == Some(current),
            "object_assignment_pattern" | "assignment_pattern" => {
                parent.child_by_field_name("left") == Some(current)
            }
            _ => false,
        };
        if !bound {
            return false;
        }
        if matches!(parent.kind(), "object_pattern" | "array_pattern") {
            return true;
        }
        current = parent;
    }
    false
}

fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TsParser;
    use std::path::Path;

    fn kind_of(source: &str, needle: &str, nth: usize) -> UsageKind {
        let tree = TsParser::new().parse(source, Path::new("a.ts")).unwrap();
        let mut found = Vec::new();
        visit_descendants(tree.root_node(), |n| {
            if is_identifier_kind(n.kind()) && node_text(n, source) == needle {
                found.push(n);
            }
        });
        classify(found[nth])
    }

    #[test]
    fn test_classify_precedence() {
        assert_eq!(kind_of("import { run } from './x';", "run", 0), UsageKind::Import);
        assert_eq!(kind_of("run(1);", "run", 0), UsageKind::Call);
        assert_eq!(kind_of("svc.run(1);", "run", 0), UsageKind::Call);
        assert_eq!(kind_of("(run as any)(1);", "run", 0), UsageKind::Call);
        assert_eq!(kind_of("new Repo();", "Repo", 0), UsageKind::Call);
        assert_eq!(kind_of("let r: Repo;", "Repo", 0), UsageKind::Type);
        assert_eq!(kind_of("class A extends Repo {}", "Repo", 0), UsageKind::Type);
        assert_eq!(kind_of("count = 2;", "count", 0), UsageKind::Write);
        assert_eq!(kind_of("count++;", "count", 0), UsageKind::Write);
        assert_eq!(kind_of("log(count);", "count", 0), UsageKind::Read);
    }

    #[test]
    fn test_pattern_defaults_are_reads() {
        assert_eq!(kind_of("const { v = fallback } = o;", "fallback", 0), UsageKind::Read);
        assert_eq!(kind_of("const { v = fallback } = o;", "v", 0), UsageKind::Write);
        assert_eq!(kind_of("const [a = seed] = xs;", "seed", 0), UsageKind::Read);
        assert_eq!(kind_of("const [a = seed] = xs;", "a", 0), UsageKind::Write);
        assert_eq!(kind_of("const { k: renamed } = o;", "renamed", 0), UsageKind::Write);
        assert_eq!(kind_of("const [...rest] = xs;", "rest", 0), UsageKind::Write);
        assert_eq!(kind_of("const total = count;", "count", 0), UsageKind::Read);
    }

    #[test]
    fn test_local_export_clause_name() {
        let source = "function a() {}\nexport { a };\nexport { a as b };\nexport { a } from './x';\n";
        let tree = TsParser::new().parse(source, Path::new("a.ts")).unwrap();
        let mut found = Vec::new();
        visit_descendants(tree.root_node(), |n| {
            if is_identifier_kind(n.kind()) && node_text(n, source) == "a" {
                found.push(n);
            }
        });
        let flags: Vec<bool> = found.iter().map(|n| is_local_export_name(*n)).collect();
        assert_eq!(flags, vec![false, true, true, false]);
    }
}
