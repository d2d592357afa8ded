use super::scanner::{ParsedFile, Scanner};
use super::tsconfig::{BuildConfig, select_build_config};
use super::{is_declaration_file, is_vendor_path};
use crate::config::{EngineConfig, TestFileMatcher};
use crate::error::{Result, TracescopeError};
use crate::parser::TsParser;
use crate::parser::utils::{is_identifier_kind, named_children, node_text, string_literal_value, visit_descendants};
use crate::resolve::ModuleResolver;
use crate::util::{normalize_path, relative_path};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tree_sitter::{Node, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One parsed file of the project or of a resolved dependency.
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    /// Root-relative, forward-slash path used in every output record.
    pub rel_path: String,
    pub text: String,
    pub tree: Tree,
    /// Project code: under the root, not vendored, not a type stub.
    pub is_user: bool,
    pub is_declaration_file: bool,
    /// Has top-level `import`/`export`; scripts contribute to the global scope.
    pub is_module: bool,
    pub is_test: bool,
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("id", &self.id)
            .field("rel_path", &self.rel_path)
            .field("is_user", &self.is_user)
            .field("is_test", &self.is_test)
            .finish_non_exhaustive()
    }
}

impl SourceFile {
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text_of(&self, node: Node<'_>) -> &str {
        node_text(node, &self.text)
    }
}

/// A `declare module "name" { ... }` block.
#[derive(Debug, Clone)]
pub struct AmbientModule {
    pub file: FileId,
    pub name: String,
    pub start_byte: usize,
}

/// Immutable snapshot of one project root: parsed files, resolved module
/// links and lookup tables. Queries never touch the file system.
pub struct ProjectIndex {
    pub root: PathBuf,
    pub config: EngineConfig,
    pub build_config: Option<BuildConfig>,
    files: Vec<SourceFile>,
    by_path: HashMap<PathBuf, FileId>,
    links: HashMap<(FileId, String), Vec<FileId>>,
    tokens: HashMap<String, Vec<FileId>>,
    ambient_modules: Vec<AmbientModule>,
    test_matcher: TestFileMatcher,
}

impl ProjectIndex {
    pub fn build(root: &Path, config: EngineConfig, parser: &TsParser) -> Result<Self> {
        let started = Instant::now();
        if !root.is_dir() {
            return Err(TracescopeError::NoProject(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        let root = normalize_path(root);
        let build_config = select_build_config(&root, None);
        if let Some(build) = &build_config {
            tracing::debug!("using build config {}", build.path.display());
        }

        let mut parsed = Scanner::scan_and_parse(&root, &config, build_config.as_ref(), parser);
        if parsed.is_empty() {
            return Err(TracescopeError::NoProject(format!(
                "no TypeScript or JavaScript files under {}",
                root.display()
            )));
        }

        let test_matcher = config.test_matcher();
        let mut index = ProjectIndex {
            root: root.clone(),
            config,
            build_config,
            files: Vec::with_capacity(parsed.len()),
            by_path: HashMap::new(),
            links: HashMap::new(),
            tokens: HashMap::new(),
            ambient_modules: Vec::new(),
            test_matcher,
        };

        // User files first, then type stubs; each group by path.
        parsed.sort_by(|a, b| {
            let a_stub = is_declaration_file(&a.path);
            let b_stub = is_declaration_file(&b.path);
            a_stub.cmp(&b_stub).then_with(|| a.path.cmp(&b.path))
        });
        for file in parsed {
            index.push(file);
        }
        let scanned = index.files.len();

        index.link(parser);
        index.build_tokens();
        index.collect_ambient_modules();

        tracing::info!(
            "indexed {} ({} project files, {} linked dependencies) in {:?}",
            root.display(),
            scanned,
            index.files.len() - scanned,
            started.elapsed()
        );
        Ok(index)
    }

    fn push(&mut self, parsed: ParsedFile) -> FileId {
        let id = FileId(self.files.len() as u32);
        let rel_path = relative_path(&self.root, &parsed.path);
        let is_declaration_file = is_declaration_file(&parsed.path);
        let is_user = parsed.path.starts_with(&self.root)
            && !is_vendor_path(&self.root, &parsed.path, &self.config.vendor_dirs)
            && !is_declaration_file;
        let is_module = named_children(parsed.tree.root_node())
            .iter()
            .any(|c| matches!(c.kind(), "import_statement" | "export_statement"));
        let is_test = self.test_matcher.is_test_file(&rel_path);
        self.by_path.insert(parsed.path.clone(), id);
        self.files.push(SourceFile {
            id,
            path: parsed.path,
            rel_path,
            text: parsed.text,
            tree: parsed.tree,
            is_user,
            is_declaration_file,
            is_module,
            is_test,
        });
        id
    }

    /// Resolves every module specifier of every file, loading dependency
    /// files that are not indexed yet (capped by `max_external_files`).
    fn link(&mut self, parser: &TsParser) {
        let resolver = ModuleResolver::new(&self.root, self.build_config.clone());
        let mut queue: VecDeque<FileId> = self.files.iter().map(|f| f.id).collect();
        let mut external = 0usize;
        while let Some(id) = queue.pop_front() {
            let (specifiers, from) = {
                let file = &self.files[id.index()];
                (module_specifiers(file.root_node(), &file.text), file.path.clone())
            };
            for specifier in specifiers {
                let key = (id, specifier);
                if self.links.contains_key(&key) {
                    continue;
                }
                let mut targets = Vec::new();
                for candidate in resolver.resolve(&key.1, &from) {
                    let target = match self.by_path.get(&candidate) {
                        Some(existing) => *existing,
                        None => {
                            if external >= self.config.max_external_files {
                                tracing::debug!(
                                    "external file cap reached, not loading {}",
                                    candidate.display()
                                );
                                continue;
                            }
                            let Some(parsed) = Scanner::parse_file(&candidate, parser) else {
                                continue;
                            };
                            external += 1;
                            let new_id = self.push(parsed);
                            queue.push_back(new_id);
                            new_id
                        }
                    };
                    if !targets.contains(&target) {
                        targets.push(target);
                    }
                }
                if targets.is_empty() {
                    tracing::debug!(
                        "unresolved module '{}' from {}",
                        key.1,
                        self.files[id.index()].rel_path
                    );
                }
                self.links.insert(key, targets);
            }
        }
    }

    fn build_tokens(&mut self) {
        let per_file: Vec<(FileId, HashSet<String>)> = self
            .files
            .par_iter()
            .map(|file| {
                let mut names = HashSet::new();
                visit_descendants(file.root_node(), |node| {
                    if is_identifier_kind(node.kind()) {
                        names.insert(file.text_of(node).to_string());
                    }
                });
                (file.id, names)
            })
            .collect();
        for (id, names) in per_file {
            for name in names {
                self.tokens.entry(name).or_default().push(id);
            }
        }
        for ids in self.tokens.values_mut() {
            ids.sort();
        }
    }

    fn collect_ambient_modules(&mut self) {
        for file in &self.files {
            for stmt in named_children(file.root_node()) {
                if stmt.kind() != "ambient_declaration" {
                    continue;
                }
                for child in named_children(stmt) {
                    if child.kind() != "module" {
                        continue;
                    }
                    if let Some(name) = child.child_by_field_name("name") {
                        if name.kind() == "string" {
                            self.ambient_modules.push(AmbientModule {
                                file: file.id,
                                name: string_literal_value(name, &file.text),
                                start_byte: child.start_byte(),
                            });
                        }
                    }
                }
            }
        }
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    pub fn user_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.is_user)
    }

    pub fn file_by_path(&self, path: &Path) -> Option<&SourceFile> {
        self.by_path.get(&normalize_path(path)).map(|id| self.file(*id))
    }

    /// Looks a file hint up as root-relative or absolute path.
    pub fn find_file(&self, hint: &str) -> Option<&SourceFile> {
        let trimmed = hint.trim_start_matches("./");
        let path = Path::new(trimmed);
        if path.is_absolute() {
            return self.file_by_path(path);
        }
        self.file_by_path(&self.root.join(path))
            .or_else(|| self.files.iter().find(|f| f.rel_path.ends_with(trimmed)))
    }

    /// Files a module specifier written in `from` resolved to, best first.
    pub fn linked(&self, from: FileId, specifier: &str) -> &[FileId] {
        self.links
            .get(&(from, specifier.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Files containing an identifier token spelled `name`.
    pub fn files_with_token(&self, name: &str) -> &[FileId] {
        self.tokens.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_ambient_modules(&self) -> &[AmbientModule] {
        &self.ambient_modules
    }

    /// The `module` node of an ambient module block.
    pub fn ambient_module_node(&self, module: &AmbientModule) -> Option<Node<'_>> {
        let file = self.file(module.file);
        file.root_node()
            .descendant_for_byte_range(module.start_byte, module.start_byte)
            .and_then(|mut n| {
                while !(n.is_named() && n.kind() == "module" && n.start_byte() == module.start_byte) {
                    n = n.parent()?;
                }
                Some(n)
            })
    }
}

/// Module specifiers a file depends on: imports, re-exports,
/// `import x = require()`, `require()` calls and dynamic `import()`.
pub fn module_specifiers(root: Node<'_>, source: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut add = |s: String| {
        if !s.is_empty() && !out.contains(&s) {
            out.push(s);
        }
    };
    for stmt in named_children(root) {
        match stmt.kind() {
            "import_statement" | "export_statement" => {
                if let Some(src) = stmt.child_by_field_name("source") {
                    add(string_literal_value(src, source));
                    continue;
                }
                for child in named_children(stmt) {
                    if child.kind() == "import_require_clause" {
                        if let Some(src) = child
                            .child_by_field_name("source")
                            .or_else(|| named_children(child).into_iter().find(|c| c.kind() == "string"))
                        {
                            add(string_literal_value(src, source));
                        }
                    }
                }
            }
            _ => {}
        }
    }
    visit_descendants(root, |node| {
        if node.kind() != "call_expression" {
            return;
        }
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let callee = node_text(function, source);
        if callee != "require" && callee != "import" {
            return;
        }
        if let Some(args) = node.child_by_field_name("arguments") {
            if let Some(first) = named_children(args).first() {
                if first.kind() == "string" {
                    add(string_literal_value(*first, source));
                }
            }
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_module_specifiers() {
        let source = "import { a } from './a';\nexport * from \"./b\";\nimport c = require('./c');\nconst d = require('d');\n";
        let tree = TsParser::new().parse(source, Path::new("x.ts")).unwrap();
        let specs = module_specifiers(tree.root_node(), source);
        assert_eq!(specs, vec!["./a", "./b", "./c", "d"]);
    }

    #[test]
    fn test_build_links_dependency_stubs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::write(root.join("src/main.ts"), "import { x } from 'lib';\nx();\n").unwrap();
        fs::write(root.join("node_modules/lib/package.json"), r#"{ "types": "index.d.ts" }"#).unwrap();
        fs::write(root.join("node_modules/lib/index.d.ts"), "export declare function x(): void;\n").unwrap();

        let index = ProjectIndex::build(root, EngineConfig::default(), &TsParser::new()).unwrap();
        let main = index.find_file("src/main.ts").unwrap();
        let linked = index.linked(main.id, "lib");
        assert_eq!(linked.len(), 1);
        let stub = index.file(linked[0]);
        assert!(stub.is_declaration_file);
        assert!(!stub.is_user);
        assert!(index.files_with_token("x").contains(&main.id));
    }

    #[test]
    fn test_empty_root_is_no_project() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProjectIndex::build(dir.path(), EngineConfig::default(), &TsParser::new());
        assert!(matches!(err, Err(TracescopeError::NoProject(_))));
    }
}
