use std::path::Path;
use tempfile::TempDir;
use tracescope_api::SymbolQuery;
use tracescope_core::TraceEngine;

/// A throwaway project on disk plus an engine with an empty cache.
pub struct TestProject {
    pub dir: TempDir,
    pub engine: TraceEngine,
}

impl TestProject {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

#[allow(dead_code)]
pub fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, text).unwrap();
}

/// Writes `files` (root-relative path, contents) under a fresh temp dir.
pub fn setup_project(files: &[(&str, &str)]) -> TestProject {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (rel, text) in files {
        write(dir.path(), rel, text);
    }
    TestProject {
        dir,
        engine: TraceEngine::new(),
    }
}

#[allow(dead_code)]
pub fn query(name: &str) -> SymbolQuery {
    SymbolQuery::named(name)
}

#[allow(dead_code)]
pub fn query_in(name: &str, file: &str) -> SymbolQuery {
    SymbolQuery::named(name).in_file(file)
}
