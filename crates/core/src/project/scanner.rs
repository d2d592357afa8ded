use super::tsconfig::BuildConfig;
use super::{is_relevant_path, is_vendor_path};
use crate::config::EngineConfig;
use crate::parser::TsParser;
use crate::util::normalize_path;
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::Tree;

/// A file read from disk and parsed, not yet assigned an index id.
pub struct ParsedFile {
    pub path: PathBuf,
    pub text: String,
    pub tree: Tree,
}

pub struct Scanner;

impl Scanner {
    /// Walks `root` (honoring `.gitignore`) and parses every source file in
    /// the project's file set in parallel.
    pub fn scan_and_parse(
        root: &Path,
        config: &EngineConfig,
        build: Option<&BuildConfig>,
        parser: &TsParser,
    ) -> Vec<ParsedFile> {
        let paths = Self::collect_paths(root, config, build);
        tracing::debug!("scanner found {} candidate files under {}", paths.len(), root.display());
        Self::parse_all(&paths, parser)
    }

    pub fn parse_all(paths: &[PathBuf], parser: &TsParser) -> Vec<ParsedFile> {
        paths
            .par_iter()
            .filter_map(|path| Self::parse_file(path, parser))
            .collect()
    }

    /// Reads and parses one file. Unreadable or non-UTF-8 files are skipped.
    pub fn parse_file(path: &Path, parser: &TsParser) -> Option<ParsedFile> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("failed to read {}: {}", path.display(), e);
                return None;
            }
        };
        let text = String::from_utf8(bytes).ok()?;
        match parser.parse(&text, path) {
            Ok(tree) => Some(ParsedFile {
                path: normalize_path(path),
                text,
                tree,
            }),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }

    pub(crate) fn collect_paths(
        root: &Path,
        config: &EngineConfig,
        build: Option<&BuildConfig>,
    ) -> Vec<PathBuf> {
        let vendor_dirs = config.vendor_dirs.clone();
        // Solution-style configs carry no file set of their own.
        let file_set = build.filter(|b| !b.is_solution_style());
        let mut paths: Vec<PathBuf> = WalkBuilder::new(root)
            .filter_entry(move |entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| !vendor_dirs.iter().any(|d| d == name))
                    .unwrap_or(true)
            })
            .build()
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let path = entry.path();
                if !path.is_file() || !is_relevant_path(path) {
                    return None;
                }
                if is_vendor_path(root, path, &config.vendor_dirs) {
                    return None;
                }
                let path = normalize_path(path);
                if let Some(build) = file_set {
                    if path.starts_with(&build.dir) && !build.covers(&path) {
                        return None;
                    }
                }
                Some(path)
            })
            .collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_paths_skips_vendor_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("src/a.ts"), "export const a = 1;").unwrap();
        fs::write(root.join("src/b.json"), "{}").unwrap();
        fs::write(root.join("node_modules/pkg/index.d.ts"), "export {}").unwrap();

        let paths = Scanner::collect_paths(root, &EngineConfig::default(), None);
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("src/a.ts"));
    }
}
