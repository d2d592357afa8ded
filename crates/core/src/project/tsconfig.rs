use crate::error::{Result, TracescopeError};
use crate::util::normalize_path;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub const TSCONFIG_FILE_NAME: &str = "tsconfig.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectReference {
    path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    paths: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTsConfig {
    #[serde(default)]
    extends: Option<Extends>,
    #[serde(default)]
    compiler_options: Option<RawCompilerOptions>,
    #[serde(default)]
    include: Option<Vec<String>>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
    #[serde(default)]
    files: Option<Vec<String>>,
    #[serde(default)]
    references: Option<Vec<ProjectReference>>,
}

/// A loaded, `extends`-merged build configuration.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// The `tsconfig.json` file itself.
    pub path: PathBuf,
    pub dir: PathBuf,
    pub base_url: Option<PathBuf>,
    /// `paths` patterns in declaration order.
    pub paths: Vec<(String, Vec<String>)>,
    /// Directory `paths` targets are relative to.
    pub paths_base: PathBuf,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub files: Option<Vec<String>>,
    pub references: Vec<PathBuf>,
}

impl BuildConfig {
    /// Solution-style configs only delegate to referenced sub-projects.
    pub fn is_solution_style(&self) -> bool {
        if self.references.is_empty() {
            return false;
        }
        match (&self.files, &self.include) {
            (Some(files), None) => files.is_empty(),
            (None, None) => true,
            _ => false,
        }
    }

    /// True if `path` belongs to this project's file set.
    pub fn covers(&self, path: &Path) -> bool {
        let Ok(rel) = path.strip_prefix(&self.dir) else {
            return false;
        };
        if let Some(files) = &self.files {
            if files
                .iter()
                .any(|f| normalize_path(&self.dir.join(f)) == normalize_path(path))
            {
                return true;
            }
            if self.include.is_none() {
                return false;
            }
        }
        let include = self.include_set();
        let exclude = self.exclude_set();
        let matches_include = include.as_ref().map(|s| s.is_match(rel)).unwrap_or(true);
        let matches_exclude = exclude.as_ref().map(|s| s.is_match(rel)).unwrap_or(false);
        matches_include && !matches_exclude
    }

    /// True if `dir` lies inside this project's directory.
    pub fn contains_dir(&self, dir: &Path) -> bool {
        dir.starts_with(&self.dir)
    }

    pub fn include_set(&self) -> Option<GlobSet> {
        self.include.as_ref().map(|patterns| build_globset(patterns))
    }

    pub fn exclude_set(&self) -> Option<GlobSet> {
        self.exclude.as_ref().map(|patterns| build_globset(patterns))
    }
}

/// tsconfig-style patterns: a bare directory means everything below it.
fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');
        let has_glob = trimmed.contains(['*', '?', '[']);
        let looks_like_file = Path::new(trimmed).extension().is_some();
        let expanded = if has_glob || looks_like_file {
            vec![trimmed.to_string()]
        } else {
            vec![trimmed.to_string(), format!("{}/**/*", trimmed)]
        };
        for p in expanded {
            match Glob::new(&p) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => tracing::warn!("invalid tsconfig pattern '{}': {}", p, e),
            }
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Parses tsconfig text (JSON with comments and trailing commas).
fn parse_raw(text: &str, path: &Path) -> Result<RawTsConfig> {
    json5::from_str(text)
        .map_err(|e| TracescopeError::Config(format!("{}: {}", path.display(), e)))
}

pub fn load_build_config(path: &Path) -> Result<BuildConfig> {
    let mut visited = HashSet::new();
    load_inner(path, &mut visited)
}

fn load_inner(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<BuildConfig> {
    let path = normalize_path(path);
    if !visited.insert(path.clone()) {
        return Err(TracescopeError::Config(format!(
            "tsconfig extends cycle detected at {}",
            path.display()
        )));
    }
    let text = std::fs::read_to_string(&path)?;
    let raw = parse_raw(&text, &path)?;
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));

    let mut config = BuildConfig {
        path: path.clone(),
        dir: dir.clone(),
        base_url: None,
        paths: Vec::new(),
        paths_base: dir.clone(),
        include: None,
        exclude: None,
        files: None,
        references: Vec::new(),
    };

    let bases = match &raw.extends {
        Some(Extends::One(s)) => vec![s.clone()],
        Some(Extends::Many(v)) => v.clone(),
        None => Vec::new(),
    };
    for base in bases {
        match resolve_extends(&dir, &base) {
            Some(base_path) => match load_inner(&base_path, visited) {
                Ok(base_config) => merge_base(&mut config, base_config),
                Err(e) => tracing::warn!("ignoring tsconfig base {}: {}", base_path.display(), e),
            },
            None => tracing::debug!("tsconfig base '{}' not found from {}", base, dir.display()),
        }
    }

    if let Some(options) = raw.compiler_options {
        if let Some(base_url) = options.base_url {
            let base = normalize_path(&dir.join(base_url));
            config.paths_base = base.clone();
            config.base_url = Some(base);
        }
        if let Some(paths) = options.paths {
            config.paths = paths.into_iter().collect();
            if config.base_url.is_none() {
                config.paths_base = dir.clone();
            }
        }
    }
    if raw.include.is_some() {
        config.include = raw.include;
    }
    if raw.exclude.is_some() {
        config.exclude = raw.exclude;
    }
    if raw.files.is_some() {
        config.files = raw.files;
    }
    config.references = raw
        .references
        .unwrap_or_default()
        .into_iter()
        .map(|r| {
            let p = normalize_path(&dir.join(&r.path));
            if p.extension().is_some_and(|e| e == "json") {
                p
            } else {
                p.join(TSCONFIG_FILE_NAME)
            }
        })
        .collect();

    visited.remove(&path);
    Ok(config)
}

/// Inherited fields only; `references` never inherit.
fn merge_base(config: &mut BuildConfig, base: BuildConfig) {
    if config.base_url.is_none() {
        config.base_url = base.base_url;
        config.paths_base = base.paths_base;
    }
    if config.paths.is_empty() {
        config.paths = base.paths;
    }
    // include/exclude/files in a base are relative to the base's directory;
    // only carry them over when the base lives in the same directory.
    if base.dir == config.dir {
        config.include = config.include.take().or(base.include);
        config.exclude = config.exclude.take().or(base.exclude);
        config.files = config.files.take().or(base.files);
    }
}

fn resolve_extends(dir: &Path, spec: &str) -> Option<PathBuf> {
    let with_json = |p: PathBuf| -> PathBuf {
        if p.extension().is_some_and(|e| e == "json") {
            p
        } else {
            let mut s = p.into_os_string();
            s.push(".json");
            PathBuf::from(s)
        }
    };
    if spec.starts_with('.') || Path::new(spec).is_absolute() {
        let candidate = with_json(dir.join(spec));
        return candidate.is_file().then_some(candidate);
    }
    // Package-provided base config (`@tsconfig/node20/tsconfig.json`).
    let mut current = Some(dir);
    while let Some(d) = current {
        let base = d.join("node_modules").join(spec);
        let candidates = [with_json(base.clone()), base.join(TSCONFIG_FILE_NAME)];
        if let Some(found) = candidates.into_iter().find(|c| c.is_file()) {
            return Some(found);
        }
        current = d.parent();
    }
    None
}

/// Selects the nearest enclosing build configuration for `start_dir`.
///
/// Solution-style configs are only chosen through a referenced sub-project
/// that covers `target` (or `start_dir`); otherwise the walk continues to the
/// parent directory. A solution config is returned only as a last resort.
pub fn select_build_config(start_dir: &Path, target: Option<&Path>) -> Option<BuildConfig> {
    let mut fallback = None;
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join(TSCONFIG_FILE_NAME);
        if candidate.is_file() {
            match load_build_config(&candidate) {
                Ok(config) if config.is_solution_style() => {
                    if let Some(sub) = covering_reference(&config, start_dir, target) {
                        return Some(sub);
                    }
                    tracing::debug!(
                        "solution config {} does not cover target, trying parent",
                        candidate.display()
                    );
                    fallback.get_or_insert(config);
                }
                Ok(config) => return Some(config),
                Err(e) => tracing::warn!("skipping unreadable {}: {}", candidate.display(), e),
            }
        }
        current = dir.parent();
    }
    fallback
}

fn covering_reference(
    config: &BuildConfig,
    start_dir: &Path,
    target: Option<&Path>,
) -> Option<BuildConfig> {
    for reference in &config.references {
        let sub = match load_build_config(reference) {
            Ok(sub) => sub,
            Err(e) => {
                tracing::debug!("referenced config {} unusable: {}", reference.display(), e);
                continue;
            }
        };
        let covered = match target {
            Some(file) => sub.covers(file),
            None => sub.contains_dir(start_dir),
        };
        if covered {
            return Some(sub);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_jsonc_config_with_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(TSCONFIG_FILE_NAME),
            r#"{
                // comment
                "compilerOptions": {
                    "baseUrl": "./src",
                    "paths": { "@app/*": ["app/*"], },
                },
                "include": ["src"],
            }"#,
        )
        .unwrap();
        let config = load_build_config(&dir.path().join(TSCONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.paths.len(), 1);
        assert!(config.base_url.as_ref().unwrap().ends_with("src"));
        assert!(config.covers(&dir.path().join("src/app/a.ts")));
        assert!(!config.covers(&dir.path().join("scripts/a.ts")));
    }

    #[test]
    fn test_solution_config_prefers_covering_reference() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("packages/web/src")).unwrap();
        fs::write(
            root.join(TSCONFIG_FILE_NAME),
            r#"{ "files": [], "references": [{ "path": "./packages/web" }] }"#,
        )
        .unwrap();
        fs::write(
            root.join("packages/web").join(TSCONFIG_FILE_NAME),
            r#"{ "include": ["src"] }"#,
        )
        .unwrap();

        let target = root.join("packages/web/src/main.ts");
        let selected = select_build_config(root, Some(&target)).unwrap();
        assert_eq!(selected.dir, normalize_path(&root.join("packages/web")));

        let other = root.join("tools/x.ts");
        let fallback = select_build_config(root, Some(&other)).unwrap();
        assert!(fallback.is_solution_style());
    }

    #[test]
    fn test_extends_inherits_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("tsconfig.base.json"),
            r#"{ "compilerOptions": { "paths": { "@lib/*": ["lib/*"] } } }"#,
        )
        .unwrap();
        fs::write(
            root.join(TSCONFIG_FILE_NAME),
            r#"{ "extends": "./tsconfig.base" }"#,
        )
        .unwrap();
        let config = load_build_config(&root.join(TSCONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.paths[0].0, "@lib/*");
    }
}
