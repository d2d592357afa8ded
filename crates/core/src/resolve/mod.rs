//! File-system module resolution following the TypeScript/Node rules.

pub mod package;

use crate::project::tsconfig::BuildConfig;
use crate::project::{is_relevant_path, is_vendor_path};
use crate::util::normalize_path;
use globset::{Glob, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Extensions probed for an extensionless specifier, in priority order.
const PROBE_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".d.ts", ".mts", ".d.mts", ".cts", ".d.cts", ".js", ".jsx", ".mjs", ".cjs",
];

/// Resolves import specifiers to candidate files.
pub struct ModuleResolver {
    root: PathBuf,
    build: Option<BuildConfig>,
    /// Workspace packages of the root `package.json`, as (name, directory).
    workspaces: Vec<(String, PathBuf)>,
}

impl ModuleResolver {
    pub fn new(root: &Path, build: Option<BuildConfig>) -> Self {
        let workspaces = discover_workspaces(root);
        if !workspaces.is_empty() {
            tracing::debug!("found {} workspace packages", workspaces.len());
        }
        Self {
            root: root.to_path_buf(),
            build,
            workspaces,
        }
    }

    /// Candidate files for `specifier` imported from `from_file`, best first.
    /// Empty when nothing on disk matches.
    pub fn resolve(&self, specifier: &str, from_file: &Path) -> Vec<PathBuf> {
        let base_dir = from_file.parent().unwrap_or(&self.root);

        if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".." {
            return resolve_path(&base_dir.join(specifier)).into_iter().collect();
        }
        if Path::new(specifier).is_absolute() {
            return resolve_path(Path::new(specifier)).into_iter().collect();
        }

        let mapped = self.resolve_mapped(specifier);
        if !mapped.is_empty() {
            return mapped;
        }

        let (package, subpath) = package::split_bare_specifier(specifier);
        if let Some((_, dir)) = self.workspaces.iter().find(|(name, _)| name == package) {
            let found = resolve_package(dir, subpath);
            if !found.is_empty() {
                return found;
            }
        }
        self.resolve_node_modules(package, subpath, base_dir)
    }

    /// tsconfig `paths` patterns, then `baseUrl`.
    fn resolve_mapped(&self, specifier: &str) -> Vec<PathBuf> {
        let Some(build) = &self.build else {
            return Vec::new();
        };
        let mut matches: Vec<(usize, &Vec<String>, String)> = build
            .paths
            .iter()
            .filter_map(|(pattern, targets)| {
                match pattern.split_once('*') {
                    Some((prefix, suffix)) => specifier
                        .strip_prefix(prefix)
                        .and_then(|rest| rest.strip_suffix(suffix))
                        .map(|captured| (prefix.len(), targets, captured.to_string())),
                    None => (pattern == specifier).then(|| (usize::MAX, targets, String::new())),
                }
            })
            .collect();
        // Exact patterns first, then the longest prefix.
        matches.sort_by(|a, b| b.0.cmp(&a.0));

        let mut out = Vec::new();
        for (_, targets, captured) in matches {
            for target in targets {
                let substituted = target.replace('*', &captured);
                if let Some(found) = resolve_path(&build.paths_base.join(substituted)) {
                    if !out.contains(&found) {
                        out.push(found);
                    }
                }
            }
            if !out.is_empty() {
                return out;
            }
        }
        if let Some(base_url) = &build.base_url {
            if let Some(found) = resolve_path(&base_url.join(specifier)) {
                out.push(found);
            }
        }
        out
    }

    fn resolve_node_modules(&self, package: &str, subpath: Option<&str>, from_dir: &Path) -> Vec<PathBuf> {
        let mut current = Some(from_dir);
        while let Some(dir) = current {
            let node_modules = dir.join("node_modules");
            if node_modules.is_dir() {
                let package_dir = node_modules.join(package);
                if package_dir.is_dir() {
                    let found = resolve_package(&package_dir, subpath);
                    if !found.is_empty() {
                        return found;
                    }
                }
                let types_dir = node_modules
                    .join("@types")
                    .join(package::types_package_name(package));
                if types_dir.is_dir() {
                    let found = resolve_package(&types_dir, subpath);
                    if !found.is_empty() {
                        return found;
                    }
                }
            }
            current = dir.parent();
        }
        Vec::new()
    }
}

/// Entry files of a package directory for an optional subpath: `exports`
/// conditions first, then plain subpath probing or `types`/`typings`/`main`
/// and `index.*`.
pub fn resolve_package(package_dir: &Path, subpath: Option<&str>) -> Vec<PathBuf> {
    let manifest = package::read_manifest(package_dir);
    let mut out: Vec<PathBuf> = Vec::new();
    let push = |p: Option<PathBuf>, out: &mut Vec<PathBuf>| {
        if let Some(p) = p {
            if !out.contains(&p) {
                out.push(p);
            }
        }
    };

    if let Some(exports) = manifest.as_ref().and_then(|m| m.get("exports")) {
        let key = match subpath {
            Some(sub) => format!("./{}", sub),
            None => ".".to_string(),
        };
        for target in package::export_targets(exports, &key) {
            push(resolve_path(&package_dir.join(&target)), &mut out);
        }
        if !out.is_empty() {
            return out;
        }
    }

    match subpath {
        Some(sub) => push(resolve_path(&package_dir.join(sub)), &mut out),
        None => {
            if let Some(manifest) = &manifest {
                for entry in package::entry_points(manifest) {
                    push(resolve_file(&package_dir.join(&entry)), &mut out);
                }
            }
            if out.is_empty() {
                push(resolve_index(package_dir), &mut out);
            }
        }
    }
    out
}

/// A file or directory path as written in an import.
pub fn resolve_path(path: &Path) -> Option<PathBuf> {
    let path = normalize_path(path);
    if let Some(found) = resolve_file(&path) {
        return Some(found);
    }
    if path.is_dir() {
        if let Some(manifest) = package::read_manifest(&path) {
            for entry in package::entry_points(&manifest) {
                if let Some(found) = resolve_file(&path.join(&entry)) {
                    return Some(found);
                }
            }
        }
        return resolve_index(&path);
    }
    None
}

/// Exact file, `.js`-family remapped to its TypeScript source, or the
/// path with a probed extension appended.
fn resolve_file(path: &Path) -> Option<PathBuf> {
    let path = normalize_path(path);
    let text = path.to_string_lossy().into_owned();
    let remaps: &[(&str, &[&str])] = &[
        (".js", &[".ts", ".tsx", ".d.ts"]),
        (".jsx", &[".tsx"]),
        (".mjs", &[".mts", ".d.mts"]),
        (".cjs", &[".cts", ".d.cts"]),
    ];
    for (js_ext, ts_exts) in remaps {
        if let Some(stem) = text.strip_suffix(js_ext) {
            for ts_ext in *ts_exts {
                let candidate = PathBuf::from(format!("{}{}", stem, ts_ext));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
    }
    if path.is_file() && is_relevant_path(&path) {
        return Some(path);
    }
    PROBE_EXTENSIONS
        .iter()
        .map(|ext| PathBuf::from(format!("{}{}", text, ext)))
        .find(|candidate| candidate.is_file())
}

fn resolve_index(dir: &Path) -> Option<PathBuf> {
    PROBE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("index{}", ext)))
        .find(|candidate| candidate.is_file())
}

/// Packages named by the root `package.json` `workspaces` globs.
fn discover_workspaces(root: &Path) -> Vec<(String, PathBuf)> {
    let Some(manifest) = package::read_manifest(root) else {
        return Vec::new();
    };
    let patterns = package::workspace_patterns(&manifest);
    if patterns.is_empty() {
        return Vec::new();
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in &patterns {
        match Glob::new(pattern.trim_start_matches("./").trim_end_matches('/')) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!("invalid workspace pattern '{}': {}", pattern, e),
        }
    }
    let Ok(set) = builder.build() else {
        return Vec::new();
    };
    let vendor = vec!["node_modules".to_string()];
    let mut out = Vec::new();
    for entry in WalkBuilder::new(root).max_depth(Some(4)).build().flatten() {
        let path = entry.path();
        if path.file_name().and_then(|n| n.to_str()) != Some("package.json") {
            continue;
        }
        let Some(dir) = path.parent() else { continue };
        if dir == root || is_vendor_path(root, dir, &vendor) {
            continue;
        }
        let Ok(rel) = dir.strip_prefix(root) else { continue };
        if !set.is_match(rel) {
            continue;
        }
        if let Some(name) = package::read_manifest(dir)
            .as_ref()
            .and_then(|m| package::package_name(m).map(str::to_string))
        {
            out.push((name, normalize_path(dir)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_relative_js_specifier_maps_to_ts_source() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/a.ts", "");
        write(root, "src/lib/index.ts", "");
        let resolver = ModuleResolver::new(root, None);
        let from = root.join("src/main.ts");
        assert_eq!(resolver.resolve("./a.js", &from), vec![root.join("src/a.ts")]);
        assert_eq!(resolver.resolve("./lib", &from), vec![root.join("src/lib/index.ts")]);
        assert!(resolver.resolve("./missing", &from).is_empty());
    }

    #[test]
    fn test_node_modules_scoped_and_types_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "node_modules/@acme/ui/package.json", r#"{ "exports": { ".": { "types": "./dist/index.d.ts" } } }"#);
        write(root, "node_modules/@acme/ui/dist/index.d.ts", "");
        write(root, "node_modules/@types/left-pad/index.d.ts", "");
        let resolver = ModuleResolver::new(root, None);
        let from = root.join("src/main.ts");
        assert_eq!(
            resolver.resolve("@acme/ui", &from),
            vec![root.join("node_modules/@acme/ui/dist/index.d.ts")]
        );
        assert_eq!(
            resolver.resolve("left-pad", &from),
            vec![root.join("node_modules/@types/left-pad/index.d.ts")]
        );
    }

    #[test]
    fn test_workspace_package_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "package.json", r#"{ "workspaces": ["packages/*"] }"#);
        write(root, "packages/core/package.json", r#"{ "name": "@repo/core", "types": "src/index.ts" }"#);
        write(root, "packages/core/src/index.ts", "");
        let resolver = ModuleResolver::new(root, None);
        let from = root.join("apps/web/main.ts");
        assert_eq!(
            resolver.resolve("@repo/core", &from),
            vec![normalize_path(&root.join("packages/core/src/index.ts"))]
        );
    }
}
