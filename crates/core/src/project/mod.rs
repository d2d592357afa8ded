pub mod cache;
pub mod index;
pub mod scanner;
pub mod tsconfig;

pub use cache::IndexCache;
pub use index::{AmbientModule, FileId, ProjectIndex, SourceFile};
pub use tsconfig::BuildConfig;

use std::path::Path;

/// Source extensions the engine indexes.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Checks if a path is a TypeScript or JavaScript source file.
pub fn is_relevant_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// `.d.ts`, `.d.mts` and `.d.cts` type stubs.
pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(".d.ts") || n.ends_with(".d.mts") || n.ends_with(".d.cts"))
        .unwrap_or(false)
}

/// True if any component of `path` below `root` is one of `vendor_dirs`.
/// Directories above the project root never count.
pub fn is_vendor_path(root: &Path, path: &Path, vendor_dirs: &[String]) -> bool {
    let inner = path.strip_prefix(root).unwrap_or(path);
    inner.components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|s| vendor_dirs.iter().any(|d| d == s))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_predicates() {
        assert!(is_relevant_path(Path::new("src/a.ts")));
        assert!(is_relevant_path(Path::new("src/a.mjs")));
        assert!(!is_relevant_path(Path::new("src/a.json")));
        assert!(is_declaration_file(Path::new("types/global.d.ts")));
        assert!(!is_declaration_file(Path::new("src/d.ts")));
        let vendor = vec!["node_modules".to_string()];
        let root = Path::new("/p");
        assert!(is_vendor_path(root, Path::new("/p/node_modules/x/index.d.ts"), &vendor));
        assert!(!is_vendor_path(root, Path::new("/p/src/index.ts"), &vendor));
        let nested = Path::new("/deps/node_modules/app");
        assert!(!is_vendor_path(nested, Path::new("/deps/node_modules/app/src/index.ts"), &vendor));
        assert!(is_vendor_path(nested, Path::new("/deps/node_modules/app/node_modules/x/a.ts"), &vendor));
    }
}
