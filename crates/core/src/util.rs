use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

/// Lexically normalizes a path (`.` and `..` folded) without touching the
/// file system. Relative inputs are joined onto the current directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(path)
    };
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Cache key for a project root: canonical when the path exists.
pub fn root_key(root: &Path) -> PathBuf {
    std::fs::canonicalize(root).unwrap_or_else(|_| normalize_path(root))
}

/// Root-relative, forward-slash rendering of `path`. Paths outside the root
/// are rendered absolute (still with forward slashes).
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::RootDir => Some(String::new()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

/// Wall-clock budget polled between per-file work units.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    pub fn new(timeout_ms: Option<u64>) -> Self {
        Self {
            start: Instant::now(),
            budget: timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn expired(&self) -> bool {
        self.budget
            .map(|b| self.start.elapsed() >= b)
            .unwrap_or(false)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/work/project");
        let file = Path::new("/work/project/src/lib/user.ts");
        assert_eq!(relative_path(root, file), "src/lib/user.ts");
    }

    #[test]
    fn test_normalize_path_folds_parent_components() {
        let path = Path::new("/a/b/../c/./d.ts");
        assert_eq!(normalize_path(path), PathBuf::from("/a/c/d.ts"));
    }

    #[test]
    fn test_deadline_zero_budget_expires() {
        assert!(Deadline::new(Some(0)).expired());
        assert!(!Deadline::unbounded().expired());
    }
}
