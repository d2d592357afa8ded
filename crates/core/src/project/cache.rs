use super::index::ProjectIndex;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::parser::TsParser;
use crate::util::root_key;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Process-wide table of built project indexes, keyed by normalized root.
///
/// Entries are never refreshed behind the caller's back: a query that must
/// see new files calls [`IndexCache::invalidate`] first.
#[derive(Default)]
pub struct IndexCache {
    entries: DashMap<PathBuf, Arc<ProjectIndex>>,
    parser: TsParser,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached index for `root`, building it on first use.
    /// `overrides` replaces the per-root `.tracescope.json` when given.
    pub fn get_or_build(
        &self,
        root: &Path,
        overrides: Option<&EngineConfig>,
    ) -> Result<Arc<ProjectIndex>> {
        let key = root_key(root);
        if let Some(existing) = self.entries.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }
        let config = match overrides {
            Some(config) => config.clone(),
            None => EngineConfig::load(&key)?,
        };
        let index = Arc::new(ProjectIndex::build(&key, config, &self.parser)?);
        // Two concurrent builders race benignly: the first insert wins.
        let entry = self.entries.entry(key).or_insert(index);
        Ok(Arc::clone(entry.value()))
    }

    pub fn invalidate(&self, root: &Path) -> bool {
        let removed = self.entries.remove(&root_key(root)).is_some();
        if removed {
            tracing::debug!("invalidated index for {}", root.display());
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_reuses_and_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export const a = 1;\n").unwrap();
        let cache = IndexCache::new();
        let first = cache.get_or_build(dir.path(), None).unwrap();
        let second = cache.get_or_build(dir.path(), None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        std::fs::write(dir.path().join("b.ts"), "export const b = 2;\n").unwrap();
        assert!(cache.invalidate(dir.path()));
        let third = cache.get_or_build(dir.path(), None).unwrap();
        assert_eq!(third.files().len(), 2);
        assert!(!Arc::ptr_eq(&first, &third));
    }
}
