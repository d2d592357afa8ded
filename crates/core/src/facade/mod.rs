use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;

use crate::analysis::{AnalysisContext, SymbolLocator, implementation};
use crate::checker::Decl;
use crate::config::EngineConfig;
use crate::error::{Result, TracescopeError};
use crate::project::{IndexCache, ProjectIndex};
use tracescope_api::{ApiResult, SymbolQuery, TraceAnalyzer};

mod lifecycle;
mod locate;
mod patterns;
mod scan;
mod structure;

/// Engine handle - unified synchronous interface for all hosts.
///
/// Every query builds (or reuses) the cached [`ProjectIndex`] for its root
/// and runs to completion against that snapshot. Cloning shares the cache.
#[derive(Clone, Default)]
pub struct TraceEngine {
    pub(crate) cache: Arc<IndexCache>,
    /// Replaces the per-root `.tracescope.json` when set.
    pub(crate) config: Option<EngineConfig>,
}

impl TraceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            cache: Arc::new(IndexCache::new()),
            config: Some(config),
        }
    }

    /// Index for `root`, built on first use.
    pub fn index(&self, root: &Path) -> Result<Arc<ProjectIndex>> {
        self.cache.get_or_build(root, self.config.as_ref())
    }

    /// Runs `f` against a fresh analysis context for `root`. Panics while
    /// indexing or inside an analyzer surface as internal errors.
    pub(crate) fn with_context<T>(
        &self,
        root: &Path,
        f: impl for<'a> FnOnce(&AnalysisContext<'a>) -> Result<T>,
    ) -> ApiResult<T> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let index = self.index(root)?;
            let ctx = AnalysisContext::new(&index);
            f(&ctx)
        }));
        match outcome {
            Ok(result) => result.map_err(Into::into),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!("query on {} failed: {}", root.display(), message);
                Err(TracescopeError::Internal(message).into())
            }
        }
    }

    /// Locates the query's declaration and runs `f` on it.
    pub(crate) fn with_located<T>(
        &self,
        root: &Path,
        query: &SymbolQuery,
        f: impl for<'a> FnOnce(&AnalysisContext<'a>, Decl<'a>) -> Result<T>,
    ) -> ApiResult<T> {
        self.with_context(root, |ctx| {
            let decl = SymbolLocator::new(ctx).locate(query)?;
            tracing::debug!("located '{}' at {}:{}", query.name, decl.file.rel_path, decl.line());
            f(ctx, decl)
        })
    }

    /// Like [`Self::with_located`], but overloads collapse onto the
    /// signature carrying the body.
    pub(crate) fn with_callable<T>(
        &self,
        root: &Path,
        query: &SymbolQuery,
        f: impl for<'a> FnOnce(&AnalysisContext<'a>, Decl<'a>) -> Result<T>,
    ) -> ApiResult<T> {
        self.with_located(root, query, |ctx, decl| {
            let merged = ctx.checker.merged(decl);
            let target = implementation(&merged.declarations).unwrap_or(decl);
            f(ctx, target)
        })
    }
}

impl TraceAnalyzer for TraceEngine {}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "analysis panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracescope_api::ApiError;

    #[test]
    fn test_panicking_query_becomes_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export const a = 1;\n").unwrap();
        let engine = TraceEngine::new();

        let result: ApiResult<()> = engine.with_context(dir.path(), |_| panic!("boom"));

        match result {
            Err(ApiError::Internal(message)) => assert!(message.contains("boom"), "{message}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_index_errors_pass_through_the_guard() {
        let dir = tempfile::tempdir().unwrap();
        let engine = TraceEngine::new();

        let result: ApiResult<()> = engine.with_context(dir.path(), |_| Ok(()));

        assert!(matches!(result, Err(ApiError::NoProject(_))));
    }

    #[test]
    fn test_panic_message_falls_back_for_opaque_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "analysis panicked");
    }
}
