use crate::error::ApiResult;
use crate::models::{
    CallHierarchy, CallHierarchyOptions, CallbackAnalysis, ConfusableAnalysis, DeadCodeOptions,
    DeadCodeReport, EnumInfo, HierarchyOptions, LocatedSymbol, NarrowingAnalysis,
    ReferenceOptions, ReferenceSummary, SymbolQuery, TypeFlow, TypeHierarchy,
};
use std::path::Path;

/// Symbol lookup: the entry point every other query starts from.
pub trait SymbolLocatorService {
    fn locate(&self, root: &Path, query: &SymbolQuery) -> ApiResult<LocatedSymbol>;
}

/// Structural questions about one located symbol.
pub trait StructureAnalyzer {
    fn call_hierarchy(
        &self,
        root: &Path,
        query: &SymbolQuery,
        options: &CallHierarchyOptions,
    ) -> ApiResult<CallHierarchy>;

    fn type_flow(&self, root: &Path, query: &SymbolQuery) -> ApiResult<TypeFlow>;

    fn references(
        &self,
        root: &Path,
        query: &SymbolQuery,
        options: &ReferenceOptions,
    ) -> ApiResult<ReferenceSummary>;

    fn type_hierarchy(
        &self,
        root: &Path,
        query: &SymbolQuery,
        options: &HierarchyOptions,
    ) -> ApiResult<TypeHierarchy>;

    fn enum_members(&self, root: &Path, query: &SymbolQuery) -> ApiResult<EnumInfo>;
}

/// AST pattern classifiers.
pub trait PatternAnalyzer {
    fn narrowing(&self, root: &Path, query: &SymbolQuery) -> ApiResult<NarrowingAnalysis>;

    fn callbacks(&self, root: &Path, query: &SymbolQuery) -> ApiResult<CallbackAnalysis>;

    fn confusables(&self, root: &Path, file: &str) -> ApiResult<ConfusableAnalysis>;
}

/// Whole-project scans.
pub trait ProjectScanner {
    fn dead_code(&self, root: &Path, options: &DeadCodeOptions) -> ApiResult<DeadCodeReport>;
}

/// Cache control for callers that need a fresh trace.
pub trait IndexLifecycle {
    /// Drops the cached index for `root`; the next query rebuilds it.
    fn invalidate(&self, root: &Path);

    fn clear(&self);
}
