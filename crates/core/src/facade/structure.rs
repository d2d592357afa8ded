use super::TraceEngine;
use crate::analysis::callgraph::CallGraphResolver;
use crate::analysis::enums::EnumInspector;
use crate::analysis::hierarchy::HierarchyResolver;
use crate::analysis::typeflow::TypeFlowResolver;
use crate::analysis::{ReferenceFinder, SearchOptions};
use crate::error::TracescopeError;
use crate::util::Deadline;
use std::path::Path;
use tracescope_api::{
    ApiResult, CallHierarchy, CallHierarchyOptions, EnumInfo, HierarchyOptions, ReferenceOptions,
    ReferenceSummary, StructureAnalyzer, SymbolKind, SymbolQuery, TypeFlow, TypeHierarchy,
};

impl StructureAnalyzer for TraceEngine {
    fn call_hierarchy(
        &self,
        root: &Path,
        query: &SymbolQuery,
        options: &CallHierarchyOptions,
    ) -> ApiResult<CallHierarchy> {
        self.with_callable(root, query, |ctx, decl| {
            Ok(CallGraphResolver::new(ctx).hierarchy(&decl, options))
        })
    }

    fn type_flow(&self, root: &Path, query: &SymbolQuery) -> ApiResult<TypeFlow> {
        self.with_callable(root, query, |ctx, decl| {
            Ok(TypeFlowResolver::new(ctx).type_flow(&decl))
        })
    }

    fn references(
        &self,
        root: &Path,
        query: &SymbolQuery,
        options: &ReferenceOptions,
    ) -> ApiResult<ReferenceSummary> {
        self.with_located(root, query, |ctx, decl| {
            let timeout = options.timeout_ms.unwrap_or(ctx.index.config.reference_timeout_ms);
            let search = SearchOptions {
                include_tests: options.include_tests,
                deadline: Deadline::new(Some(timeout)),
                first_only: false,
                skip_local_exports: false,
            };
            Ok(ReferenceFinder::new(ctx).summarize(&decl, search))
        })
    }

    fn type_hierarchy(
        &self,
        root: &Path,
        query: &SymbolQuery,
        options: &HierarchyOptions,
    ) -> ApiResult<TypeHierarchy> {
        self.with_located(root, query, |ctx, decl| {
            if !matches!(decl.kind, SymbolKind::Class | SymbolKind::Interface) {
                return Err(TracescopeError::InvalidArgument(format!(
                    "'{}' is a {}, not a class or interface",
                    decl.name(),
                    decl.kind
                )));
            }
            let timeout = options.timeout_ms.unwrap_or(ctx.index.config.hierarchy_timeout_ms);
            Ok(HierarchyResolver::new(ctx).hierarchy(&decl, Deadline::new(Some(timeout))))
        })
    }

    fn enum_members(&self, root: &Path, query: &SymbolQuery) -> ApiResult<EnumInfo> {
        self.with_located(root, query, |ctx, decl| EnumInspector::new(ctx).inspect(&decl))
    }
}
