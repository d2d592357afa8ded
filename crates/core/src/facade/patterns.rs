use super::TraceEngine;
use crate::analysis::callbacks::CallbackAnalyzer;
use crate::analysis::confusables::analyze_file;
use crate::analysis::guards::GuardAnalyzer;
use crate::error::TracescopeError;
use std::path::Path;
use tracescope_api::{
    ApiResult, CallbackAnalysis, ConfusableAnalysis, NarrowingAnalysis, PatternAnalyzer,
    SymbolQuery,
};

impl PatternAnalyzer for TraceEngine {
    fn narrowing(&self, root: &Path, query: &SymbolQuery) -> ApiResult<NarrowingAnalysis> {
        self.with_callable(root, query, |ctx, decl| Ok(GuardAnalyzer::new(ctx).analyze(&decl)))
    }

    fn callbacks(&self, root: &Path, query: &SymbolQuery) -> ApiResult<CallbackAnalysis> {
        self.with_callable(root, query, |ctx, decl| {
            Ok(CallbackAnalyzer::new(ctx).analyze(&decl))
        })
    }

    fn confusables(&self, root: &Path, file: &str) -> ApiResult<ConfusableAnalysis> {
        self.with_context(root, |ctx| {
            let source = ctx
                .index
                .find_file(file)
                .ok_or_else(|| TracescopeError::InvalidArgument(format!("file '{}' is not indexed", file)))?;
            Ok(analyze_file(source))
        })
    }
}
