use super::TraceEngine;
use crate::analysis::is_exported;
use crate::parser::syntax::modifiers;
use std::path::Path;
use tracescope_api::{ApiResult, LocatedSymbol, SymbolLocatorService, SymbolQuery};

impl SymbolLocatorService for TraceEngine {
    fn locate(&self, root: &Path, query: &SymbolQuery) -> ApiResult<LocatedSymbol> {
        self.with_located(root, query, |ctx, decl| {
            let merged = ctx
                .checker
                .merged(decl)
                .declarations
                .iter()
                .filter(|d| !d.same_as(&decl))
                .map(|d| ctx.symbol_ref(d))
                .collect();
            Ok(LocatedSymbol {
                symbol: ctx.symbol_ref(&decl),
                kind: decl.effective_kind(),
                exported: is_exported(&decl),
                modifiers: modifiers(decl.node, &decl.file.text),
                merged,
            })
        })
    }
}
