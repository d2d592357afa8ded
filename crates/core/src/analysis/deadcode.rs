//! Top-level declarations nothing in the project refers to.

use super::references::{ReferenceFinder, SearchOptions};
use super::{AnalysisContext, is_exported};
use crate::checker::make_decl;
use crate::error::{Result, TracescopeError};
use crate::parser::syntax::block_declarations;
use crate::util::Deadline;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracescope_api::{Confidence, DeadCodeItem, DeadCodeOptions, DeadCodeReport, DeadCodeSummary, SymbolKind};

/// Declaration kinds the scan considers at all.
const SCANNED_KINDS: &[SymbolKind] = &[
    SymbolKind::Function,
    SymbolKind::Class,
    SymbolKind::Interface,
    SymbolKind::TypeAlias,
    SymbolKind::Enum,
    SymbolKind::Variable,
];

/// How sure an unreferenced non-exported declaration is really unused.
/// Variables are often read reflectively or kept for side effects.
fn local_confidence(kind: SymbolKind) -> Confidence {
    match kind {
        SymbolKind::Function | SymbolKind::Class => Confidence::High,
        SymbolKind::Enum | SymbolKind::Interface | SymbolKind::TypeAlias => Confidence::Medium,
        _ => Confidence::Low,
    }
}

fn compile_globs(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| TracescopeError::InvalidArgument(format!("glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| TracescopeError::InvalidArgument(e.to_string()))?;
    Ok(Some(set))
}

pub struct DeadCodeDetector<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
}

impl<'c, 'a> DeadCodeDetector<'c, 'a> {
    pub fn new(ctx: &'c AnalysisContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn detect(&self, options: &DeadCodeOptions) -> Result<DeadCodeReport> {
        let config = &self.ctx.index.config;
        let include = compile_globs(&options.include)?;
        let exclude = compile_globs(&options.exclude)?;
        let max_results = options.max_results.unwrap_or(config.dead_code_max_results);
        let deadline = Deadline::new(Some(options.timeout_ms.unwrap_or(config.dead_code_timeout_ms)));
        let checker = &self.ctx.checker;
        let finder = ReferenceFinder::new(self.ctx);

        let mut items = Vec::new();
        let mut summary = DeadCodeSummary::default();
        'files: for file in self.ctx.index.user_files() {
            if file.is_test && !options.include_tests {
                continue;
            }
            if include.as_ref().is_some_and(|set| !set.is_match(&file.rel_path))
                || exclude.as_ref().is_some_and(|set| set.is_match(&file.rel_path))
            {
                continue;
            }
            if deadline.expired() {
                summary.timed_out = true;
                break;
            }
            summary.scanned_files += 1;

            for (node, name) in block_declarations(file.root_node()) {
                let Some(decl) = make_decl(file, node, name) else {
                    continue;
                };
                if !SCANNED_KINDS.contains(&decl.kind) {
                    continue;
                }
                let kind = decl.effective_kind();
                if !options.kinds.is_empty() && !options.kinds.contains(&kind) {
                    continue;
                }
                let exported = is_exported(&decl);
                if !exported && !options.inclusive {
                    continue;
                }
                // Merged declarations are judged once, at the first one.
                let merged = checker.merged(decl);
                if !merged.first().same_as(&decl) {
                    continue;
                }
                summary.scanned_declarations += 1;

                let search = finder.find(
                    &merged,
                    SearchOptions {
                        include_tests: true,
                        deadline,
                        first_only: true,
                        skip_local_exports: true,
                    },
                );
                if search.partial {
                    summary.timed_out = true;
                    break 'files;
                }
                if !search.sites.is_empty() {
                    continue;
                }
                let (confidence, reason) = if exported {
                    (Confidence::High, "exported but never referenced".to_string())
                } else {
                    (local_confidence(kind), "never referenced".to_string())
                };
                items.push(DeadCodeItem {
                    name: decl.name().to_string(),
                    kind,
                    file: file.rel_path.clone(),
                    line: decl.line(),
                    exported,
                    confidence,
                    reason,
                });
                if items.len() >= max_results {
                    summary.partial = true;
                    break 'files;
                }
            }
        }

        items.sort_by(|a, b| (a.file.as_str(), a.line).cmp(&(b.file.as_str(), b.line)));
        summary.partial |= summary.timed_out;
        summary.found = items.len();
        summary.elapsed_ms = deadline.elapsed_ms();
        tracing::info!(
            "dead code: {} found in {} files ({} declarations, {} ms)",
            summary.found,
            summary.scanned_files,
            summary.scanned_declarations,
            summary.elapsed_ms
        );
        Ok(DeadCodeReport { items, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_glob_is_rejected() {
        let err = compile_globs(&["src/[".to_string()]).unwrap_err();
        assert!(matches!(err, TracescopeError::InvalidArgument(_)));
        assert!(compile_globs(&[]).unwrap().is_none());
    }

    #[test]
    fn test_confidence_by_kind() {
        assert_eq!(local_confidence(SymbolKind::Function), Confidence::High);
        assert_eq!(local_confidence(SymbolKind::TypeAlias), Confidence::Medium);
        assert_eq!(local_confidence(SymbolKind::Variable), Confidence::Low);
    }
}
