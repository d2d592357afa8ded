//! Resolvers and analyzers answering one question about a located symbol.
//!
//! Every analyzer borrows an [`AnalysisContext`] (index + checker) for the
//! duration of a single query and keeps no state across queries.

pub mod callbacks;
pub mod callgraph;
pub mod confusables;
pub mod deadcode;
pub mod enums;
pub mod guards;
pub mod hierarchy;
pub mod locator;
pub mod references;
pub mod typeflow;

use crate::checker::{Decl, SyntacticChecker};
use crate::parser::syntax::{function_node, has_export_modifier, is_abstract, local_export_names};
use crate::project::ProjectIndex;
use tracescope_api::{SymbolKind, SymbolRef};

pub use locator::SymbolLocator;
pub use references::{ReferenceFinder, ReferenceSite, SearchOptions};

/// Borrowed view of one project snapshot shared by the analyzers.
pub struct AnalysisContext<'a> {
    pub index: &'a ProjectIndex,
    pub checker: SyntacticChecker<'a>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(index: &'a ProjectIndex) -> Self {
        Self {
            index,
            checker: SyntacticChecker::new(index),
        }
    }

    /// Output pointer for `decl`; abstract classes carry `isAbstract`.
    pub fn symbol_ref(&self, decl: &Decl<'_>) -> SymbolRef {
        let reference = SymbolRef::new(decl.display_name(), decl.file.rel_path.clone(), decl.line());
        if decl.kind == SymbolKind::Class {
            reference.with_abstract(is_abstract(decl.node))
        } else {
            reference
        }
    }
}

/// Exported through a modifier or an `export { name }` clause of its module.
pub fn is_exported(decl: &Decl<'_>) -> bool {
    if has_export_modifier(decl.node) {
        return true;
    }
    let is_top_level = decl
        .node
        .parent()
        .map(|p| match p.kind() {
            "program" => true,
            "lexical_declaration" | "variable_declaration" => {
                p.parent().map(|g| g.kind() == "program").unwrap_or(false)
            }
            _ => false,
        })
        .unwrap_or(false);
    is_top_level && local_export_names(decl.file.root_node(), &decl.file.text).contains(decl.name())
}

/// The declaration of a merged symbol carrying a body, else the first one.
/// Overload signatures precede their implementation.
pub fn implementation<'a>(declarations: &[Decl<'a>]) -> Option<Decl<'a>> {
    declarations
        .iter()
        .find(|d| {
            function_node(d.node)
                .and_then(|f| f.child_by_field_name("body"))
                .is_some()
        })
        .or_else(|| declarations.first())
        .copied()
}
