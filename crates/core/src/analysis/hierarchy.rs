//! Supertypes, project-wide subtypes and generic parameters of a type.

use super::AnalysisContext;
use super::references::ReferenceFinder;
use crate::checker::{Decl, DeclKey, decl_of_node};
use crate::parser::syntax::is_abstract;
use crate::parser::utils::{named_children, node_text, visit_descendants};
use crate::util::Deadline;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};
use tracescope_api::{SymbolKind, SymbolRef, TypeHierarchy, TypeParameterInfo};
use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeritageEdge {
    Extends,
    Implements,
}

/// Heritage relations between declarations, child -> parent.
#[derive(Default)]
pub struct HeritageGraph<'a> {
    graph: DiGraph<Decl<'a>, HeritageEdge>,
    nodes: HashMap<DeclKey, NodeIndex>,
}

impl<'a> HeritageGraph<'a> {
    fn node(&mut self, decl: Decl<'a>) -> NodeIndex {
        if let Some(idx) = self.nodes.get(&decl.key()) {
            return *idx;
        }
        let idx = self.graph.add_node(decl);
        self.nodes.insert(decl.key(), idx);
        idx
    }

    pub fn add_edge(&mut self, child: Decl<'a>, parent: Decl<'a>, edge: HeritageEdge) {
        let c = self.node(child);
        let p = self.node(parent);
        if self.graph.find_edge(c, p).is_none() {
            self.graph.add_edge(c, p, edge);
        }
    }

    /// Direct children of `parent`, one level deep.
    pub fn subtypes_of(&self, parent: &DeclKey) -> Vec<Decl<'a>> {
        let Some(idx) = self.nodes.get(parent) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(*idx, Direction::Incoming)
            .map(|n| self.graph[n])
            .collect()
    }
}

pub struct HierarchyResolver<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
}

impl<'c, 'a> HierarchyResolver<'c, 'a> {
    pub fn new(ctx: &'c AnalysisContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn hierarchy(&self, decl: &Decl<'a>, deadline: Deadline) -> TypeHierarchy {
        let checker = &self.ctx.checker;
        let heritage = checker.heritage(decl);
        let extends = heritage
            .extends
            .as_ref()
            .map(|s| self.ctx.symbol_ref(s.first()));
        let mut implements: Vec<SymbolRef> = heritage
            .implements
            .iter()
            .map(|s| self.ctx.symbol_ref(s.first()))
            .collect();
        implements.dedup();

        let (graph, partial) = self.heritage_graph(decl, deadline);
        let target = checker.merged(*decl);
        let mut seen = BTreeSet::new();
        let mut subtypes: Vec<SymbolRef> = target
            .declarations
            .iter()
            .flat_map(|d| graph.subtypes_of(&d.key()))
            .filter(|d| d.is_user() && seen.insert(d.key()))
            .map(|d| self.ctx.symbol_ref(&d))
            .collect();
        subtypes.sort_by(|a, b| a.location_key().cmp(&b.location_key()));

        let abstract_class = decl.kind == SymbolKind::Class && is_abstract(decl.node);
        TypeHierarchy {
            symbol: self.ctx.symbol_ref(decl),
            kind: decl.kind,
            extends,
            implements,
            subtypes,
            is_abstract: abstract_class.then_some(true),
            type_parameters: type_parameters(decl),
            partial,
        }
    }

    /// Heritage graph over every class and interface that may name the
    /// target in its heritage (token-prefiltered).
    pub fn heritage_graph(&self, decl: &Decl<'a>, deadline: Deadline) -> (HeritageGraph<'a>, bool) {
        let checker = &self.ctx.checker;
        let target = checker.merged(*decl);
        let names = ReferenceFinder::new(self.ctx).search_names(&target);
        let ids: BTreeSet<_> = names
            .iter()
            .flat_map(|n| self.ctx.index.files_with_token(n).iter().copied())
            .collect();

        let mut graph = HeritageGraph::default();
        let mut partial = false;
        for id in ids {
            if deadline.expired() {
                tracing::debug!("subtype scan for '{}' timed out", decl.name());
                partial = true;
                break;
            }
            let file = self.ctx.index.file(id);
            if !file.is_user {
                continue;
            }
            let mut types: Vec<Node<'a>> = Vec::new();
            visit_descendants(file.root_node(), |n| {
                if matches!(
                    n.kind(),
                    "class_declaration" | "abstract_class_declaration" | "class" | "interface_declaration"
                ) {
                    types.push(n);
                }
            });
            for node in types {
                let Some(child) = decl_of_node(file, node) else {
                    continue;
                };
                let heritage = checker.heritage(&child);
                let kind = if child.kind == SymbolKind::Interface {
                    HeritageEdge::Extends
                } else {
                    HeritageEdge::Implements
                };
                if let Some(parent) = &heritage.extends {
                    for p in &parent.declarations {
                        graph.add_edge(child, *p, HeritageEdge::Extends);
                    }
                }
                for parent in &heritage.implements {
                    for p in &parent.declarations {
                        graph.add_edge(child, *p, kind);
                    }
                }
            }
        }
        (graph, partial)
    }
}

/// `<T extends Base = Default>` parameters with their source text.
fn type_parameters(decl: &Decl<'_>) -> Vec<TypeParameterInfo> {
    let Some(list) = decl.node.child_by_field_name("type_parameters") else {
        return Vec::new();
    };
    let text = &decl.file.text;
    named_children(list)
        .into_iter()
        .filter(|p| p.kind() == "type_parameter")
        .filter_map(|p| {
            let name = p.child_by_field_name("name")?;
            let inner = |field: &str| {
                p.child_by_field_name(field)
                    .and_then(|c| named_children(c).into_iter().next())
                    .map(|t| node_text(t, text).to_string())
            };
            Some(TypeParameterInfo {
                name: node_text(name, text).to_string(),
                constraint: inner("constraint"),
                default: inner("value"),
            })
        })
        .collect()
}
