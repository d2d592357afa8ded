//! Outgoing and incoming call trees with cycle and depth-limit marking.

use super::references::{ReferenceFinder, SearchOptions};
use super::{AnalysisContext, implementation};
use crate::checker::{Decl, DeclKey};
use crate::parser::syntax::{enclosing_callable, function_node, type_members};
use crate::parser::utils::{line_of, node_text, unwrap_expression, visit_descendants};
use crate::util::Deadline;
use std::collections::BTreeMap;
use tracescope_api::{
    CallDirection, CallHierarchy, CallHierarchyOptions, IncomingCall, OutgoingCall, SymbolKind,
    UsageKind,
};
use tree_sitter::Node;

/// One merged edge: the other end and the sorted call-site lines.
struct Edge<'a> {
    decl: Decl<'a>,
    lines: Vec<u32>,
}

pub struct CallGraphResolver<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
}

impl<'c, 'a> CallGraphResolver<'c, 'a> {
    pub fn new(ctx: &'c AnalysisContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn hierarchy(&self, decl: &Decl<'a>, options: &CallHierarchyOptions) -> CallHierarchy {
        let budget = match options.depth {
            d if d < 0 => None,
            0 => Some(1),
            d => Some(d as u32),
        };
        let mut path = vec![decl.key()];
        let outgoing_calls = match options.direction {
            CallDirection::Incoming => Vec::new(),
            _ => self.outgoing(decl, budget, &mut path),
        };
        let incoming_callers = match options.direction {
            CallDirection::Outgoing => Vec::new(),
            _ => self.incoming(decl, budget, &mut path),
        };
        CallHierarchy {
            symbol: self.ctx.symbol_ref(decl),
            depth: options.depth,
            outgoing_calls,
            incoming_callers,
        }
    }

    fn outgoing(&self, decl: &Decl<'a>, budget: Option<u32>, path: &mut Vec<DeclKey>) -> Vec<OutgoingCall> {
        self.callees(decl)
            .into_iter()
            .map(|edge| {
                let key = edge.decl.key();
                let mut node = OutgoingCall {
                    target: self.ctx.symbol_ref(&edge.decl),
                    call_site_lines: edge.lines,
                    outgoing_calls: Vec::new(),
                    cyclic: None,
                    depth_limited: None,
                };
                if path.contains(&key) {
                    node.cyclic = Some(true);
                } else if budget == Some(1) {
                    node.depth_limited = (!self.callees(&edge.decl).is_empty()).then_some(true);
                } else {
                    path.push(key);
                    node.outgoing_calls = self.outgoing(&edge.decl, budget.map(|b| b - 1), path);
                    path.pop();
                }
                node
            })
            .collect()
    }

    fn incoming(&self, decl: &Decl<'a>, budget: Option<u32>, path: &mut Vec<DeclKey>) -> Vec<IncomingCall> {
        self.callers(decl)
            .into_iter()
            .map(|edge| {
                let key = edge.decl.key();
                let mut node = IncomingCall {
                    source: self.ctx.symbol_ref(&edge.decl),
                    call_site_lines: edge.lines,
                    incoming_callers: Vec::new(),
                    cyclic: None,
                    depth_limited: None,
                };
                if path.contains(&key) {
                    node.cyclic = Some(true);
                } else if budget == Some(1) {
                    node.depth_limited = (!self.callers(&edge.decl).is_empty()).then_some(true);
                } else {
                    path.push(key);
                    node.incoming_callers = self.incoming(&edge.decl, budget.map(|b| b - 1), path);
                    path.pop();
                }
                node
            })
            .collect()
    }

    /// User callables invoked from the body of `decl`, in first-call order.
    fn callees(&self, decl: &Decl<'a>) -> Vec<Edge<'a>> {
        let Some((owner, body)) = callable_body(decl) else {
            return Vec::new();
        };
        let file = decl.file;
        let checker = &self.ctx.checker;
        let mut edges: Vec<Edge<'a>> = Vec::new();
        visit_descendants(body, |node: Node<'a>| {
            let callee = match node.kind() {
                "call_expression" => node.child_by_field_name("function"),
                "new_expression" => node.child_by_field_name("constructor"),
                _ => None,
            };
            let Some(callee) = callee else {
                return;
            };
            // Calls inside nested named callables belong to those.
            if enclosing_callable(node).map(|(n, _)| n) != Some(owner) {
                return;
            }
            let Some(name_token) = callee_name(unwrap_expression(callee)) else {
                return;
            };
            let Some(symbol) = checker.resolve_at(file, name_token) else {
                return;
            };
            let Some(target) = implementation(&symbol.declarations) else {
                return;
            };
            if !target.is_user() || !target.effective_kind().is_callable() {
                return;
            }
            let line = line_of(name_token);
            match edges.iter_mut().find(|e| e.decl.same_as(&target)) {
                Some(edge) => edge.lines.push(line),
                None => edges.push(Edge {
                    decl: target,
                    lines: vec![line],
                }),
            }
        });
        for edge in &mut edges {
            edge.lines.sort_unstable();
            edge.lines.dedup();
        }
        edges
    }

    /// Named callables whose bodies call `decl`, ordered by location.
    fn callers(&self, decl: &Decl<'a>) -> Vec<Edge<'a>> {
        let finder = ReferenceFinder::new(self.ctx);
        let target = self.ctx.checker.merged(*decl);
        let options = SearchOptions {
            deadline: Deadline::new(Some(self.ctx.index.config.reference_timeout_ms)),
            ..SearchOptions::default()
        };
        let mut grouped: BTreeMap<(String, DeclKey), Edge<'a>> = BTreeMap::new();
        for site in finder.find(&target, options).sites {
            if site.kind != UsageKind::Call {
                continue;
            }
            // Top-level calls have no caller.
            let Some((owner, name)) = enclosing_callable(site.node) else {
                continue;
            };
            let caller = self
                .ctx
                .checker
                .decl_for_name(site.file, name)
                .filter(|d| d.node == owner)
                .unwrap_or(Decl {
                    file: site.file,
                    kind: SymbolKind::Function,
                    node: owner,
                    name_node: name,
                });
            grouped
                .entry((site.file.rel_path.clone(), caller.key()))
                .or_insert_with(|| Edge {
                    decl: caller,
                    lines: Vec::new(),
                })
                .lines
                .push(site.line);
        }
        grouped
            .into_values()
            .map(|mut edge| {
                edge.lines.sort_unstable();
                edge.lines.dedup();
                edge
            })
            .collect()
    }
}

/// Owner node and body scanned for outgoing calls: the function itself, or
/// the constructor of a class.
fn callable_body<'a>(decl: &Decl<'a>) -> Option<(Node<'a>, Node<'a>)> {
    if decl.kind == SymbolKind::Class {
        let constructor = type_members(decl.node)
            .into_iter()
            .find(|(member, name)| {
                member.kind() == "method_definition" && node_text(*name, &decl.file.text) == "constructor"
            })
            .map(|(member, _)| member)?;
        return Some((constructor, constructor.child_by_field_name("body")?));
    }
    let body = function_node(decl.node)?.child_by_field_name("body")?;
    Some((decl.node, body))
}

/// Token naming the called symbol: `f`, `obj.f`, `new C`.
fn callee_name(callee: Node<'_>) -> Option<Node<'_>> {
    match callee.kind() {
        "identifier" => Some(callee),
        "member_expression" => callee.child_by_field_name("property"),
        _ => None,
    }
}
