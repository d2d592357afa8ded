//! Call sites passing a callable as an argument, and higher-order flags.

use super::AnalysisContext;
use super::references::{ReferenceFinder, SearchOptions};
use crate::checker::{Checker, Decl};
use crate::parser::utils::{named_children, node_text, outermost_wrapper, unwrap_expression};
use crate::util::Deadline;
use tracescope_api::{CallbackAnalysis, CallbackUsage, CallbackVia};
use tree_sitter::Node;

pub struct CallbackAnalyzer<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
}

impl<'c, 'a> CallbackAnalyzer<'c, 'a> {
    pub fn new(ctx: &'c AnalysisContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn analyze(&self, decl: &Decl<'a>) -> CallbackAnalysis {
        let checker = &self.ctx.checker;
        let target = checker.merged(*decl);
        let options = SearchOptions {
            deadline: Deadline::new(Some(self.ctx.index.config.reference_timeout_ms)),
            ..SearchOptions::default()
        };
        let search = ReferenceFinder::new(self.ctx).find(&target, options);

        let mut usages: Vec<CallbackUsage> = search
            .sites
            .iter()
            .filter_map(|site| {
                let (receiver, argument_index, via) = passed_as_argument(site.node, &site.file.text)?;
                Some(CallbackUsage {
                    file_path: site.file.rel_path.clone(),
                    line: site.line,
                    receiver,
                    argument_index,
                    via,
                })
            })
            .collect();
        usages.sort_by(|a, b| {
            (a.file_path.as_str(), a.line, a.argument_index).cmp(&(b.file_path.as_str(), b.line, b.argument_index))
        });

        let signature = checker
            .call_signatures(&checker.type_of_declaration(decl))
            .into_iter()
            .next();
        let (function_parameters, returns_function) = match &signature {
            Some(signature) => (
                signature
                    .parameters
                    .iter()
                    .filter(|(_, ty)| ty.is_function_like())
                    .map(|(name, _)| name.to_string())
                    .collect::<Vec<_>>(),
                signature.return_type.is_function_like(),
            ),
            None => (Vec::new(), false),
        };

        CallbackAnalysis {
            symbol: self.ctx.symbol_ref(decl),
            usages,
            is_higher_order: !function_parameters.is_empty() || returns_function,
            function_parameters,
            returns_function,
            partial: search.partial,
        }
    }
}

/// (receiving call name, argument index, access form) when the reference
/// at `name` is an argument of some call.
fn passed_as_argument(name: Node<'_>, source: &str) -> Option<(String, usize, CallbackVia)> {
    let mut via = CallbackVia::Identifier;
    let mut expr = name;
    if let Some(parent) = name.parent() {
        if parent.kind() == "member_expression" && parent.child_by_field_name("property") == Some(name) {
            expr = parent;
            via = CallbackVia::MemberAccess;
        }
    }
    expr = outermost_wrapper(expr);

    // `fn.bind(receiver)` passes the bound copy.
    if let Some(member) = expr.parent() {
        let is_bind = member.kind() == "member_expression"
            && member.child_by_field_name("object") == Some(expr)
            && member
                .child_by_field_name("property")
                .map(|p| node_text(p, source) == "bind")
                .unwrap_or(false);
        if is_bind {
            let call = member.parent().filter(|c| {
                c.kind() == "call_expression" && c.child_by_field_name("function") == Some(member)
            })?;
            expr = outermost_wrapper(call);
            via = CallbackVia::Bind;
        }
    }

    let arguments = expr.parent().filter(|p| p.kind() == "arguments")?;
    let call = arguments
        .parent()
        .filter(|c| matches!(c.kind(), "call_expression" | "new_expression"))?;
    let argument_index = named_children(arguments)
        .into_iter()
        .filter(|a| a.kind() != "comment")
        .position(|a| a == expr)?;
    Some((receiver_name(call, source), argument_index, via))
}

/// Name of the call receiving the argument: `map` for `xs.map(f)`.
fn receiver_name(call: Node<'_>, source: &str) -> String {
    let callee = call
        .child_by_field_name("function")
        .or_else(|| call.child_by_field_name("constructor"))
        .map(unwrap_expression);
    match callee {
        Some(c) if c.kind() == "member_expression" => c
            .child_by_field_name("property")
            .map(|p| node_text(p, source).to_string())
            .unwrap_or_default(),
        Some(c) => node_text(c, source).to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TsParser;
    use crate::parser::utils::visit_descendants;
    use std::path::Path;

    fn usage(source: &str, needle: &str) -> Option<(String, usize, CallbackVia)> {
        let tree = TsParser::new().parse(source, Path::new("a.ts")).unwrap();
        let mut found = None;
        visit_descendants(tree.root_node(), |n| {
            if found.is_none() && n.kind().ends_with("identifier") && node_text(n, source) == needle {
                found = Some(n);
            }
        });
        passed_as_argument(found.unwrap(), source)
    }

    #[test]
    fn test_argument_shapes() {
        assert_eq!(
            usage("items.map(format);", "format"),
            Some(("map".to_string(), 0, CallbackVia::Identifier))
        );
        assert_eq!(
            usage("el.addEventListener('click', this.onClick.bind(this));", "onClick"),
            Some(("addEventListener".to_string(), 1, CallbackVia::Bind))
        );
        assert_eq!(
            usage("setTimeout((svc.tick as any), 10);", "tick"),
            Some(("setTimeout".to_string(), 0, CallbackVia::MemberAccess))
        );
        assert_eq!(usage("format(items);", "format"), None);
    }
}
