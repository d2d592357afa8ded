//! Narrowing constructs inside a callable.

use super::AnalysisContext;
use crate::checker::Decl;
use crate::parser::syntax::{function_node, parameters};
use crate::parser::utils::{line_of, named_children, node_text, string_literal_value, unwrap_expression, visit_descendants};
use crate::project::SourceFile;
use tracescope_api::{GuardEntry, GuardKind, GuardPolarity, NarrowingAnalysis};
use tree_sitter::Node;

/// How a callable's declared return type narrows its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PredicateKind {
    TypeGuard,
    Assertion,
}

pub struct GuardAnalyzer<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
}

impl<'c, 'a> GuardAnalyzer<'c, 'a> {
    pub fn new(ctx: &'c AnalysisContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn analyze(&self, decl: &Decl<'a>) -> NarrowingAnalysis {
        let mut analysis = NarrowingAnalysis {
            symbol: self.ctx.symbol_ref(decl),
            is_type_guard: false,
            is_assertion: false,
            guards: Vec::new(),
        };
        let Some(function) = function_node(decl.node) else {
            return analysis;
        };
        let file = decl.file;

        if let Some((kind, predicate)) = predicate_of(function) {
            let (variable, narrowed_to) = predicate_parts(predicate, &file.text);
            match kind {
                PredicateKind::TypeGuard => analysis.is_type_guard = true,
                PredicateKind::Assertion => analysis.is_assertion = true,
            }
            analysis.guards.push(GuardEntry {
                kind: match kind {
                    PredicateKind::TypeGuard => GuardKind::UserDefinedGuard,
                    PredicateKind::Assertion => GuardKind::Assertion,
                },
                line: line_of(predicate),
                text: flatten(node_text(predicate, &file.text)),
                variable,
                narrowed_to,
                polarity: None,
                components: Vec::new(),
            });
        }

        let Some(body) = function.child_by_field_name("body") else {
            return analysis;
        };
        let mut nodes = Vec::new();
        visit_descendants(body, |n| nodes.push(n));
        for node in nodes {
            self.visit(file, node, analysis.is_type_guard, &mut analysis.guards);
        }
        analysis.guards.sort_by_key(|g| g.line);
        analysis
    }

    fn visit(&self, file: &'a SourceFile, node: Node<'a>, in_type_guard: bool, out: &mut Vec<GuardEntry>) {
        match node.kind() {
            "if_statement" => {
                let Some(condition) = node.child_by_field_name("condition") else {
                    return;
                };
                let condition = unwrap_expression(condition);
                if is_guard_clause(node) {
                    out.push(self.early_return(file, condition));
                } else if let Some(entry) = self.classify(file, condition) {
                    out.push(entry);
                }
            }
            "while_statement" | "do_statement" | "ternary_expression" => {
                if let Some(condition) = node.child_by_field_name("condition") {
                    if let Some(entry) = self.classify(file, unwrap_expression(condition)) {
                        out.push(entry);
                    }
                }
            }
            "return_statement" if in_type_guard => {
                if let Some(expr) = named_children(node).into_iter().next() {
                    if let Some(entry) = self.classify(file, unwrap_expression(expr)) {
                        out.push(entry);
                    }
                }
            }
            "switch_statement" => out.extend(self.switch_cases(file, node)),
            "expression_statement" => {
                // `assertIsUser(x);` / `assertNever(x);`
                let Some(call) = named_children(node).into_iter().next() else {
                    return;
                };
                if call.kind() != "call_expression" {
                    return;
                }
                match self.callee_predicate(file, call) {
                    Some((PredicateKind::Assertion, predicate, owner)) => {
                        let (_, narrowed_to) = predicate_parts(predicate, &owner.text);
                        out.push(GuardEntry {
                            kind: GuardKind::Assertion,
                            line: line_of(call),
                            text: flatten(node_text(call, &file.text)),
                            variable: first_argument(call).map(|a| node_text(a, &file.text).to_string()),
                            narrowed_to,
                            polarity: None,
                            components: Vec::new(),
                        });
                    }
                    _ if self.is_never_check(file, call) => out.push(GuardEntry {
                        kind: GuardKind::Exhaustiveness,
                        line: line_of(call),
                        text: flatten(node_text(call, &file.text)),
                        variable: first_argument(call).map(|a| node_text(a, &file.text).to_string()),
                        narrowed_to: Some("never".to_string()),
                        polarity: None,
                        components: Vec::new(),
                    }),
                    _ => {}
                }
            }
            "variable_declarator" => {
                // `const _exhaustive: never = value;`
                let annotated_never = node
                    .child_by_field_name("type")
                    .and_then(|t| named_children(t).into_iter().next())
                    .map(|t| node_text(t, &file.text) == "never")
                    .unwrap_or(false);
                if annotated_never {
                    out.push(GuardEntry {
                        kind: GuardKind::Exhaustiveness,
                        line: line_of(node),
                        text: flatten(node_text(node, &file.text)),
                        variable: node
                            .child_by_field_name("value")
                            .map(|v| node_text(v, &file.text).to_string()),
                        narrowed_to: Some("never".to_string()),
                        polarity: None,
                        components: Vec::new(),
                    });
                }
            }
            _ => {}
        }
    }

    /// Guard kind of one condition expression; `None` for shapes that do
    /// not narrow.
    fn classify(&self, file: &'a SourceFile, expr: Node<'a>) -> Option<GuardEntry> {
        let text = &file.text;
        let entry = |kind: GuardKind, variable: Option<String>, narrowed_to: Option<String>| GuardEntry {
            kind,
            line: line_of(expr),
            text: flatten(node_text(expr, text)),
            variable,
            narrowed_to,
            polarity: None,
            components: Vec::new(),
        };
        match expr.kind() {
            "parenthesized_expression" => self.classify(file, unwrap_expression(expr)),
            "unary_expression" if operator(expr, text) == "!" => {
                let inner = expr.child_by_field_name("argument")?;
                let mut found = self.classify(file, unwrap_expression(inner))?;
                found.line = line_of(expr);
                found.text = flatten(node_text(expr, text));
                Some(found)
            }
            "binary_expression" => {
                let left = unwrap_expression(expr.child_by_field_name("left")?);
                let right = unwrap_expression(expr.child_by_field_name("right")?);
                match operator(expr, text) {
                    "&&" | "||" => {
                        let l = self.classify(file, left);
                        let r = self.classify(file, right);
                        match (l, r) {
                            (Some(l), Some(r)) => {
                                let mut compound = entry(GuardKind::Compound, l.variable.clone(), None);
                                compound.components = vec![l.kind, r.kind];
                                Some(compound)
                            }
                            (Some(single), None) | (None, Some(single)) => Some(single),
                            (None, None) => None,
                        }
                    }
                    "instanceof" => {
                        let target = node_text(right, text);
                        let kind = if target == "Array" {
                            GuardKind::ArrayCheck
                        } else {
                            GuardKind::Instanceof
                        };
                        Some(entry(kind, Some(node_text(left, text).to_string()), Some(target.to_string())))
                    }
                    "in" => Some(entry(
                        GuardKind::InOperator,
                        Some(node_text(right, text).to_string()),
                        Some(string_literal_value(left, text)),
                    )),
                    "===" | "!==" | "==" | "!=" => {
                        let (subject, other) = if is_literal(left) && !is_literal(right) {
                            (right, left)
                        } else {
                            (left, right)
                        };
                        if let Some(operand) = typeof_operand(subject, text) {
                            return Some(entry(
                                GuardKind::Typeof,
                                Some(node_text(operand, text).to_string()),
                                Some(string_literal_value(other, text)),
                            ));
                        }
                        if is_nullish(other, text) {
                            return Some(entry(
                                GuardKind::Nullish,
                                Some(node_text(subject, text).to_string()),
                                Some(node_text(other, text).to_string()),
                            ));
                        }
                        if subject.kind() == "member_expression" && is_literal(other) {
                            let object = subject.child_by_field_name("object")?;
                            return Some(entry(
                                GuardKind::Discriminant,
                                Some(node_text(object, text).to_string()),
                                Some(literal_text(other, text)),
                            ));
                        }
                        Some(entry(
                            GuardKind::Equality,
                            Some(node_text(subject, text).to_string()),
                            Some(node_text(other, text).to_string()),
                        ))
                    }
                    _ => None,
                }
            }
            "call_expression" => {
                let callee = unwrap_expression(expr.child_by_field_name("function")?);
                if node_text(callee, text) == "Array.isArray" {
                    return Some(entry(
                        GuardKind::ArrayCheck,
                        first_argument(expr).map(|a| node_text(a, text).to_string()),
                        Some("array".to_string()),
                    ));
                }
                match self.callee_predicate(file, expr) {
                    Some((PredicateKind::TypeGuard, predicate, owner)) => {
                        let (_, narrowed_to) = predicate_parts(predicate, &owner.text);
                        Some(entry(
                            GuardKind::UserDefinedGuard,
                            first_argument(expr).map(|a| node_text(a, text).to_string()),
                            narrowed_to,
                        ))
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// `if (cond) return/throw;` with no else branch.
    fn early_return(&self, file: &'a SourceFile, condition: Node<'a>) -> GuardEntry {
        let text = &file.text;
        let classified = self.classify(file, condition);
        let polarity = early_return_polarity(condition, text);
        let variable = classified
            .as_ref()
            .and_then(|c| c.variable.clone())
            .or_else(|| guarded_identifier(condition).map(|n| node_text(n, text).to_string()));
        GuardEntry {
            kind: GuardKind::EarlyReturn,
            line: line_of(condition),
            text: flatten(node_text(condition, text)),
            variable,
            narrowed_to: classified.as_ref().and_then(|c| c.narrowed_to.clone()),
            polarity: Some(polarity),
            components: classified
                .map(|c| if c.components.is_empty() { vec![c.kind] } else { c.components })
                .unwrap_or_default(),
        }
    }

    /// Discriminant (`switch (x.kind)`) and `switch (typeof x)` cases.
    fn switch_cases(&self, file: &'a SourceFile, switch: Node<'a>) -> Vec<GuardEntry> {
        let text = &file.text;
        let Some(value) = switch.child_by_field_name("value").map(unwrap_expression) else {
            return Vec::new();
        };
        let (kind, variable) = if let Some(operand) = typeof_operand(value, text) {
            (GuardKind::Typeof, operand)
        } else if value.kind() == "member_expression" {
            match value.child_by_field_name("object") {
                Some(object) => (GuardKind::Discriminant, object),
                None => return Vec::new(),
            }
        } else {
            return Vec::new();
        };
        let Some(body) = switch.child_by_field_name("body") else {
            return Vec::new();
        };
        named_children(body)
            .into_iter()
            .filter(|c| c.kind() == "switch_case")
            .filter_map(|case| {
                let label = case.child_by_field_name("value")?;
                Some(GuardEntry {
                    kind,
                    line: line_of(case),
                    text: format!("case {}", node_text(label, text)),
                    variable: Some(node_text(variable, text).to_string()),
                    narrowed_to: Some(literal_text(label, text)),
                    polarity: None,
                    components: Vec::new(),
                })
            })
            .collect()
    }

    /// Predicate return annotation of the function a call resolves to, with
    /// the file declaring it.
    fn callee_predicate(
        &self,
        file: &'a SourceFile,
        call: Node<'a>,
    ) -> Option<(PredicateKind, Node<'a>, &'a SourceFile)> {
        let callee = unwrap_expression(call.child_by_field_name("function")?);
        let name = match callee.kind() {
            "identifier" => callee,
            "member_expression" => callee.child_by_field_name("property")?,
            _ => return None,
        };
        let symbol = self.ctx.checker.resolve_at(file, name)?;
        symbol.declarations.iter().find_map(|d| {
            let (kind, predicate) = function_node(d.node).and_then(predicate_of)?;
            Some((kind, predicate, d.file))
        })
    }

    /// `assertNever(x)`: a call whose parameter is typed `never`.
    fn is_never_check(&self, file: &'a SourceFile, call: Node<'a>) -> bool {
        let Some(callee) = call.child_by_field_name("function").map(unwrap_expression) else {
            return false;
        };
        if callee.kind() != "identifier" {
            return false;
        }
        let Some(symbol) = self.ctx.checker.resolve_at(file, callee) else {
            return false;
        };
        symbol.declarations.iter().any(|d| {
            function_node(d.node)
                .map(|f| {
                    parameters(f).iter().any(|p| {
                        p.child_by_field_name("type")
                            .and_then(|t| named_children(t).into_iter().next())
                            .map(|t| node_text(t, &d.file.text) == "never")
                            .unwrap_or(false)
                    })
                })
                .unwrap_or(false)
        })
    }
}

/// Bail-out polarity of a guard clause condition. `x == null` bails out on
/// the checked state (negative); `x != null` continues on it (positive).
pub fn early_return_polarity(condition: Node<'_>, source: &str) -> GuardPolarity {
    let condition = unwrap_expression(condition);
    match condition.kind() {
        "unary_expression" if operator(condition, source) == "!" => GuardPolarity::Negative,
        "binary_expression" => match operator(condition, source) {
            "==" | "===" => GuardPolarity::Negative,
            _ => GuardPolarity::Positive,
        },
        _ => GuardPolarity::Positive,
    }
}

fn is_guard_clause(if_statement: Node<'_>) -> bool {
    if if_statement.child_by_field_name("alternative").is_some() {
        return false;
    }
    let Some(consequence) = if_statement.child_by_field_name("consequence") else {
        return false;
    };
    let last = match consequence.kind() {
        "statement_block" => named_children(consequence)
            .into_iter()
            .filter(|c| c.kind() != "comment")
            .last(),
        _ => Some(consequence),
    };
    last.map(|s| matches!(s.kind(), "return_statement" | "throw_statement" | "continue_statement" | "break_statement"))
        .unwrap_or(false)
}

/// `(kind, predicate node)` of a `x is T` / `asserts x [is T]` return type.
fn predicate_of(function: Node<'_>) -> Option<(PredicateKind, Node<'_>)> {
    let annotation = function.child_by_field_name("return_type")?;
    match annotation.kind() {
        "type_predicate_annotation" => {
            let predicate = named_children(annotation)
                .into_iter()
                .find(|c| c.kind() == "type_predicate")?;
            Some((PredicateKind::TypeGuard, predicate))
        }
        "asserts_annotation" => {
            let asserts = named_children(annotation).into_iter().next()?;
            Some((PredicateKind::Assertion, asserts))
        }
        _ => None,
    }
}

/// (parameter, narrowed type) named by a predicate node.
fn predicate_parts(predicate: Node<'_>, source: &str) -> (Option<String>, Option<String>) {
    let inner = if predicate.kind() == "asserts" {
        named_children(predicate)
            .into_iter()
            .find(|c| c.kind() == "type_predicate")
            .unwrap_or(predicate)
    } else {
        predicate
    };
    if inner.kind() == "type_predicate" {
        let name = inner.child_by_field_name("name").map(|n| node_text(n, source).to_string());
        let ty = inner.child_by_field_name("type").map(|t| node_text(t, source).to_string());
        return (name, ty);
    }
    // `asserts x`
    let name = named_children(inner)
        .into_iter()
        .find(|c| matches!(c.kind(), "identifier" | "this"))
        .map(|n| node_text(n, source).to_string());
    (name, None)
}

fn operator<'s>(expr: Node<'_>, source: &'s str) -> &'s str {
    expr.child_by_field_name("operator")
        .map(|o| node_text(o, source))
        .unwrap_or("")
}

/// Operand of `typeof x`.
fn typeof_operand<'a>(expr: Node<'a>, source: &str) -> Option<Node<'a>> {
    if expr.kind() == "unary_expression" && operator(expr, source) == "typeof" {
        return expr.child_by_field_name("argument").map(unwrap_expression);
    }
    None
}

fn is_literal(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "string" | "number" | "true" | "false" | "null" | "undefined" | "template_string"
    )
}

fn is_nullish(node: Node<'_>, source: &str) -> bool {
    matches!(node.kind(), "null" | "undefined") || node_text(node, source) == "undefined"
}

fn literal_text(node: Node<'_>, source: &str) -> String {
    match node.kind() {
        "string" => string_literal_value(node, source),
        _ => node_text(node, source).to_string(),
    }
}

fn first_argument(call: Node<'_>) -> Option<Node<'_>> {
    call.child_by_field_name("arguments")
        .and_then(|args| named_children(args).into_iter().find(|a| a.kind() != "comment"))
}

/// The identifier a bare truthiness guard checks (`!user`, `user`).
fn guarded_identifier(condition: Node<'_>) -> Option<Node<'_>> {
    let condition = unwrap_expression(condition);
    match condition.kind() {
        "identifier" | "member_expression" => Some(condition),
        "unary_expression" => condition
            .child_by_field_name("argument")
            .map(unwrap_expression)
            .filter(|a| matches!(a.kind(), "identifier" | "member_expression")),
        _ => None,
    }
}

fn flatten(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TsParser;
    use std::path::Path;

    fn condition_polarity(source: &str) -> GuardPolarity {
        let tree = TsParser::new().parse(source, Path::new("a.ts")).unwrap();
        let mut condition = None;
        visit_descendants(tree.root_node(), |n| {
            if n.kind() == "if_statement" && condition.is_none() {
                condition = n.child_by_field_name("condition");
            }
        });
        early_return_polarity(condition.unwrap(), source)
    }

    #[test]
    fn test_early_return_polarity_keeps_null_asymmetry() {
        assert_eq!(condition_polarity("if (x == null) return;"), GuardPolarity::Negative);
        assert_eq!(condition_polarity("if (x === null) return;"), GuardPolarity::Negative);
        assert_eq!(condition_polarity("if (x != null) return;"), GuardPolarity::Positive);
        assert_eq!(condition_polarity("if (x !== null) return;"), GuardPolarity::Positive);
        assert_eq!(condition_polarity("if (!x) return;"), GuardPolarity::Negative);
    }
}
