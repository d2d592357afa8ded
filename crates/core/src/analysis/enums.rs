use super::AnalysisContext;
use crate::checker::Decl;
use crate::error::{Result, TracescopeError};
use crate::parser::utils::{has_token, line_of, named_children, node_text, unwrap_expression};
use crate::parser::syntax::type_body;
use tracescope_api::{EnumInfo, EnumMemberInfo, SymbolKind};
use tree_sitter::Node;

/// Numeric value of a TypeScript numeric literal (`0x1F`, `0b10`, `1_000`).
pub fn parse_numeric(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, cleaned.as_str()),
    };
    let radix = |prefix_lower: &str, prefix_upper: &str, radix: u32| {
        digits
            .strip_prefix(prefix_lower)
            .or_else(|| digits.strip_prefix(prefix_upper))
            .and_then(|d| i64::from_str_radix(d, radix).ok())
            .map(|v| v as f64)
    };
    let value = radix("0x", "0X", 16)
        .or_else(|| radix("0b", "0B", 2))
        .or_else(|| radix("0o", "0O", 8))
        .or_else(|| digits.parse::<f64>().ok())?;
    Some(if negative { -value } else { value })
}

fn render_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

pub struct EnumInspector<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
}

impl<'c, 'a> EnumInspector<'c, 'a> {
    pub fn new(ctx: &'c AnalysisContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn inspect(&self, decl: &Decl<'a>) -> Result<EnumInfo> {
        if decl.kind != SymbolKind::Enum {
            return Err(TracescopeError::InvalidArgument(format!(
                "'{}' is a {}, not an enum",
                decl.name(),
                decl.kind
            )));
        }
        let source = &decl.file.text;
        let mut members = Vec::new();
        // `None` once a member's value can no longer be derived.
        let mut next: Option<f64> = Some(0.0);
        if let Some(body) = type_body(decl.node) {
            for member in named_children(body) {
                let (name, initializer) = match member.kind() {
                    "enum_assignment" => match member.child_by_field_name("name") {
                        Some(name) => (name, member.child_by_field_name("value")),
                        None => continue,
                    },
                    "property_identifier" | "string" => (member, None),
                    _ => continue,
                };
                let (value, is_computed) = member_value(initializer, source, &mut next);
                members.push(EnumMemberInfo {
                    name: node_text(name, source).trim_matches(|c| c == '"' || c == '\'').to_string(),
                    value,
                    line: line_of(name),
                    is_computed,
                });
            }
        }
        Ok(EnumInfo {
            symbol: self.ctx.symbol_ref(decl),
            is_const: has_token(decl.node, "const"),
            members,
        })
    }
}

/// (value text, computed) of one member; advances the auto-increment.
fn member_value(initializer: Option<Node<'_>>, source: &str, next: &mut Option<f64>) -> (String, bool) {
    let Some(init) = initializer.map(unwrap_expression) else {
        return match next.take() {
            Some(value) => {
                *next = Some(value + 1.0);
                (render_number(value), false)
            }
            None => (String::new(), true),
        };
    };
    let text = node_text(init, source);
    match init.kind() {
        "string" | "template_string" if !text.contains("${") => {
            *next = None;
            (text.to_string(), false)
        }
        "number" => {
            *next = parse_numeric(text).map(|v| v + 1.0);
            (text.to_string(), false)
        }
        // Only negation keeps a literal a literal.
        "unary_expression"
            if init.child_by_field_name("operator").map(|o| o.kind()) == Some("-")
                && init
                    .child_by_field_name("argument")
                    .map(|a| a.kind() == "number")
                    .unwrap_or(false) =>
        {
            *next = parse_numeric(text).map(|v| v + 1.0);
            (text.to_string(), false)
        }
        _ => {
            *next = None;
            (text.to_string(), true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_literal_forms() {
        assert_eq!(parse_numeric("42"), Some(42.0));
        assert_eq!(parse_numeric("0x10"), Some(16.0));
        assert_eq!(parse_numeric("0b101"), Some(5.0));
        assert_eq!(parse_numeric("0o17"), Some(15.0));
        assert_eq!(parse_numeric("1_000"), Some(1000.0));
        assert_eq!(parse_numeric("-3"), Some(-3.0));
        assert_eq!(parse_numeric("1.5"), Some(1.5));
        assert_eq!(parse_numeric("abc"), None);
    }

    #[test]
    fn test_auto_increment_after_numeric() {
        let mut next = Some(0.0);
        assert_eq!(member_value(None, "", &mut next), ("0".to_string(), false));
        assert_eq!(member_value(None, "", &mut next), ("1".to_string(), false));
        next = None;
        assert_eq!(member_value(None, "", &mut next), (String::new(), true));
    }
}
