//! Unicode hygiene of declared identifiers: scripts, invisible characters,
//! normalization and skeleton collisions.

use crate::parser::syntax::{binding_names, declaration_kind, declaration_name};
use crate::parser::utils::{line_of, node_text, visit_descendants};
use crate::project::SourceFile;
use std::collections::BTreeMap;
use tracescope_api::{ConfusableAnalysis, ConfusablePair, IdentifierReport, Severity};
use tree_sitter::Node;
use unicode_normalization::{UnicodeNormalization, is_nfc};

const BIDI_CONTROLS: &[char] = &[
    '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}', '\u{2066}', '\u{2067}',
    '\u{2068}', '\u{2069}', '\u{200E}', '\u{200F}', '\u{061C}',
];

const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{180E}'];

/// Inclusive code point ranges per script, checked in order.
const SCRIPT_RANGES: &[(u32, u32, &str)] = &[
    (0x0041, 0x005A, "Latin"),
    (0x0061, 0x007A, "Latin"),
    (0x00C0, 0x00D6, "Latin"),
    (0x00D8, 0x00F6, "Latin"),
    (0x00F8, 0x024F, "Latin"),
    (0x1E00, 0x1EFF, "Latin"),
    (0x0370, 0x03FF, "Greek"),
    (0x1F00, 0x1FFF, "Greek"),
    (0x0400, 0x052F, "Cyrillic"),
    (0x0530, 0x058F, "Armenian"),
    (0x0590, 0x05FF, "Hebrew"),
    (0x0600, 0x06FF, "Arabic"),
    (0x0750, 0x077F, "Arabic"),
    (0x0900, 0x097F, "Devanagari"),
    (0x0E00, 0x0E7F, "Thai"),
    (0x10A0, 0x10FF, "Georgian"),
    (0x1100, 0x11FF, "Hangul"),
    (0xAC00, 0xD7AF, "Hangul"),
    (0x13A0, 0x13FF, "Cherokee"),
    (0x3040, 0x309F, "Hiragana"),
    (0x30A0, 0x30FF, "Katakana"),
    (0x3400, 0x4DBF, "Han"),
    (0x4E00, 0x9FFF, "Han"),
    (0xFF00, 0xFFEF, "Fullwidth"),
    (0x1D400, 0x1D7FF, "Mathematical"),
];

/// Look-alikes folded onto their Latin counterpart.
const CONFUSABLE_MAP: &[(char, char)] = &[
    // Cyrillic
    ('а', 'a'), ('в', 'b'), ('е', 'e'), ('о', 'o'), ('р', 'p'), ('с', 'c'), ('у', 'y'),
    ('х', 'x'), ('і', 'i'), ('ј', 'j'), ('ѕ', 's'), ('ԁ', 'd'), ('һ', 'h'), ('ԛ', 'q'),
    ('ԝ', 'w'), ('А', 'A'), ('В', 'B'), ('Е', 'E'), ('К', 'K'), ('М', 'M'), ('Н', 'H'),
    ('О', 'O'), ('Р', 'P'), ('С', 'C'), ('Т', 'T'), ('Х', 'X'), ('І', 'I'), ('Ј', 'J'),
    ('Ѕ', 'S'), ('Ү', 'Y'),
    // Greek
    ('α', 'a'), ('ο', 'o'), ('ν', 'v'), ('ρ', 'p'), ('ι', 'i'), ('κ', 'k'), ('υ', 'u'),
    ('Α', 'A'), ('Β', 'B'), ('Ε', 'E'), ('Ζ', 'Z'), ('Η', 'H'), ('Ι', 'I'), ('Κ', 'K'),
    ('Μ', 'M'), ('Ν', 'N'), ('Ο', 'O'), ('Ρ', 'P'), ('Τ', 'T'), ('Υ', 'Y'), ('Χ', 'X'),
    // Latin look-alikes
    ('ı', 'i'), ('ℓ', 'l'),
];

/// Script name of one character; `None` for digits, `_`, `$` and invisibles.
pub fn script_of(c: char) -> Option<&'static str> {
    if c.is_ascii_digit() || c == '_' || c == '$' || is_invisible(c) {
        return None;
    }
    let cp = c as u32;
    Some(
        SCRIPT_RANGES
            .iter()
            .find(|(lo, hi, _)| (*lo..=*hi).contains(&cp))
            .map(|(_, _, name)| *name)
            .unwrap_or("Other"),
    )
}

fn is_invisible(c: char) -> bool {
    BIDI_CONTROLS.contains(&c) || ZERO_WIDTH.contains(&c)
}

/// Scripts in order of first appearance.
pub fn scripts_of(name: &str) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for script in name.chars().filter_map(script_of) {
        if !out.contains(&script) {
            out.push(script);
        }
    }
    out
}

/// NFKC, then look-alike folding, then invisible-character removal.
pub fn skeleton(name: &str) -> String {
    name.nfkc()
        .filter(|c| !is_invisible(*c))
        .map(|c| {
            CONFUSABLE_MAP
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}

/// One declared identifier occurrence.
struct Declared {
    name: String,
    line: u32,
    scope: String,
}

pub fn analyze_file(file: &SourceFile) -> ConfusableAnalysis {
    let declared = declared_identifiers(file);

    // First occurrence per distinct name, grouped by skeleton.
    let mut by_skeleton: BTreeMap<String, Vec<&Declared>> = BTreeMap::new();
    for d in &declared {
        let group = by_skeleton.entry(skeleton(&d.name)).or_default();
        if !group.iter().any(|g| g.name == d.name) {
            group.push(d);
        }
    }
    let mut pairs = Vec::new();
    for (skel, group) in &by_skeleton {
        for (i, first) in group.iter().enumerate() {
            for second in &group[i + 1..] {
                pairs.push(ConfusablePair {
                    first: first.name.clone(),
                    first_line: first.line,
                    second: second.name.clone(),
                    second_line: second.line,
                    skeleton: skel.clone(),
                    reason: pair_reason(&first.name, &second.name),
                    severity: Severity::Critical,
                });
            }
        }
    }
    pairs.sort_by(|a, b| (a.first_line, a.second_line).cmp(&(b.first_line, b.second_line)));

    let in_pair = |name: &str| pairs.iter().any(|p| p.first == name || p.second == name);
    let identifiers: Vec<IdentifierReport> = declared
        .iter()
        .filter(|d| !d.name.is_ascii())
        .map(|d| {
            let scripts = scripts_of(&d.name);
            let mixed_script = scripts.len() > 1;
            let has_bidi = d.name.chars().any(|c| BIDI_CONTROLS.contains(&c));
            let has_zero_width = d.name.chars().any(|c| ZERO_WIDTH.contains(&c));
            let severity = if has_bidi || has_zero_width || in_pair(&d.name) {
                Severity::Critical
            } else if mixed_script {
                Severity::Warning
            } else {
                Severity::Info
            };
            IdentifierReport {
                name: d.name.clone(),
                line: d.line,
                scripts: scripts.iter().map(|s| s.to_string()).collect(),
                mixed_script,
                has_bidi,
                has_zero_width,
                nfc: d.name.nfc().collect(),
                is_nfc: is_nfc(&d.name),
                scope: d.scope.clone(),
                severity,
            }
        })
        .collect();

    let max_severity = identifiers
        .iter()
        .map(|i| i.severity)
        .chain(pairs.iter().map(|p| p.severity))
        .max();
    if let Some(severity) = max_severity {
        tracing::debug!("{}: {} suspicious identifiers ({:?})", file.rel_path, identifiers.len(), severity);
    }
    ConfusableAnalysis {
        file_path: file.rel_path.clone(),
        identifiers,
        confusable_pairs: pairs,
        max_severity,
    }
}

/// "mixes Cyrillic into Latin" style explanation of a skeleton collision.
fn pair_reason(first: &str, second: &str) -> String {
    let a = scripts_of(first);
    let b = scripts_of(second);
    let only_b: Vec<&str> = b.iter().filter(|s| !a.contains(s)).copied().collect();
    let only_a: Vec<&str> = a.iter().filter(|s| !b.contains(s)).copied().collect();
    match (only_a.is_empty(), only_b.is_empty()) {
        (true, false) => format!("'{}' uses {} characters", second, only_b.join(", ")),
        (false, true) => format!("'{}' uses {} characters", first, only_a.join(", ")),
        (false, false) => format!(
            "'{}' uses {} where '{}' uses {}",
            first,
            only_a.join(", "),
            second,
            only_b.join(", ")
        ),
        (true, true) => "differ only in invisible or compatibility characters".to_string(),
    }
}

fn declared_identifiers(file: &SourceFile) -> Vec<Declared> {
    let source = &file.text;
    let mut out = Vec::new();
    visit_descendants(file.root_node(), |node| {
        if declaration_kind(node, source).is_none() {
            return;
        }
        let names = match node.kind() {
            "variable_declarator" => node.child_by_field_name("name").map(binding_names).unwrap_or_default(),
            "required_parameter" | "optional_parameter" => {
                node.child_by_field_name("pattern").map(binding_names).unwrap_or_default()
            }
            _ => declaration_name(node).into_iter().collect(),
        };
        for name in names.into_iter().filter(|n| n.kind() != "string") {
            out.push(Declared {
                name: node_text(name, source).to_string(),
                line: line_of(name),
                scope: scope_label(node, source),
            });
        }
    });
    out
}

/// Lexical scope a declaration lives in.
fn scope_label(decl: Node<'_>, source: &str) -> String {
    let mut in_block = false;
    let mut current = decl.parent();
    while let Some(n) = current {
        match n.kind() {
            "function_declaration" | "generator_function_declaration" | "method_definition"
            | "function_expression" | "arrow_function" => {
                let name = n
                    .child_by_field_name("name")
                    .map(|name| node_text(name, source))
                    .unwrap_or("<anonymous>");
                return format!("function {}", name);
            }
            "class_declaration" | "abstract_class_declaration" | "class" | "interface_declaration" => {
                let name = n
                    .child_by_field_name("name")
                    .map(|name| node_text(name, source))
                    .unwrap_or("<anonymous>");
                return format!("class {}", name);
            }
            "statement_block" => in_block = true,
            _ => {}
        }
        current = n.parent();
    }
    let label = if in_block { "block" } else { "module" };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyrillic_look_alike_shares_skeleton() {
        assert_eq!(skeleton("sсore"), "score");
        assert_eq!(scripts_of("sсore"), vec!["Latin", "Cyrillic"]);
        assert_eq!(scripts_of("score"), vec!["Latin"]);
    }

    #[test]
    fn test_invisible_and_width_folding() {
        assert_eq!(skeleton("us\u{200B}er"), "user");
        assert_eq!(skeleton("ｕｓｅｒ"), "user");
        assert_eq!(script_of('\u{200D}'), None);
        assert_eq!(script_of('_'), None);
    }

    #[test]
    fn test_pair_reason_names_the_foreign_script() {
        assert_eq!(pair_reason("score", "sсore"), "'sсore' uses Cyrillic characters");
    }
}
