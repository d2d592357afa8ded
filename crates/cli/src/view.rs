use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracescope_api::{
    CallHierarchy, CallbackAnalysis, ConfusableAnalysis, DeadCodeReport, EnumInfo, IncomingCall,
    LocatedSymbol, NarrowingAnalysis, OutgoingCall, ReferenceSummary, SymbolRef, TypeFlow,
};

fn location(symbol: &SymbolRef) -> String {
    format!("{}:{}", symbol.file_path, symbol.line)
}

fn lines(lines: &[u32]) -> String {
    lines.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::sharp()).to_string()
}

#[derive(Tabled)]
struct LocatedRow {
    name: String,
    kind: String,
    location: String,
    exported: bool,
    modifiers: String,
}

pub fn located_table(located: &LocatedSymbol) -> String {
    let mut rows = vec![LocatedRow {
        name: located.symbol.name.clone(),
        kind: located.kind.to_string(),
        location: location(&located.symbol),
        exported: located.exported,
        modifiers: located.modifiers.join(" "),
    }];
    rows.extend(located.merged.iter().map(|m| LocatedRow {
        name: m.name.clone(),
        kind: "merged".to_string(),
        location: location(m),
        exported: located.exported,
        modifiers: String::new(),
    }));
    render(rows)
}

/// One call edge, indented by depth.
#[derive(Tabled)]
struct CallRow {
    direction: &'static str,
    symbol: String,
    location: String,
    lines: String,
    note: &'static str,
}

fn note(cyclic: Option<bool>, depth_limited: Option<bool>) -> &'static str {
    match (cyclic, depth_limited) {
        (Some(true), _) => "cyclic",
        (_, Some(true)) => "depth limited",
        _ => "",
    }
}

fn push_outgoing(calls: &[OutgoingCall], depth: usize, rows: &mut Vec<CallRow>) {
    for call in calls {
        rows.push(CallRow {
            direction: "out",
            symbol: format!("{}{}", "  ".repeat(depth), call.target.name),
            location: location(&call.target),
            lines: lines(&call.call_site_lines),
            note: note(call.cyclic, call.depth_limited),
        });
        push_outgoing(&call.outgoing_calls, depth + 1, rows);
    }
}

fn push_incoming(calls: &[IncomingCall], depth: usize, rows: &mut Vec<CallRow>) {
    for call in calls {
        rows.push(CallRow {
            direction: "in",
            symbol: format!("{}{}", "  ".repeat(depth), call.source.name),
            location: location(&call.source),
            lines: lines(&call.call_site_lines),
            note: note(call.cyclic, call.depth_limited),
        });
        push_incoming(&call.incoming_callers, depth + 1, rows);
    }
}

pub fn calls_table(hierarchy: &CallHierarchy) -> String {
    let mut rows = Vec::new();
    push_outgoing(&hierarchy.outgoing_calls, 0, &mut rows);
    push_incoming(&hierarchy.incoming_callers, 0, &mut rows);
    format!("{} ({})\n{}", hierarchy.symbol.name, location(&hierarchy.symbol), render(rows))
}

#[derive(Tabled)]
struct TypeFlowRow {
    name: String,
    #[tabled(rename = "type")]
    type_text: String,
    resolved: String,
}

pub fn type_flow_table(flow: &TypeFlow) -> String {
    let rows = flow
        .parameters
        .iter()
        .chain(flow.return_type.iter())
        .map(|entry| TypeFlowRow {
            name: entry.name.clone(),
            type_text: entry.type_text.clone(),
            resolved: entry
                .resolved_types
                .iter()
                .map(|r| format!("{} ({})", r.name, location(r)))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    render(rows)
}

#[derive(Tabled)]
struct ReferenceRow {
    file: String,
    lines: String,
    usage: String,
    test: bool,
}

pub fn references_table(summary: &ReferenceSummary) -> String {
    let rows = summary
        .files
        .iter()
        .map(|f| ReferenceRow {
            file: f.file_path.clone(),
            lines: lines(&f.lines),
            usage: f
                .usage_kinds
                .iter()
                .map(|k| format!("{:?}", k).to_lowercase())
                .collect::<Vec<_>>()
                .join(","),
            test: f.is_test_file,
        })
        .collect();
    format!(
        "{} references in {} files{}\n{}",
        summary.total_count,
        summary.file_count,
        if summary.partial { " (partial)" } else { "" },
        render(rows)
    )
}

#[derive(Tabled)]
struct GuardRow {
    line: u32,
    kind: String,
    variable: String,
    text: String,
}

pub fn guards_table(analysis: &NarrowingAnalysis) -> String {
    let rows = analysis
        .guards
        .iter()
        .map(|g| GuardRow {
            line: g.line,
            kind: format!("{:?}", g.kind),
            variable: g.variable.clone().unwrap_or_default(),
            text: g.text.clone(),
        })
        .collect();
    render(rows)
}

#[derive(Tabled)]
struct CallbackRow {
    file: String,
    line: u32,
    receiver: String,
    argument: usize,
    via: String,
}

pub fn callbacks_table(analysis: &CallbackAnalysis) -> String {
    let rows = analysis
        .usages
        .iter()
        .map(|u| CallbackRow {
            file: u.file_path.clone(),
            line: u.line,
            receiver: u.receiver.clone(),
            argument: u.argument_index,
            via: format!("{:?}", u.via),
        })
        .collect();
    render(rows)
}

#[derive(Tabled)]
struct ConfusableRow {
    line: u32,
    name: String,
    scripts: String,
    scope: String,
    severity: String,
}

pub fn confusables_table(analysis: &ConfusableAnalysis) -> String {
    let rows = analysis
        .identifiers
        .iter()
        .map(|i| ConfusableRow {
            line: i.line,
            name: i.name.escape_debug().to_string(),
            scripts: i.scripts.join("+"),
            scope: i.scope.clone(),
            severity: format!("{:?}", i.severity),
        })
        .collect();
    let pairs: Vec<String> = analysis
        .confusable_pairs
        .iter()
        .map(|p| format!("{}:{} ~ {}:{}  {}", p.first, p.first_line, p.second, p.second_line, p.reason))
        .collect();
    format!("{}\n{}", render(rows), pairs.join("\n"))
}

#[derive(Tabled)]
struct DeadCodeRow {
    file: String,
    line: u32,
    name: String,
    kind: String,
    confidence: String,
}

pub fn dead_code_table(report: &DeadCodeReport) -> String {
    let rows = report
        .items
        .iter()
        .map(|i| DeadCodeRow {
            file: i.file.clone(),
            line: i.line,
            name: i.name.clone(),
            kind: i.kind.to_string(),
            confidence: format!("{:?}", i.confidence),
        })
        .collect();
    let s = &report.summary;
    format!(
        "{}\n{} found, {} files, {} declarations, {} ms{}",
        render(rows),
        s.found,
        s.scanned_files,
        s.scanned_declarations,
        s.elapsed_ms,
        if s.partial { " (partial)" } else { "" }
    )
}

#[derive(Tabled)]
struct EnumRow {
    line: u32,
    name: String,
    value: String,
    computed: bool,
}

pub fn enum_table(info: &EnumInfo) -> String {
    let rows = info
        .members
        .iter()
        .map(|m| EnumRow {
            line: m.line,
            name: m.name.clone(),
            value: m.value.clone(),
            computed: m.is_computed,
        })
        .collect();
    render(rows)
}
