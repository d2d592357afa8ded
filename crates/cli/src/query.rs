use crate::view;
use crate::{Commands, Direction, SymbolArgs};
use anyhow::anyhow;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use tracescope_api::{
    ApiResult, CallDirection, CallHierarchy, CallHierarchyOptions, CallbackAnalysis,
    ConfusableAnalysis, DeadCodeOptions, DeadCodeReport, EnumInfo, HierarchyOptions,
    IndexLifecycle, LocatedSymbol, NarrowingAnalysis, PatternAnalyzer, ProjectScanner,
    QueryResponse, ReferenceOptions, ReferenceSummary, StructureAnalyzer, SymbolKind,
    SymbolLocatorService, SymbolQuery, TypeFlow, TypeHierarchy,
};
use tracescope_core::TraceEngine;

impl SymbolArgs {
    fn query(&self) -> SymbolQuery {
        SymbolQuery {
            name: self.name.clone(),
            file: self.file.clone(),
            line: self.line,
        }
    }
}

impl From<Direction> for CallDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Outgoing => CallDirection::Outgoing,
            Direction::Incoming => CallDirection::Incoming,
            Direction::Both => CallDirection::Both,
        }
    }
}

pub fn execute(command: Commands, table: bool, fresh: bool) -> anyhow::Result<ExitCode> {
    let engine = TraceEngine::new();
    if fresh {
        if let Some(root) = command_root(&command) {
            engine.invalidate(root);
        }
    }

    match command {
        Commands::Locate { symbol } => emit(
            engine.locate(&symbol.path, &symbol.query()),
            table.then_some(view::located_table as fn(&LocatedSymbol) -> String),
        ),
        Commands::Calls {
            symbol,
            depth,
            direction,
        } => {
            let options = CallHierarchyOptions {
                depth,
                direction: direction.into(),
            };
            emit(
                engine.call_hierarchy(&symbol.path, &symbol.query(), &options),
                table.then_some(view::calls_table as fn(&CallHierarchy) -> String),
            )
        }
        Commands::TypeFlow { symbol } => emit(
            engine.type_flow(&symbol.path, &symbol.query()),
            table.then_some(view::type_flow_table as fn(&TypeFlow) -> String),
        ),
        Commands::Refs {
            symbol,
            no_tests,
            timeout_ms,
        } => {
            let options = ReferenceOptions {
                include_tests: !no_tests,
                timeout_ms,
            };
            emit(
                engine.references(&symbol.path, &symbol.query(), &options),
                table.then_some(view::references_table as fn(&ReferenceSummary) -> String),
            )
        }
        Commands::Hierarchy { symbol, timeout_ms } => emit(
            engine.type_hierarchy(&symbol.path, &symbol.query(), &HierarchyOptions { timeout_ms }),
            None::<fn(&TypeHierarchy) -> String>,
        ),
        Commands::Guards { symbol } => emit(
            engine.narrowing(&symbol.path, &symbol.query()),
            table.then_some(view::guards_table as fn(&NarrowingAnalysis) -> String),
        ),
        Commands::Callbacks { symbol } => emit(
            engine.callbacks(&symbol.path, &symbol.query()),
            table.then_some(view::callbacks_table as fn(&CallbackAnalysis) -> String),
        ),
        Commands::Confusables { path, file } => emit(
            engine.confusables(&path, &file),
            table.then_some(view::confusables_table as fn(&ConfusableAnalysis) -> String),
        ),
        Commands::DeadCode {
            path,
            inclusive,
            include_tests,
            kinds,
            include,
            exclude,
            max_results,
            timeout_ms,
        } => {
            let kinds = kinds
                .iter()
                .map(|k| SymbolKind::try_from(k.as_str()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| anyhow!(e))?;
            let options = DeadCodeOptions {
                inclusive,
                include_tests,
                kinds,
                include,
                exclude,
                max_results,
                timeout_ms,
            };
            emit(
                engine.dead_code(&path, &options),
                table.then_some(view::dead_code_table as fn(&DeadCodeReport) -> String),
            )
        }
        Commands::Enum { symbol } => emit(
            engine.enum_members(&symbol.path, &symbol.query()),
            table.then_some(view::enum_table as fn(&EnumInfo) -> String),
        ),
        Commands::Schema { result } => {
            let schema = schema_for(&result)?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn command_root(command: &Commands) -> Option<&Path> {
    match command {
        Commands::Locate { symbol }
        | Commands::Calls { symbol, .. }
        | Commands::TypeFlow { symbol }
        | Commands::Refs { symbol, .. }
        | Commands::Hierarchy { symbol, .. }
        | Commands::Guards { symbol }
        | Commands::Callbacks { symbol }
        | Commands::Enum { symbol } => Some(&symbol.path),
        Commands::Confusables { path, .. } | Commands::DeadCode { path, .. } => Some(path),
        Commands::Schema { .. } => None,
    }
}

/// Prints the result envelope (or its table) and maps errors to a failing
/// exit code.
fn emit<T: Serialize>(result: ApiResult<T>, table: Option<fn(&T) -> String>) -> anyhow::Result<ExitCode> {
    let response = QueryResponse::from(result);
    match (&response, table) {
        (QueryResponse::Ok { data }, Some(render)) => println!("{}", render(data)),
        _ => println!("{}", serde_json::to_string_pretty(&response)?),
    }
    if let Some(error) = response.error() {
        tracing::warn!("query failed: {}", error.message);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn schema_for(result: &str) -> anyhow::Result<schemars::Schema> {
    use schemars::schema_for;
    let schema = match result {
        "locate" => schema_for!(QueryResponse<LocatedSymbol>),
        "calls" => schema_for!(QueryResponse<CallHierarchy>),
        "type-flow" => schema_for!(QueryResponse<TypeFlow>),
        "refs" => schema_for!(QueryResponse<ReferenceSummary>),
        "hierarchy" => schema_for!(QueryResponse<TypeHierarchy>),
        "guards" => schema_for!(QueryResponse<NarrowingAnalysis>),
        "callbacks" => schema_for!(QueryResponse<CallbackAnalysis>),
        "confusables" => schema_for!(QueryResponse<ConfusableAnalysis>),
        "dead-code" => schema_for!(QueryResponse<DeadCodeReport>),
        "enum" => schema_for!(QueryResponse<EnumInfo>),
        other => return Err(anyhow!("unknown result '{}'", other)),
    };
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use clap::Parser;

    #[test]
    fn test_schema_names() {
        let schema = schema_for("calls").unwrap();
        let text = serde_json::to_string(&schema).unwrap();
        assert!(text.contains("outgoingCalls"));
        assert!(schema_for("nope").is_err());
    }

    #[test]
    fn test_negative_depth_parses_as_unlimited() {
        let cli = Cli::try_parse_from(["tracescope", "calls", ".", "validate", "--depth", "-1"]).unwrap();
        match cli.command {
            Commands::Calls { depth, symbol, .. } => {
                assert_eq!(depth, -1);
                assert_eq!(symbol.query().name, "validate");
            }
            _ => panic!("expected calls"),
        }
    }

    #[test]
    fn test_dead_code_rejects_unknown_kind() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export const a = 1;\n").unwrap();
        let root = dir.path().to_string_lossy().to_string();
        let cli = Cli::try_parse_from(["tracescope", "dead-code", &root, "--kind", "gizmo"]).unwrap();
        assert!(execute(cli.command, false, false).is_err());
    }

    #[test]
    fn test_missing_symbol_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export const a = 1;\n").unwrap();
        let root = dir.path().to_string_lossy().to_string();
        let cli = Cli::try_parse_from(["tracescope", "locate", &root, "missing"]).unwrap();
        assert!(execute(cli.command, false, true).is_ok());
    }
}
