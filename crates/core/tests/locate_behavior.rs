mod common;

use common::{query, query_in, setup_project};
use tracescope_api::{ApiError, StructureAnalyzer, SymbolKind, SymbolLocatorService, SymbolQuery};

#[test]
fn given_dotted_name_when_locating_then_class_member_is_found() {
    let project = setup_project(&[(
        "src/store.ts",
        "export class UserStore {\n\
         \x20 private cache = new Map<string, string>();\n\
         \x20 static async load(id: string) {\n\
         \x20   return id;\n\
         \x20 }\n\
         }\n",
    )]);

    let located = project
        .engine
        .locate(project.root(), &query("UserStore.load"))
        .unwrap();

    assert_eq!(located.symbol.name, "UserStore.load");
    assert_eq!(located.symbol.line, 3);
    assert_eq!(located.kind, SymbolKind::Method);
    assert!(located.modifiers.iter().any(|m| m == "static"));
    assert!(located.modifiers.iter().any(|m| m == "async"));
}

#[test]
fn given_line_hint_when_locating_then_declaration_containing_line_wins() {
    let project = setup_project(&[(
        "src/dup.ts",
        "function handler() {\n\
         \x20 return 1;\n\
         }\n\
         export namespace Inner {\n\
         \x20 export function handler() {\n\
         \x20   return 2;\n\
         \x20 }\n\
         }\n",
    )]);

    let mut hinted = query_in("handler", "src/dup.ts");
    hinted.line = Some(6);
    let located = project.engine.locate(project.root(), &hinted).unwrap();
    assert_eq!(located.symbol.line, 5);

    let first = project
        .engine
        .locate(project.root(), &query_in("handler", "src/dup.ts"))
        .unwrap();
    assert_eq!(first.symbol.line, 1);
    assert!(!first.exported);
}

#[test]
fn given_importer_sorting_before_definer_when_locating_without_hint_then_definition_wins() {
    let project = setup_project(&[
        ("src/a_user.ts", "import { helper } from \"./z_lib\";\nhelper();\n"),
        ("src/z_lib.ts", "export function helper() {\n  return 1;\n}\n"),
    ]);

    let located = project.engine.locate(project.root(), &query("helper")).unwrap();

    assert_eq!(located.symbol.file_path, "src/z_lib.ts");
    assert_eq!(located.symbol.line, 1);
    assert_eq!(located.kind, SymbolKind::Function);
}

#[test]
fn given_hint_at_importing_file_when_locating_then_binding_resolves_to_definition() {
    let project = setup_project(&[
        ("src/a_user.ts", "import { helper } from \"./z_lib\";\nhelper();\n"),
        ("src/z_lib.ts", "export function helper() {\n  return 1;\n}\n"),
    ]);

    let located = project
        .engine
        .locate(project.root(), &query_in("helper", "src/a_user.ts"))
        .unwrap();

    assert_eq!(located.symbol.file_path, "src/z_lib.ts");
    assert_eq!(located.kind, SymbolKind::Function);
}

#[test]
fn given_only_a_parameter_named_so_when_locating_then_identifier_scan_finds_it() {
    let project = setup_project(&[("src/a.ts", "export function run(budget: number) {\n  return budget;\n}\n")]);

    let located = project.engine.locate(project.root(), &query("budget")).unwrap();

    assert_eq!(located.kind, SymbolKind::Parameter);
    assert_eq!(located.symbol.line, 1);
}

#[test]
fn given_interface_and_namespace_merge_when_locating_then_other_declarations_are_listed() {
    let project = setup_project(&[(
        "src/merge.ts",
        "export interface Config {\n\
         \x20 port: number;\n\
         }\n\
         export namespace Config {\n\
         \x20 export const DEFAULT_PORT = 80;\n\
         }\n",
    )]);

    let located = project.engine.locate(project.root(), &query("Config")).unwrap();

    assert_eq!(located.kind, SymbolKind::Interface);
    assert!(located.exported);
    assert_eq!(located.merged.len(), 1);
    assert_eq!(located.merged[0].line, 4);
}

#[test]
fn given_empty_name_when_locating_then_invalid_argument() {
    let project = setup_project(&[("src/a.ts", "export const a = 1;\n")]);

    let err = project
        .engine
        .locate(project.root(), &SymbolQuery::named("  "))
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidArgument(_)), "got {err:?}");
}

#[test]
fn given_unknown_name_when_locating_then_not_found_reports_scanned_files() {
    let project = setup_project(&[
        ("src/a.ts", "export const a = 1;\n"),
        ("src/b.ts", "export const b = 2;\n"),
    ]);

    let err = project
        .engine
        .locate(project.root(), &query("missing"))
        .unwrap_err();

    match err {
        ApiError::SymbolNotFound { name, scanned_files } => {
            assert_eq!(name, "missing");
            assert_eq!(scanned_files, 2);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn given_directory_without_sources_when_querying_then_no_project() {
    let project = setup_project(&[("README.md", "# nothing here\n")]);

    let err = project
        .engine
        .locate(project.root(), &query("anything"))
        .unwrap_err();

    assert!(matches!(err, ApiError::NoProject(_)), "got {err:?}");
}

#[test]
fn given_numeric_enum_when_inspecting_then_values_follow_initializers() {
    let project = setup_project(&[(
        "src/flags.ts",
        "export enum Flags { None = 0, Read = 1, Write = 2, Execute = 4 }\n",
    )]);

    let info = project.engine.enum_members(project.root(), &query("Flags")).unwrap();

    assert!(!info.is_const);
    let values: Vec<&str> = info.members.iter().map(|m| m.value.as_str()).collect();
    assert_eq!(values, vec!["0", "1", "2", "4"]);
    assert!(info.members.iter().all(|m| !m.is_computed));
}

#[test]
fn given_expression_initializer_when_inspecting_then_member_and_successor_are_computed() {
    let project = setup_project(&[(
        "src/bits.ts",
        "export enum Bits {\n\
         \x20 Low = 1 << 0,\n\
         \x20 Next,\n\
         \x20 Hex = 0x10,\n\
         \x20 After,\n\
         }\n",
    )]);

    let info = project.engine.enum_members(project.root(), &query("Bits")).unwrap();

    let values: Vec<(&str, &str, bool)> = info
        .members
        .iter()
        .map(|m| (m.name.as_str(), m.value.as_str(), m.is_computed))
        .collect();
    assert_eq!(
        values,
        vec![
            ("Low", "1 << 0", true),
            ("Next", "", true),
            ("Hex", "0x10", false),
            ("After", "17", false),
        ]
    );
    assert_eq!(info.members[1].line, 3);
}

#[test]
fn given_unary_initializers_when_inspecting_then_only_negation_stays_literal() {
    let project = setup_project(&[(
        "src/signs.ts",
        "export enum Signs {\n  Neg = -1,\n  Zero,\n  Inv = ~1,\n  Lost,\n  Pos = +1,\n}\n",
    )]);

    let info = project.engine.enum_members(project.root(), &query("Signs")).unwrap();

    let values: Vec<(&str, &str, bool)> = info
        .members
        .iter()
        .map(|m| (m.name.as_str(), m.value.as_str(), m.is_computed))
        .collect();
    assert_eq!(
        values,
        vec![
            ("Neg", "-1", false),
            ("Zero", "0", false),
            ("Inv", "~1", true),
            ("Lost", "", true),
            ("Pos", "+1", true),
        ]
    );
}

#[test]
fn given_auto_increment_after_seed_when_inspecting_then_values_continue() {
    let project = setup_project(&[(
        "src/levels.ts",
        "export const enum Level {\n  A = 5,\n  B,\n  C,\n}\n",
    )]);

    let info = project.engine.enum_members(project.root(), &query("Level")).unwrap();

    assert!(info.is_const);
    let values: Vec<&str> = info.members.iter().map(|m| m.value.as_str()).collect();
    assert_eq!(values, vec!["5", "6", "7"]);
    assert!(info.members.iter().all(|m| !m.is_computed));
}

#[test]
fn given_string_enum_when_inspecting_then_literals_are_kept() {
    let project = setup_project(&[(
        "src/colors.ts",
        "export enum Color {\n  Red = \"red\",\n  Green = 'green',\n}\n",
    )]);

    let info = project.engine.enum_members(project.root(), &query("Color")).unwrap();

    let values: Vec<&str> = info.members.iter().map(|m| m.value.as_str()).collect();
    assert_eq!(values, vec!["\"red\"", "'green'"]);
}

#[test]
fn given_class_when_inspecting_enum_then_invalid_argument() {
    let project = setup_project(&[("src/a.ts", "export class NotAnEnum {}\n")]);

    let err = project
        .engine
        .enum_members(project.root(), &query("NotAnEnum"))
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidArgument(_)));
}
