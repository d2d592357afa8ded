mod common;

use common::{setup_project, write};
use tracescope_api::{ApiError, Confidence, DeadCodeOptions, ProjectScanner, SymbolKind};
use tracescope_core::TraceEngine;
use tracescope_core::config::EngineConfig;

fn library_project() -> common::TestProject {
    setup_project(&[
        (
            "src/lib.ts",
            "export function used() { return 1; }\n\
             export function unused() { return 2; }\n\
             export interface Unread { x: number }\n\
             function localHelper() { return 3; }\n\
             function localUsed() { return 4; }\n\
             export const value = localUsed();\n",
        ),
        (
            "src/app.ts",
            "import { used, value } from \"./lib\";\nconsole.log(used(), value);\n",
        ),
        (
            "src/lib.test.ts",
            "import { used } from \"./lib\";\nexport function fixture() { return used(); }\n",
        ),
    ])
}

fn names(report: &tracescope_api::DeadCodeReport) -> Vec<&str> {
    report.items.iter().map(|i| i.name.as_str()).collect()
}

#[test]
fn given_default_options_when_scanning_then_unreferenced_exports_are_reported() {
    let project = library_project();

    let report = project
        .engine
        .dead_code(project.root(), &DeadCodeOptions::default())
        .unwrap();

    assert_eq!(names(&report), vec!["unused", "Unread"]);
    let unused = &report.items[0];
    assert_eq!(unused.file, "src/lib.ts");
    assert_eq!(unused.line, 2);
    assert_eq!(unused.kind, SymbolKind::Function);
    assert!(unused.exported);
    assert_eq!(unused.confidence, Confidence::High);
    assert_eq!(unused.reason, "exported but never referenced");

    assert_eq!(report.summary.found, 2);
    assert_eq!(report.summary.scanned_files, 2);
    assert!(!report.summary.partial);
    assert!(!report.summary.timed_out);
}

#[test]
fn given_inclusive_mode_when_scanning_then_unreferenced_locals_are_added() {
    let project = library_project();
    let options = DeadCodeOptions {
        inclusive: true,
        ..Default::default()
    };

    let report = project.engine.dead_code(project.root(), &options).unwrap();

    assert_eq!(names(&report), vec!["unused", "Unread", "localHelper"]);
    let local = &report.items[2];
    assert!(!local.exported);
    assert_eq!(local.confidence, Confidence::High);
    assert_eq!(local.reason, "never referenced");
}

#[test]
fn given_kind_filter_when_scanning_then_only_matching_kinds_are_reported() {
    let project = library_project();
    let options = DeadCodeOptions {
        kinds: vec![SymbolKind::Interface],
        ..Default::default()
    };

    let report = project.engine.dead_code(project.root(), &options).unwrap();

    assert_eq!(names(&report), vec!["Unread"]);
}

#[test]
fn given_result_cap_when_reached_then_report_is_partial() {
    let project = library_project();
    let options = DeadCodeOptions {
        max_results: Some(1),
        ..Default::default()
    };

    let report = project.engine.dead_code(project.root(), &options).unwrap();

    assert_eq!(report.items.len(), 1);
    assert!(report.summary.partial);
    assert!(!report.summary.timed_out);
}

#[test]
fn given_exclude_glob_when_scanning_then_matching_files_are_skipped() {
    let project = library_project();
    let options = DeadCodeOptions {
        exclude: vec!["src/lib.ts".to_string()],
        ..Default::default()
    };

    let report = project.engine.dead_code(project.root(), &options).unwrap();

    assert!(report.items.is_empty());
    assert_eq!(report.summary.scanned_files, 1);
}

#[test]
fn given_test_files_when_requested_then_their_declarations_are_scanned() {
    let project = library_project();
    let options = DeadCodeOptions {
        include_tests: true,
        ..Default::default()
    };

    let report = project.engine.dead_code(project.root(), &options).unwrap();

    let fixture = report
        .items
        .iter()
        .find(|i| i.name == "fixture")
        .expect("test helper is unreferenced");
    assert_eq!(fixture.file, "src/lib.test.ts");
    assert_eq!(report.summary.scanned_files, 3);
}

#[test]
fn given_malformed_glob_when_scanning_then_invalid_argument() {
    let project = library_project();
    let options = DeadCodeOptions {
        include: vec!["src/[".to_string()],
        ..Default::default()
    };

    let err = project.engine.dead_code(project.root(), &options).unwrap_err();

    assert!(matches!(err, ApiError::InvalidArgument(_)), "got {err:?}");
}

#[test]
fn given_engine_config_cap_when_options_leave_it_unset_then_config_applies() {
    let project = library_project();
    let engine = TraceEngine::with_config(EngineConfig {
        dead_code_max_results: 1,
        ..Default::default()
    });

    let report = engine
        .dead_code(project.root(), &DeadCodeOptions::default())
        .unwrap();

    assert_eq!(report.items.len(), 1);
    assert!(report.summary.partial);
}

#[test]
fn given_project_config_file_when_scanning_then_custom_test_patterns_apply() {
    let project = library_project();
    write(
        project.root(),
        ".tracescope.json",
        "{\n  // everything under src/fixtures is test support\n  testFilePatterns: [\"(^|/)fixtures/\"],\n}\n",
    );
    write(project.root(), "src/fixtures/data.ts", "export const sample = 1;\n");

    let report = project
        .engine
        .dead_code(project.root(), &DeadCodeOptions::default())
        .unwrap();

    assert!(report.items.iter().all(|i| i.name != "sample"));
    // lib.test.ts no longer matches the replaced patterns.
    assert!(report.items.iter().any(|i| i.name == "fixture"));
}

#[test]
fn given_declaration_exported_through_local_clause_when_scanning_then_it_is_reported() {
    let project = setup_project(&[
        ("src/b.ts", "function unused() {}\nexport { unused };\nexport function alsoUnused() {}\n"),
        ("src/c.ts", "function kept() {}\nexport { kept as renamed };\n"),
        ("src/d.ts", "import { renamed } from \"./c\";\nrenamed();\n"),
    ]);

    let report = project
        .engine
        .dead_code(project.root(), &DeadCodeOptions::default())
        .unwrap();

    let found: Vec<(&str, &str)> = report.items.iter().map(|i| (i.name.as_str(), i.file.as_str())).collect();
    assert_eq!(found, vec![("unused", "src/b.ts"), ("alsoUnused", "src/b.ts")]);
    assert!(report.items[0].exported);
}

#[test]
fn given_zero_timeout_when_scanning_then_report_is_timed_out_and_partial() {
    let project = library_project();
    let options = DeadCodeOptions {
        timeout_ms: Some(0),
        ..Default::default()
    };

    let report = project.engine.dead_code(project.root(), &options).unwrap();

    assert!(report.summary.timed_out);
    assert!(report.summary.partial);
    assert!(report.items.is_empty());
}

#[test]
fn given_root_nested_under_vendor_dir_when_scanning_then_project_files_still_count() {
    let project = setup_project(&[
        ("node_modules/app/src/lib.ts", "export function orphan() {}\n"),
        ("node_modules/app/node_modules/dep/index.ts", "export function vendored() {}\n"),
    ]);
    let root = project.root().join("node_modules/app");

    let report = project
        .engine
        .dead_code(&root, &DeadCodeOptions::default())
        .unwrap();

    assert_eq!(names(&report), vec!["orphan"]);
    assert_eq!(report.summary.scanned_files, 1);
}
