mod common;

use common::{query, query_in, setup_project};
use tracescope_api::{ReferenceOptions, StructureAnalyzer, UsageKind};

#[test]
fn given_usage_on_declaration_line_when_counting_then_declaration_site_is_excluded() {
    let project = setup_project(&[
        (
            "src/a.ts",
            "export const limit = 10; export const doubled = limit * 2;\n",
        ),
        (
            "src/b.ts",
            "import { limit } from \"./a\";\n\
             export function cap(v: number) {\n\
             \x20 return Math.min(v, limit);\n\
             }\n",
        ),
    ]);

    let summary = project
        .engine
        .references(project.root(), &query_in("limit", "src/a.ts"), &ReferenceOptions::default())
        .unwrap();

    assert_eq!(summary.total_count, 3);
    assert_eq!(summary.file_count, 2);
    assert_eq!(summary.files[0].file_path, "src/a.ts");
    assert_eq!(summary.files[0].lines, vec![1]);
    assert_eq!(summary.files[0].usage_kinds, vec![UsageKind::Read]);
    assert_eq!(summary.files[1].file_path, "src/b.ts");
    assert_eq!(summary.files[1].lines, vec![1, 3]);
    assert_eq!(summary.files[1].usage_kinds, vec![UsageKind::Import, UsageKind::Read]);
    assert!(!summary.partial);
}

#[test]
fn given_mixed_usages_when_classifying_then_call_type_and_write_are_distinguished() {
    let project = setup_project(&[(
        "src/user.ts",
        "export class User {}\n\
         let current: User | null = null;\n\
         export function login() {\n\
         \x20 current = new User();\n\
         }\n",
    )]);

    let summary = project
        .engine
        .references(project.root(), &query("User"), &ReferenceOptions::default())
        .unwrap();

    assert_eq!(summary.total_count, 2);
    assert_eq!(summary.files[0].lines, vec![2, 4]);
    assert_eq!(summary.files[0].usage_kinds, vec![UsageKind::Call, UsageKind::Type]);
}

#[test]
fn given_barrel_alias_when_searching_then_reexport_and_aliased_usage_are_reported() {
    let project = setup_project(&[
        ("src/a.ts", "export const limit = 10;\n"),
        ("src/index.ts", "export { limit as MAX } from \"./a\";\n"),
        (
            "src/c.ts",
            "import { MAX } from \"./index\";\nexport const half = MAX / 2;\n",
        ),
    ]);

    let summary = project
        .engine
        .references(project.root(), &query_in("limit", "src/a.ts"), &ReferenceOptions::default())
        .unwrap();

    assert_eq!(summary.re_exports.len(), 1);
    assert_eq!(summary.re_exports[0].exported_as, "MAX");
    assert_eq!(summary.re_exports[0].file, "src/index.ts");
    assert_eq!(summary.re_exports[0].from, "./a");
    let c = summary
        .files
        .iter()
        .find(|f| f.file_path == "src/c.ts")
        .expect("aliased usage in c.ts");
    assert_eq!(c.lines, vec![1, 2]);
}

#[test]
fn given_test_file_usage_when_tests_excluded_then_only_production_files_count() {
    let project = setup_project(&[
        ("src/math.ts", "export function add(a: number, b: number) { return a + b; }\n"),
        ("src/app.ts", "import { add } from \"./math\";\nexport const three = add(1, 2);\n"),
        (
            "src/math.test.ts",
            "import { add } from \"./math\";\nadd(2, 2);\n",
        ),
    ]);

    let all = project
        .engine
        .references(project.root(), &query("add"), &ReferenceOptions::default())
        .unwrap();
    assert_eq!(all.file_count, 2);
    let test_file = all.files.iter().find(|f| f.file_path == "src/math.test.ts").unwrap();
    assert!(test_file.is_test_file);

    let options = ReferenceOptions {
        include_tests: false,
        timeout_ms: None,
    };
    let production = project
        .engine
        .references(project.root(), &query("add"), &options)
        .unwrap();
    assert_eq!(production.file_count, 1);
    assert_eq!(production.files[0].file_path, "src/app.ts");
    assert_eq!(production.total_count, 2);
}

#[test]
fn given_shadowing_local_when_searching_then_unrelated_binding_is_ignored() {
    let project = setup_project(&[
        ("src/config.ts", "export const timeout = 30;\n"),
        (
            "src/worker.ts",
            "import { timeout } from \"./config\";\n\
             export function wait() {\n\
             \x20 const timeout = 5;\n\
             \x20 return timeout;\n\
             }\n\
             export const budget = timeout * 2;\n",
        ),
    ]);

    let summary = project
        .engine
        .references(project.root(), &query_in("timeout", "src/config.ts"), &ReferenceOptions::default())
        .unwrap();

    assert_eq!(summary.files.len(), 1);
    assert_eq!(summary.files[0].lines, vec![1, 6]);
}

#[test]
fn given_destructuring_default_when_classifying_then_default_value_is_a_read() {
    let project = setup_project(&[(
        "src/opts.ts",
        "export const fallback = 1;\n\
         export function pick(o: { v?: number }) {\n\
         \x20 const { v = fallback } = o;\n\
         \x20 return v;\n\
         }\n",
    )]);

    let summary = project
        .engine
        .references(project.root(), &query("fallback"), &ReferenceOptions::default())
        .unwrap();

    assert_eq!(summary.total_count, 1);
    assert_eq!(summary.files[0].lines, vec![3]);
    assert_eq!(summary.files[0].usage_kinds, vec![UsageKind::Read]);
}

#[test]
fn given_zero_timeout_when_searching_then_summary_is_partial() {
    let project = setup_project(&[
        ("src/a.ts", "export const limit = 10;\n"),
        ("src/b.ts", "import { limit } from \"./a\";\nexport const twice = limit * 2;\n"),
    ]);
    let options = ReferenceOptions {
        timeout_ms: Some(0),
        ..ReferenceOptions::default()
    };

    let summary = project
        .engine
        .references(project.root(), &query_in("limit", "src/a.ts"), &options)
        .unwrap();

    assert!(summary.partial);
    assert_eq!(summary.total_count, 0);
}
