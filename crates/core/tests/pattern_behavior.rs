mod common;

use common::{query, setup_project};
use tracescope_api::{CallbackVia, GuardKind, GuardPolarity, PatternAnalyzer, Severity};

const PETS: &str = "interface Cat { meow(): void }\n\
                    interface Dog { bark(): void }\n\
                    type Pet = Cat | Dog;\n\
                    export function isCat(p: Pet): p is Cat {\n\
                    \x20 return \"meow\" in p;\n\
                    }\n\
                    type Shape = { kind: \"circle\"; r: number } | { kind: \"square\"; s: number };\n\
                    export function describe(p: Pet | null, v: unknown, s: Shape) {\n\
                    \x20 if (p == null) return \"none\";\n\
                    \x20 if (typeof v === \"string\") {\n\
                    \x20   console.log(v);\n\
                    \x20 }\n\
                    \x20 if (isCat(p)) {\n\
                    \x20   p.meow();\n\
                    \x20 }\n\
                    \x20 switch (s.kind) {\n\
                    \x20   case \"circle\":\n\
                    \x20     return s.r;\n\
                    \x20   case \"square\":\n\
                    \x20     return s.s;\n\
                    \x20 }\n\
                    }\n\
                    export function keep(p: Pet | null) {\n\
                    \x20 if (p != null) return p;\n\
                    \x20 throw new Error(\"missing\");\n\
                    }\n";

#[test]
fn given_mixed_guards_when_analyzing_then_each_narrowing_form_is_classified() {
    let project = setup_project(&[("src/pets.ts", PETS)]);

    let analysis = project.engine.narrowing(project.root(), &query("describe")).unwrap();

    assert!(!analysis.is_type_guard);
    let kinds: Vec<(u32, GuardKind)> = analysis.guards.iter().map(|g| (g.line, g.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (9, GuardKind::EarlyReturn),
            (10, GuardKind::Typeof),
            (13, GuardKind::UserDefinedGuard),
            (17, GuardKind::Discriminant),
            (19, GuardKind::Discriminant),
        ]
    );

    let early = &analysis.guards[0];
    assert_eq!(early.polarity, Some(GuardPolarity::Negative));
    assert_eq!(early.variable.as_deref(), Some("p"));
    assert_eq!(early.components, vec![GuardKind::Nullish]);

    let typeof_guard = &analysis.guards[1];
    assert_eq!(typeof_guard.variable.as_deref(), Some("v"));
    assert_eq!(typeof_guard.narrowed_to.as_deref(), Some("string"));

    let user_guard = &analysis.guards[2];
    assert_eq!(user_guard.variable.as_deref(), Some("p"));
    assert_eq!(user_guard.narrowed_to.as_deref(), Some("Cat"));

    assert_eq!(analysis.guards[3].variable.as_deref(), Some("s"));
}

#[test]
fn given_inequality_guard_clause_when_analyzing_then_polarity_is_positive() {
    let project = setup_project(&[("src/pets.ts", PETS)]);

    let analysis = project.engine.narrowing(project.root(), &query("keep")).unwrap();

    assert_eq!(analysis.guards.len(), 1);
    assert_eq!(analysis.guards[0].kind, GuardKind::EarlyReturn);
    assert_eq!(analysis.guards[0].polarity, Some(GuardPolarity::Positive));
}

#[test]
fn given_type_predicate_when_analyzing_then_function_is_a_type_guard() {
    let project = setup_project(&[("src/pets.ts", PETS)]);

    let analysis = project.engine.narrowing(project.root(), &query("isCat")).unwrap();

    assert!(analysis.is_type_guard);
    assert!(!analysis.is_assertion);
    let first = &analysis.guards[0];
    assert_eq!(first.kind, GuardKind::UserDefinedGuard);
    assert_eq!(first.line, 4);
    assert_eq!(first.variable.as_deref(), Some("p"));
    assert_eq!(first.narrowed_to.as_deref(), Some("Cat"));
    assert!(analysis.guards.iter().any(|g| g.kind == GuardKind::InOperator && g.line == 5));
}

#[test]
fn given_function_passed_by_reference_when_analyzing_callbacks_then_receivers_are_listed() {
    let project = setup_project(&[
        (
            "src/fmt.ts",
            "export function format(n: number): string {\n  return String(n);\n}\n",
        ),
        (
            "src/app.ts",
            "import { format } from \"./fmt\";\n\
             export const labels = [1, 2].map(format);\n\
             setTimeout(format, 10);\n\
             format(3);\n",
        ),
    ]);

    let analysis = project.engine.callbacks(project.root(), &query("format")).unwrap();

    let usages: Vec<(&str, u32, &str, usize)> = analysis
        .usages
        .iter()
        .map(|u| (u.file_path.as_str(), u.line, u.receiver.as_str(), u.argument_index))
        .collect();
    assert_eq!(
        usages,
        vec![("src/app.ts", 2, "map", 0), ("src/app.ts", 3, "setTimeout", 0)]
    );
    assert!(analysis.usages.iter().all(|u| u.via == CallbackVia::Identifier));
    assert!(!analysis.is_higher_order);
    assert!(analysis.function_parameters.is_empty());
    assert!(!analysis.returns_function);
}

#[test]
fn given_function_typed_parameter_and_return_when_analyzing_then_higher_order_is_reported() {
    let project = setup_project(&[(
        "src/hof.ts",
        "export function twice(fn: (x: number) => number, times: number): (x: number) => number {\n\
         \x20 return (x) => fn(fn(x));\n\
         }\n",
    )]);

    let analysis = project.engine.callbacks(project.root(), &query("twice")).unwrap();

    assert!(analysis.is_higher_order);
    assert_eq!(analysis.function_parameters, vec!["fn".to_string()]);
    assert!(analysis.returns_function);
    assert!(analysis.usages.is_empty());
}

#[test]
fn given_cyrillic_lookalike_when_scanning_file_then_pair_is_critical() {
    let project = setup_project(&[(
        "src/score.ts",
        "export const score = 1;\nexport const s\u{0441}ore = 2;\n",
    )]);

    let analysis = project.engine.confusables(project.root(), "src/score.ts").unwrap();

    assert_eq!(analysis.file_path, "src/score.ts");
    assert_eq!(analysis.confusable_pairs.len(), 1);
    let pair = &analysis.confusable_pairs[0];
    assert_eq!(pair.first, "score");
    assert_eq!(pair.first_line, 1);
    assert_eq!(pair.second_line, 2);
    assert_eq!(pair.skeleton, "score");
    assert!(pair.reason.contains("Cyrillic"), "reason: {}", pair.reason);
    assert_eq!(analysis.max_severity, Some(Severity::Critical));

    // Only the non-ASCII spelling is reported as an identifier.
    assert_eq!(analysis.identifiers.len(), 1);
    let lookalike = &analysis.identifiers[0];
    assert_eq!(lookalike.line, 2);
    assert!(lookalike.mixed_script);
    assert_eq!(lookalike.scripts, vec!["Latin".to_string(), "Cyrillic".to_string()]);
    assert_eq!(lookalike.scope, "module");
}

#[test]
fn given_ascii_only_file_when_scanning_then_nothing_is_reported() {
    let project = setup_project(&[("src/plain.ts", "export const total = 1;\n")]);

    let analysis = project.engine.confusables(project.root(), "src/plain.ts").unwrap();

    assert!(analysis.identifiers.is_empty());
    assert!(analysis.confusable_pairs.is_empty());
    assert_eq!(analysis.max_severity, None);
}

#[test]
fn given_unindexed_file_when_scanning_confusables_then_error() {
    let project = setup_project(&[("src/plain.ts", "export const total = 1;\n")]);

    let result = project.engine.confusables(project.root(), "src/missing.ts");

    assert!(result.is_err());
}
