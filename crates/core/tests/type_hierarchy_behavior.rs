mod common;

use common::{query, query_in, setup_project};
use tracescope_api::{ApiError, HierarchyOptions, StructureAnalyzer, SymbolKind};

fn shapes_project() -> common::TestProject {
    setup_project(&[
        (
            "src/shapes.ts",
            "export interface Named {\n\
             \x20 name(): string;\n\
             }\n\
             export abstract class Shape<T extends object = {}> {\n\
             \x20 abstract area(): number;\n\
             }\n\
             export class Circle extends Shape implements Named {\n\
             \x20 area() { return 3; }\n\
             \x20 name() { return \"circle\"; }\n\
             }\n",
        ),
        (
            "src/other.ts",
            "export class Shape {}\n\
             export class Square extends Shape {}\n",
        ),
    ])
}

#[test]
fn given_abstract_generic_base_when_querying_then_subtypes_are_resolved_by_declaration() {
    let project = shapes_project();

    let hierarchy = project
        .engine
        .type_hierarchy(project.root(), &query_in("Shape", "src/shapes.ts"), &HierarchyOptions::default())
        .unwrap();

    assert_eq!(hierarchy.kind, SymbolKind::Class);
    assert_eq!(hierarchy.is_abstract, Some(true));
    assert!(hierarchy.extends.is_none());
    // Square extends the unrelated Shape in other.ts.
    let subtypes: Vec<(&str, &str)> = hierarchy
        .subtypes
        .iter()
        .map(|s| (s.name.as_str(), s.file_path.as_str()))
        .collect();
    assert_eq!(subtypes, vec![("Circle", "src/shapes.ts")]);

    assert_eq!(hierarchy.type_parameters.len(), 1);
    let t = &hierarchy.type_parameters[0];
    assert_eq!(t.name, "T");
    assert_eq!(t.constraint.as_deref(), Some("object"));
    assert_eq!(t.default.as_deref(), Some("{}"));
    assert!(!hierarchy.partial);
}

#[test]
fn given_subclass_when_querying_then_supertypes_are_reported() {
    let project = shapes_project();

    let hierarchy = project
        .engine
        .type_hierarchy(project.root(), &query("Circle"), &HierarchyOptions::default())
        .unwrap();

    let extends = hierarchy.extends.expect("Circle extends Shape");
    assert_eq!(extends.name, "Shape");
    assert_eq!(extends.file_path, "src/shapes.ts");
    assert_eq!(extends.line, 4);
    assert_eq!(hierarchy.implements.len(), 1);
    assert_eq!(hierarchy.implements[0].name, "Named");
    assert!(hierarchy.subtypes.is_empty());
    assert_eq!(hierarchy.is_abstract, None);
}

#[test]
fn given_interface_when_querying_then_implementing_classes_are_subtypes() {
    let project = shapes_project();

    let hierarchy = project
        .engine
        .type_hierarchy(project.root(), &query("Named"), &HierarchyOptions::default())
        .unwrap();

    assert_eq!(hierarchy.kind, SymbolKind::Interface);
    assert_eq!(hierarchy.subtypes.len(), 1);
    assert_eq!(hierarchy.subtypes[0].name, "Circle");
    assert!(hierarchy.type_parameters.is_empty());
}

#[test]
fn given_function_when_querying_hierarchy_then_invalid_argument() {
    let project = setup_project(&[("src/f.ts", "export function area() { return 1; }\n")]);

    let err = project
        .engine
        .type_hierarchy(project.root(), &query("area"), &HierarchyOptions::default())
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidArgument(_)), "got {err:?}");
}

#[test]
fn given_zero_timeout_when_collecting_subtypes_then_hierarchy_is_partial() {
    let project = shapes_project();
    let options = HierarchyOptions { timeout_ms: Some(0) };

    let hierarchy = project
        .engine
        .type_hierarchy(project.root(), &query_in("Shape", "src/shapes.ts"), &options)
        .unwrap();

    assert!(hierarchy.partial);
    assert!(hierarchy.subtypes.is_empty());
}
