mod common;

use common::{query, setup_project};
use tracescope_api::StructureAnalyzer;

const MODELS: &str = "export interface User {\n\
                      \x20 id: string;\n\
                      }\n\
                      export class Account {}\n\
                      export enum Role {\n\
                      \x20 Admin,\n\
                      \x20 Guest,\n\
                      }\n\
                      export type UserList = User[];\n";

#[test]
fn given_annotated_parameters_when_tracing_then_user_types_resolve_through_generics_and_unions() {
    let project = setup_project(&[
        ("src/models.ts", MODELS),
        (
            "src/service.ts",
            "import { User, Account, Role } from \"./models\";\n\
             export function promote(user: User, accounts: Account[], role: Role | null, note: string): Promise<User> {\n\
             \x20 return Promise.resolve(user);\n\
             }\n",
        ),
    ]);

    let flow = project.engine.type_flow(project.root(), &query("promote")).unwrap();

    let names: Vec<&str> = flow.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["user", "accounts", "role", "note"]);

    let user = &flow.parameters[0];
    assert_eq!(user.type_text, "User");
    assert_eq!(user.resolved_types.len(), 1);
    assert_eq!(user.resolved_types[0].name, "User");
    assert_eq!(user.resolved_types[0].file_path, "src/models.ts");
    assert_eq!(user.resolved_types[0].line, 1);

    assert_eq!(flow.parameters[1].type_text, "Account[]");
    assert_eq!(flow.parameters[1].resolved_types[0].name, "Account");
    assert_eq!(flow.parameters[2].resolved_types[0].name, "Role");
    assert!(flow.parameters[3].resolved_types.is_empty());

    let ret = flow.return_type.as_ref().expect("return entry");
    assert_eq!(ret.type_text, "Promise<User>");
    assert_eq!(ret.resolved_types[0].name, "User");
}

#[test]
fn given_repeated_types_when_tracing_then_referenced_types_is_sorted_deduplicated_union() {
    let project = setup_project(&[
        ("src/models.ts", MODELS),
        (
            "src/service.ts",
            "import { User, Account, Role } from \"./models\";\n\
             export function promote(user: User, accounts: Account[], role: Role | null): Promise<User> {\n\
             \x20 return Promise.resolve(user);\n\
             }\n",
        ),
    ]);

    let flow = project.engine.type_flow(project.root(), &query("promote")).unwrap();

    let referenced: Vec<(&str, u32)> = flow
        .referenced_types
        .iter()
        .map(|r| (r.name.as_str(), r.line))
        .collect();
    assert_eq!(referenced, vec![("User", 1), ("Account", 4), ("Role", 5)]);

    let mut union: Vec<(String, u32)> = flow
        .parameters
        .iter()
        .chain(flow.return_type.iter())
        .flat_map(|e| e.resolved_types.iter().map(|r| (r.file_path.clone(), r.line)))
        .collect();
    union.sort();
    union.dedup();
    let reported: Vec<(String, u32)> = flow
        .referenced_types
        .iter()
        .map(|r| (r.file_path.clone(), r.line))
        .collect();
    assert_eq!(reported, union);
}

#[test]
fn given_alias_parameter_when_tracing_then_alias_and_its_target_are_both_reported() {
    let project = setup_project(&[
        ("src/models.ts", MODELS),
        (
            "src/report.ts",
            "import type { UserList } from \"./models\";\n\
             export function count(users: UserList) {\n\
             \x20 return users.length;\n\
             }\n",
        ),
    ]);

    let flow = project.engine.type_flow(project.root(), &query("count")).unwrap();

    let names: Vec<&str> = flow.parameters[0]
        .resolved_types
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["User", "UserList"]);
}

#[test]
fn given_class_when_tracing_then_constructor_parameters_are_used_without_return() {
    let project = setup_project(&[
        ("src/models.ts", MODELS),
        (
            "src/repo.ts",
            "import { Account } from \"./models\";\n\
             export class Repo {\n\
             \x20 constructor(private readonly seed: Account) {}\n\
             }\n",
        ),
    ]);

    let flow = project.engine.type_flow(project.root(), &query("Repo")).unwrap();

    assert_eq!(flow.parameters.len(), 1);
    assert_eq!(flow.parameters[0].name, "seed");
    assert_eq!(flow.parameters[0].resolved_types[0].name, "Account");
    assert!(flow.return_type.is_none());
}
