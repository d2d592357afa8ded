mod common;

use common::{query, query_in, setup_project};
use tracescope_api::{CallDirection, CallHierarchyOptions, StructureAnalyzer};

fn depth(depth: i32) -> CallHierarchyOptions {
    CallHierarchyOptions {
        depth,
        direction: CallDirection::Both,
    }
}

#[test]
fn given_direct_caller_and_callee_when_depth_one_then_boundary_is_marked_depth_limited() {
    let project = setup_project(&[
        (
            "src/validate.ts",
            "import { clean } from \"./util\";\n\
             export function sanitize(u: string): string {\n\
             \x20 return clean(u);\n\
             }\n\
             export function validate(u: string): string {\n\
             \x20 return sanitize(u);\n\
             }\n",
        ),
        (
            "src/util.ts",
            "export function clean(s: string): string {\n  return s.trim();\n}\n",
        ),
        (
            "src/server.ts",
            "import { validate } from \"./validate\";\n\
             export function processRequest(body: string) {\n\
             \x20 return validate(body);\n\
             }\n",
        ),
    ]);

    let result = project
        .engine
        .call_hierarchy(project.root(), &query("validate"), &depth(1))
        .unwrap();

    assert_eq!(result.symbol.name, "validate");
    assert_eq!(result.symbol.file_path, "src/validate.ts");
    assert_eq!(result.outgoing_calls.len(), 1);
    let sanitize = &result.outgoing_calls[0];
    assert_eq!(sanitize.target.name, "sanitize");
    assert_eq!(sanitize.call_site_lines, vec![6]);
    assert_eq!(sanitize.depth_limited, Some(true));
    assert!(sanitize.outgoing_calls.is_empty());

    assert_eq!(result.incoming_callers.len(), 1);
    let caller = &result.incoming_callers[0];
    assert_eq!(caller.source.name, "processRequest");
    assert_eq!(caller.source.file_path, "src/server.ts");
    assert_eq!(caller.call_site_lines, vec![3]);
    assert_eq!(caller.depth_limited, None);
}

#[test]
fn given_leaf_callee_when_depth_one_then_depth_limited_is_absent() {
    let project = setup_project(&[(
        "src/a.ts",
        "export function leaf() { return 1; }\nexport function root() { return leaf() + leaf(); }\n",
    )]);

    let result = project
        .engine
        .call_hierarchy(project.root(), &query("root"), &depth(1))
        .unwrap();

    assert_eq!(result.outgoing_calls.len(), 1);
    assert_eq!(result.outgoing_calls[0].call_site_lines, vec![2]);
    assert_eq!(result.outgoing_calls[0].depth_limited, None);
    assert_eq!(result.outgoing_calls[0].cyclic, None);
}

#[test]
fn given_mutual_recursion_when_unlimited_depth_then_cycle_entry_is_marked_once() {
    let project = setup_project(&[(
        "src/cycle.ts",
        "export function ping(n: number): number {\n\
         \x20 return n > 0 ? pong(n - 1) : 0;\n\
         }\n\
         export function pong(n: number): number {\n\
         \x20 return ping(n);\n\
         }\n",
    )]);

    let result = project
        .engine
        .call_hierarchy(project.root(), &query("ping"), &depth(-1))
        .unwrap();

    let pong = &result.outgoing_calls[0];
    assert_eq!(pong.target.name, "pong");
    assert_eq!(pong.cyclic, None);
    assert_eq!(pong.outgoing_calls.len(), 1);
    let back = &pong.outgoing_calls[0];
    assert_eq!(back.target.name, "ping");
    assert_eq!(back.cyclic, Some(true));
    assert!(back.outgoing_calls.is_empty());

    // ping <- pong <- ping
    let incoming = &result.incoming_callers[0];
    assert_eq!(incoming.source.name, "pong");
    assert_eq!(incoming.incoming_callers[0].source.name, "ping");
    assert_eq!(incoming.incoming_callers[0].cyclic, Some(true));
}

#[test]
fn given_self_recursion_when_unlimited_depth_then_terminates_with_cyclic_edge() {
    let project = setup_project(&[(
        "src/solo.ts",
        "export function countdown(n: number): number {\n  return n <= 0 ? 0 : countdown(n - 1);\n}\n",
    )]);

    let result = project
        .engine
        .call_hierarchy(project.root(), &query("countdown"), &depth(-1))
        .unwrap();

    assert_eq!(result.outgoing_calls.len(), 1);
    assert_eq!(result.outgoing_calls[0].cyclic, Some(true));
    assert_eq!(result.incoming_callers.len(), 1);
    assert_eq!(result.incoming_callers[0].cyclic, Some(true));
}

#[test]
fn given_chain_when_depth_two_then_expands_two_levels() {
    let project = setup_project(&[(
        "src/chain.ts",
        "export function a() { b(); }\n\
         export function b() { c(); }\n\
         export function c() { d(); }\n\
         export function d() {}\n",
    )]);

    let options = CallHierarchyOptions {
        depth: 2,
        direction: CallDirection::Outgoing,
    };
    let result = project
        .engine
        .call_hierarchy(project.root(), &query("a"), &options)
        .unwrap();

    assert!(result.incoming_callers.is_empty());
    let b = &result.outgoing_calls[0];
    assert_eq!(b.target.name, "b");
    assert_eq!(b.depth_limited, None);
    let c = &b.outgoing_calls[0];
    assert_eq!(c.target.name, "c");
    assert_eq!(c.depth_limited, Some(true));
    assert!(c.outgoing_calls.is_empty());
}

#[test]
fn given_method_calling_this_member_when_outgoing_then_resolves_to_class_member() {
    let project = setup_project(&[(
        "src/service.ts",
        "export class Service {\n\
         \x20 run() {\n\
         \x20   return this.helper();\n\
         \x20 }\n\
         \x20 helper() {\n\
         \x20   return 1;\n\
         \x20 }\n\
         }\n",
    )]);

    let result = project
        .engine
        .call_hierarchy(project.root(), &query_in("Service.run", "src/service.ts"), &depth(1))
        .unwrap();

    assert_eq!(result.symbol.name, "Service.run");
    assert_eq!(result.outgoing_calls.len(), 1);
    assert_eq!(result.outgoing_calls[0].target.name, "Service.helper");
    assert_eq!(result.outgoing_calls[0].target.line, 5);
}

#[test]
fn given_calls_inside_callback_when_incoming_then_enclosing_named_function_is_caller() {
    let project = setup_project(&[(
        "src/batch.ts",
        "export function save(x: number) { return x; }\n\
         export function saveAll(xs: number[]) {\n\
         \x20 return xs.map((x) => save(x));\n\
         }\n\
         save(0);\n",
    )]);

    let options = CallHierarchyOptions {
        depth: 1,
        direction: CallDirection::Incoming,
    };
    let result = project
        .engine
        .call_hierarchy(project.root(), &query("save"), &options)
        .unwrap();

    // The top-level call has no enclosing callable.
    assert_eq!(result.incoming_callers.len(), 1);
    assert_eq!(result.incoming_callers[0].source.name, "saveAll");
    assert_eq!(result.incoming_callers[0].call_site_lines, vec![3]);
}
