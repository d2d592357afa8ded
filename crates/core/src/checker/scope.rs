//! Lexical name lookup as a chain of scopes, innermost first.

use super::{Decl, Symbol, SyntacticChecker, make_decl};
use crate::parser::syntax::{binding_names, block_declarations, parameters};
use crate::parser::utils::{has_token, named_children};
use crate::project::SourceFile;
use std::ops::ControlFlow;
use tracescope_api::SymbolKind;
use tree_sitter::Node;

/// Which declaration space a name is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meaning {
    Value,
    Type,
    Any,
}

impl Meaning {
    pub fn accepts(self, kind: SymbolKind) -> bool {
        match self {
            Meaning::Any => true,
            Meaning::Type => matches!(
                kind,
                SymbolKind::Class
                    | SymbolKind::Interface
                    | SymbolKind::TypeAlias
                    | SymbolKind::Enum
                    | SymbolKind::Namespace
                    | SymbolKind::TypeParameter
                    | SymbolKind::Import
            ),
            Meaning::Value => !matches!(
                kind,
                SymbolKind::Interface | SymbolKind::TypeAlias | SymbolKind::TypeParameter
            ),
        }
    }
}

pub struct ScopeContext<'a> {
    pub file: &'a SourceFile,
    pub node: Node<'a>,
    pub meaning: Meaning,
}

pub trait SemanticScope<'a> {
    fn resolve(&self, name: &str, context: &ScopeContext<'a>) -> Option<Vec<Decl<'a>>>;
    fn name(&self) -> &'static str;
}

/// Blocks, functions and the module itself, walking outwards from the node.
pub struct LocalScope;

/// Script files and `declare global` blocks anywhere in the project.
pub struct GlobalScope<'c, 'a> {
    pub checker: &'c SyntacticChecker<'a>,
}

impl<'a> SemanticScope<'a> for LocalScope {
    fn resolve(&self, name: &str, context: &ScopeContext<'a>) -> Option<Vec<Decl<'a>>> {
        let mut current = Some(context.node);
        while let Some(scope) = current {
            let found: Vec<Decl<'a>> = scope_declarations(context.file, scope, context.meaning)
                .into_iter()
                .filter(|d| d.name() == name)
                .collect();
            if !found.is_empty() {
                return Some(found);
            }
            current = scope.parent();
        }
        None
    }

    fn name(&self) -> &'static str {
        "Local"
    }
}

impl<'a> SemanticScope<'a> for GlobalScope<'_, 'a> {
    fn resolve(&self, name: &str, context: &ScopeContext<'a>) -> Option<Vec<Decl<'a>>> {
        let index = self.checker.index;
        let mut found = Vec::new();
        for id in index.files_with_token(name) {
            let file = index.file(*id);
            if file.id == context.file.id && !file.is_module {
                // Already covered by the local walk.
                continue;
            }
            let blocks: Vec<Node<'a>> = if file.is_module {
                global_augmentations(file.root_node())
            } else {
                vec![file.root_node()]
            };
            for block in blocks {
                found.extend(
                    statement_list_declarations(file, block, context.meaning)
                        .into_iter()
                        .filter(|d| d.name() == name),
                );
            }
        }
        (!found.is_empty()).then_some(found)
    }

    fn name(&self) -> &'static str {
        "Global"
    }
}

impl<'a> SyntacticChecker<'a> {
    fn active_scopes<'c>(&'c self) -> Vec<Box<dyn SemanticScope<'a> + 'c>> {
        vec![Box::new(LocalScope), Box::new(GlobalScope { checker: self })]
    }

    /// Looks `name` up from `at` outwards. Aliases are not followed.
    pub fn resolve_name(
        &self,
        file: &'a SourceFile,
        at: Node<'a>,
        name: &str,
        meaning: Meaning,
    ) -> Option<Symbol<'a>> {
        let context = ScopeContext {
            file,
            node: at,
            meaning,
        };
        let result = self.active_scopes().into_iter().try_fold((), |_, scope| {
            match scope.resolve(name, &context) {
                Some(decls) => {
                    tracing::trace!("'{}' resolved in {} scope", name, scope.name());
                    ControlFlow::Break(decls)
                }
                None => ControlFlow::Continue(()),
            }
        });
        match result {
            ControlFlow::Break(decls) => Symbol::new(decls),
            ControlFlow::Continue(()) => None,
        }
    }
}

/// Declarations a scope node introduces for names used inside it.
fn scope_declarations<'a>(file: &'a SourceFile, scope: Node<'a>, meaning: Meaning) -> Vec<Decl<'a>> {
    let mut out = Vec::new();
    match scope.kind() {
        "program" | "statement_block" | "class_static_block" => {
            out.extend(statement_list_declarations(file, scope, meaning));
        }
        "switch_case" | "switch_default" => {
            out.extend(statement_list_declarations(file, scope, meaning));
        }
        "for_statement" => {
            if let Some(init) = scope.child_by_field_name("initializer") {
                out.extend(variable_bindings(file, init));
            }
        }
        "for_in_statement" => {
            if let Some(left) = scope.child_by_field_name("left") {
                out.extend(binding_names(left).into_iter().map(|n| binding_decl(file, scope, n)));
            }
        }
        "catch_clause" => {
            if let Some(param) = scope.child_by_field_name("parameter") {
                out.extend(binding_names(param).into_iter().map(|n| binding_decl(file, scope, n)));
            }
        }
        _ => {}
    }

    if crate::parser::syntax::is_function_like(scope.kind()) {
        for param in parameters(scope) {
            if param.kind() == "identifier" {
                // `x => ...`
                out.push(Decl {
                    file,
                    kind: SymbolKind::Parameter,
                    node: param,
                    name_node: param,
                });
                continue;
            }
            let Some(pattern) = param.child_by_field_name("pattern") else {
                continue;
            };
            for name in binding_names(pattern) {
                out.push(make_decl(file, param, name).unwrap_or(Decl {
                    file,
                    kind: SymbolKind::Parameter,
                    node: param,
                    name_node: name,
                }));
            }
        }
        // Named function expressions see their own name.
        if matches!(scope.kind(), "function_expression" | "function" | "generator_function") {
            if let Some(name) = scope.child_by_field_name("name") {
                out.push(Decl {
                    file,
                    kind: SymbolKind::Function,
                    node: scope,
                    name_node: name,
                });
            }
        }
    }

    if meaning != Meaning::Value {
        if let Some(type_params) = scope.child_by_field_name("type_parameters") {
            for param in named_children(type_params) {
                if let Some(name) = param.child_by_field_name("name") {
                    if let Some(decl) = make_decl(file, param, name) {
                        out.push(decl);
                    }
                }
            }
        }
    }

    out.retain(|d| meaning.accepts(d.kind));
    out
}

/// Declarations and import bindings of a statement list.
fn statement_list_declarations<'a>(
    file: &'a SourceFile,
    block: Node<'a>,
    meaning: Meaning,
) -> Vec<Decl<'a>> {
    let mut out: Vec<Decl<'a>> = block_declarations(block)
        .into_iter()
        .filter_map(|(decl, name)| {
            make_decl(file, decl, name).or_else(|| {
                // Destructured variable bindings.
                (decl.kind() == "variable_declarator").then_some(Decl {
                    file,
                    kind: SymbolKind::Variable,
                    node: decl,
                    name_node: name,
                })
            })
        })
        .collect();
    out.extend(import_bindings(file, block));
    out.retain(|d| meaning.accepts(d.kind));
    out
}

/// Local names bound by the import statements of a statement list.
pub fn import_bindings<'a>(file: &'a SourceFile, block: Node<'a>) -> Vec<Decl<'a>> {
    let mut out = Vec::new();
    for stmt in named_children(block) {
        if stmt.kind() != "import_statement" {
            continue;
        }
        for child in named_children(stmt) {
            match child.kind() {
                "import_clause" => {
                    for part in named_children(child) {
                        match part.kind() {
                            "identifier" => out.push(Decl {
                                file,
                                kind: SymbolKind::Import,
                                node: part,
                                name_node: part,
                            }),
                            "named_imports" => {
                                for spec in named_children(part) {
                                    if spec.kind() != "import_specifier" {
                                        continue;
                                    }
                                    let name = spec
                                        .child_by_field_name("alias")
                                        .or_else(|| spec.child_by_field_name("name"));
                                    if let Some(name) = name {
                                        out.push(Decl {
                                            file,
                                            kind: SymbolKind::Import,
                                            node: spec,
                                            name_node: name,
                                        });
                                    }
                                }
                            }
                            "namespace_import" => {
                                if let Some(name) =
                                    named_children(part).into_iter().find(|c| c.kind() == "identifier")
                                {
                                    out.push(Decl {
                                        file,
                                        kind: SymbolKind::Import,
                                        node: part,
                                        name_node: name,
                                    });
                                }
                            }
                            _ => {}
                        }
                    }
                }
                "import_require_clause" => {
                    if let Some(name) =
                        named_children(child).into_iter().find(|c| c.kind() == "identifier")
                    {
                        out.push(Decl {
                            file,
                            kind: SymbolKind::Import,
                            node: child,
                            name_node: name,
                        });
                    }
                }
                _ => {}
            }
        }
    }
    out
}

fn variable_bindings<'a>(file: &'a SourceFile, decl_list: Node<'a>) -> Vec<Decl<'a>> {
    let mut out = Vec::new();
    for declarator in named_children(decl_list) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        if let Some(pattern) = declarator.child_by_field_name("name") {
            for name in binding_names(pattern) {
                out.push(Decl {
                    file,
                    kind: SymbolKind::Variable,
                    node: declarator,
                    name_node: name,
                });
            }
        }
    }
    out
}

fn binding_decl<'a>(file: &'a SourceFile, holder: Node<'a>, name: Node<'a>) -> Decl<'a> {
    Decl {
        file,
        kind: SymbolKind::Variable,
        node: holder,
        name_node: name,
    }
}

/// `declare global { ... }` bodies of a module file.
pub fn global_augmentations(root: Node<'_>) -> Vec<Node<'_>> {
    named_children(root)
        .into_iter()
        .filter(|stmt| stmt.kind() == "ambient_declaration" && has_token(*stmt, "global"))
        .filter_map(|stmt| {
            named_children(stmt)
                .into_iter()
                .find(|c| c.kind() == "statement_block")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meaning_filters_declaration_spaces() {
        assert!(Meaning::Type.accepts(SymbolKind::Interface));
        assert!(!Meaning::Type.accepts(SymbolKind::Function));
        assert!(Meaning::Value.accepts(SymbolKind::Class));
        assert!(!Meaning::Value.accepts(SymbolKind::TypeAlias));
        assert!(Meaning::Any.accepts(SymbolKind::TypeParameter));
    }
}
