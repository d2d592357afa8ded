use crate::error::{Result, TracescopeError};
use std::path::Path;
use tree_sitter::{Language, Parser, Tree};

pub mod syntax;
pub mod utils;

/// Source dialect, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    TypeScript,
    Tsx,
}

impl Dialect {
    pub fn for_path(path: &Path) -> Dialect {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") | Some("jsx") => Dialect::Tsx,
            _ => Dialect::TypeScript,
        }
    }
}

/// Thin wrapper over the tree-sitter TypeScript grammars.
///
/// JavaScript files are parsed with the TypeScript grammar (a superset), and
/// `.jsx` with the TSX grammar.
#[derive(Clone)]
pub struct TsParser {
    typescript: Language,
    tsx: Language,
}

impl TsParser {
    pub fn new() -> Self {
        Self {
            typescript: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tsx: tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    pub fn language(&self, dialect: Dialect) -> &Language {
        match dialect {
            Dialect::TypeScript => &self.typescript,
            Dialect::Tsx => &self.tsx,
        }
    }

    pub fn parse(&self, source: &str, path: &Path) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(self.language(Dialect::for_path(path)))
            .map_err(|e| TracescopeError::Parsing(format!("grammar load failed: {}", e)))?;
        parser
            .parse(source, None)
            .ok_or_else(|| TracescopeError::Parsing(format!("failed to parse {}", path.display())))
    }
}

impl Default for TsParser {
    fn default() -> Self {
        Self::new()
    }
}
