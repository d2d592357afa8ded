use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The syntactic kind of a declaration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    TypeAlias,
    Enum,
    EnumMember,
    Variable,
    Parameter,
    Import,
    Constructor,
    Accessor,
    Property,
    Namespace,
    TypeParameter,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "typeAlias",
            SymbolKind::Enum => "enum",
            SymbolKind::EnumMember => "enumMember",
            SymbolKind::Variable => "variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Import => "import",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Accessor => "accessor",
            SymbolKind::Property => "property",
            SymbolKind::Namespace => "namespace",
            SymbolKind::TypeParameter => "typeParameter",
        }
    }

    /// Kinds that can be the target of a call or construct expression.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            SymbolKind::Function
                | SymbolKind::Method
                | SymbolKind::Constructor
                | SymbolKind::Class
                | SymbolKind::Accessor
        )
    }

    /// Kinds that introduce a type.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::TypeAlias
                | SymbolKind::Enum
                | SymbolKind::TypeParameter
        )
    }
}

impl TryFrom<&str> for SymbolKind {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let kind = match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "function" => SymbolKind::Function,
            "method" => SymbolKind::Method,
            "class" => SymbolKind::Class,
            "interface" => SymbolKind::Interface,
            "typealias" | "type" => SymbolKind::TypeAlias,
            "enum" => SymbolKind::Enum,
            "enummember" => SymbolKind::EnumMember,
            "variable" | "var" | "const" => SymbolKind::Variable,
            "parameter" | "param" => SymbolKind::Parameter,
            "import" => SymbolKind::Import,
            "constructor" => SymbolKind::Constructor,
            "accessor" => SymbolKind::Accessor,
            "property" | "field" => SymbolKind::Property,
            "namespace" | "module" => SymbolKind::Namespace,
            "typeparameter" => SymbolKind::TypeParameter,
            other => return Err(format!("unknown symbol kind '{}'", other)),
        };
        Ok(kind)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A serializable pointer to a declaration.
///
/// `file_path` is relative to the project root and always uses forward
/// slashes; `line` is 1-indexed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRef {
    pub name: String,
    pub file_path: String,
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_abstract: Option<bool>,
}

impl SymbolRef {
    pub fn new(name: impl Into<String>, file_path: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            file_path: file_path.into(),
            line,
            is_abstract: None,
        }
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract.then_some(true);
        self
    }

    /// Ordering key used by every sorted output list.
    pub fn location_key(&self) -> (&str, u32) {
        (&self.file_path, self.line)
    }
}

/// Identifies the symbol a query is about.
#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SymbolQuery {
    /// Plain (`validate`) or dotted (`UserService.save`) name.
    pub name: String,
    /// Optional file hint, absolute or relative to the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Optional 1-based line hint inside `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl SymbolQuery {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

/// Result of a plain symbol lookup.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocatedSymbol {
    pub symbol: SymbolRef,
    pub kind: SymbolKind,
    pub exported: bool,
    pub modifiers: Vec<String>,
    /// Additional merged declarations (interface + namespace, overloads).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged: Vec<SymbolRef>,
}
