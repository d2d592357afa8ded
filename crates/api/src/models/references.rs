use super::symbol::SymbolRef;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a reference uses the symbol. Variant order is classification precedence.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum UsageKind {
    Import,
    Call,
    Type,
    Write,
    Read,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceOptions {
    #[serde(default = "default_true")]
    pub include_tests: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl Default for ReferenceOptions {
    fn default() -> Self {
        Self {
            include_tests: true,
            timeout_ms: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileReferences {
    pub file_path: String,
    pub lines: Vec<u32>,
    pub usage_kinds: Vec<UsageKind>,
    pub is_test_file: bool,
}

/// A barrel module re-exporting the symbol.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReExport {
    pub exported_as: String,
    pub file: String,
    pub from: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSummary {
    pub symbol: SymbolRef,
    pub total_count: usize,
    pub file_count: usize,
    pub files: Vec<FileReferences>,
    pub re_exports: Vec<ReExport>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
}
