use super::symbol::SymbolKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeadCodeOptions {
    /// Also test non-exported top-level declarations.
    #[serde(default)]
    pub inclusive: bool,
    #[serde(default)]
    pub include_tests: bool,
    /// Restrict to these kinds; empty means all.
    #[serde(default)]
    pub kinds: Vec<SymbolKind>,
    /// Glob patterns (root-relative) a file must match to be scanned.
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for DeadCodeOptions {
    fn default() -> Self {
        Self {
            inclusive: false,
            include_tests: false,
            kinds: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            max_results: None,
            timeout_ms: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeadCodeItem {
    pub name: String,
    pub kind: SymbolKind,
    pub file: String,
    pub line: u32,
    pub exported: bool,
    pub confidence: Confidence,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeadCodeSummary {
    pub scanned_files: usize,
    pub scanned_declarations: usize,
    pub found: usize,
    pub partial: bool,
    pub timed_out: bool,
    pub elapsed_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeadCodeReport {
    pub items: Vec<DeadCodeItem>,
    pub summary: DeadCodeSummary,
}
