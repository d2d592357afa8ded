use super::symbol::SymbolRef;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One parameter (or the return value) and the user types flowing through it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeFlowEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_text: String,
    pub resolved_types: Vec<SymbolRef>,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeFlow {
    pub symbol: SymbolRef,
    pub parameters: Vec<TypeFlowEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeFlowEntry>,
    /// Union of every `resolved_types`, deduplicated and sorted by (file, line).
    pub referenced_types: Vec<SymbolRef>,
}
