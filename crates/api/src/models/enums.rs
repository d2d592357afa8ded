use super::symbol::SymbolRef;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnumMemberInfo {
    pub name: String,
    pub value: String,
    pub line: u32,
    pub is_computed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnumInfo {
    pub symbol: SymbolRef,
    pub is_const: bool,
    pub members: Vec<EnumMemberInfo>,
}
