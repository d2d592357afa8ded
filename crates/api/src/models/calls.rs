use super::symbol::SymbolRef;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which halves of the call hierarchy to compute.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Outgoing,
    Incoming,
    #[default]
    Both,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallHierarchyOptions {
    /// `1` = direct calls only, `-1` = unlimited, `N` = N hops.
    #[serde(default = "default_depth")]
    pub depth: i32,
    #[serde(default)]
    pub direction: CallDirection,
}

fn default_depth() -> i32 {
    1
}

impl Default for CallHierarchyOptions {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            direction: CallDirection::Both,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingCall {
    pub target: SymbolRef,
    pub call_site_lines: Vec<u32>,
    pub outgoing_calls: Vec<OutgoingCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cyclic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_limited: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncomingCall {
    pub source: SymbolRef,
    pub call_site_lines: Vec<u32>,
    pub incoming_callers: Vec<IncomingCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cyclic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_limited: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallHierarchy {
    pub symbol: SymbolRef,
    pub depth: i32,
    pub outgoing_calls: Vec<OutgoingCall>,
    pub incoming_callers: Vec<IncomingCall>,
}
