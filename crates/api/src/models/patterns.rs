use super::symbol::SymbolRef;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Narrowing / guards
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum GuardKind {
    UserDefinedGuard,
    Assertion,
    Typeof,
    Instanceof,
    InOperator,
    Discriminant,
    Equality,
    Nullish,
    ArrayCheck,
    EarlyReturn,
    Exhaustiveness,
    Compound,
}

/// Whether an early-return guard bails out on the checked condition or
/// continues on it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GuardPolarity {
    Positive,
    Negative,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuardEntry {
    pub kind: GuardKind,
    pub line: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrowed_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarity: Option<GuardPolarity>,
    /// Sub-guard kinds of a compound guard.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<GuardKind>,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NarrowingAnalysis {
    pub symbol: SymbolRef,
    pub is_type_guard: bool,
    pub is_assertion: bool,
    pub guards: Vec<GuardEntry>,
}

// ---------------------------------------------------------------------------
// Callbacks / higher-order usage
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum CallbackVia {
    Identifier,
    MemberAccess,
    Bind,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallbackUsage {
    pub file_path: String,
    pub line: u32,
    /// Name of the call receiving the callable (`map`, `addEventListener`, ...).
    pub receiver: String,
    /// 0-based argument position.
    pub argument_index: usize,
    pub via: CallbackVia,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallbackAnalysis {
    pub symbol: SymbolRef,
    pub usages: Vec<CallbackUsage>,
    pub is_higher_order: bool,
    /// Parameters whose type is function-shaped.
    pub function_parameters: Vec<String>,
    pub returns_function: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
}

// ---------------------------------------------------------------------------
// Confusable / Unicode identifiers
// ---------------------------------------------------------------------------

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierReport {
    pub name: String,
    pub line: u32,
    /// Non-ASCII scripts present in the identifier.
    pub scripts: Vec<String>,
    pub mixed_script: bool,
    pub has_bidi: bool,
    pub has_zero_width: bool,
    pub nfc: String,
    pub is_nfc: bool,
    pub scope: String,
    pub severity: Severity,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfusablePair {
    pub first: String,
    pub first_line: u32,
    pub second: String,
    pub second_line: u32,
    pub skeleton: String,
    pub reason: String,
    pub severity: Severity,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfusableAnalysis {
    pub file_path: String,
    pub identifiers: Vec<IdentifierReport>,
    pub confusable_pairs: Vec<ConfusablePair>,
    /// Highest severity found, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_severity: Option<Severity>,
}
