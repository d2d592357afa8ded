pub mod analyzer;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use analyzer::{
    IndexLifecycle, PatternAnalyzer, ProjectScanner, StructureAnalyzer, SymbolLocatorService,
};
pub use error::{ApiError, ApiResult, ErrorCode, ErrorInfo, QueryResponse};
pub use models::*;

/// Composite trait representing the full tracescope analysis API.
/// This allows hosts to depend on a single trait instead of multiple individual ones.
pub trait TraceAnalyzer:
    SymbolLocatorService + StructureAnalyzer + PatternAnalyzer + ProjectScanner + IndexLifecycle
{
}
