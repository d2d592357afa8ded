pub mod config;
pub mod error;
pub mod logging;
pub mod util;

pub mod analysis;
pub mod checker;
pub mod facade;
pub mod parser;
pub mod project;
pub mod resolve;

pub use error::{Result, TracescopeError};
pub use facade::TraceEngine;
