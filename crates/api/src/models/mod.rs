pub mod calls;
pub mod deadcode;
pub mod enums;
pub mod hierarchy;
pub mod patterns;
pub mod references;
pub mod symbol;
pub mod typeflow;

pub use calls::*;
pub use deadcode::*;
pub use enums::*;
pub use hierarchy::*;
pub use patterns::*;
pub use references::*;
pub use symbol::*;
pub use typeflow::*;
