pub mod errors;
pub mod operations;
#[cfg(any(test, feature = "test-support"))]
pub mod scripted;
pub mod traits;
pub mod types;

pub use errors::ProcessError;
pub use operations::{SystemRunner, run_tool};
#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedRunner;
pub use traits::ProcessRunner;
pub use types::{ProcessOutput, ToolCommand};
