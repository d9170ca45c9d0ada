//! Capture/control adapter over the external OS-automation tools.

pub mod errors;
pub mod handler;
pub mod traits;
pub mod types;
pub mod validation;

pub use errors::ToolError;
pub use handler::ToolAdapter;
pub use traits::WindowBackend;
pub use types::{ExitCodePolicy, NewConsoleRequest, ToolKind, ToolProbe};
pub use validation::{normalize_key_spec, require_handle, require_key, require_text, sanitize_handle};
