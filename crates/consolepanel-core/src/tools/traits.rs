use async_trait::async_trait;

use crate::tools::errors::ToolError;
use crate::windows::{CaptureResult, WindowDescriptor};

/// Source of window snapshots and captures for client-side components.
///
/// Implemented by the in-process [`super::ToolAdapter`] and by remote HTTP
/// clients, so the reconciler and capture scheduler never care which one
/// they are talking to.
#[async_trait]
pub trait WindowBackend: Send + Sync + 'static {
    async fn list_windows(&self) -> Result<Vec<WindowDescriptor>, ToolError>;

    async fn capture_window(&self, handle: &str) -> Result<CaptureResult, ToolError>;
}
