use std::sync::Arc;

use consolepanel_core::process::{ProcessRunner, SystemRunner};
use consolepanel_core::tools::ToolAdapter;

/// Shared request state. Holds no per-request or per-client data.
pub struct AppState<R: ProcessRunner = SystemRunner> {
    pub adapter: Arc<ToolAdapter<R>>,
}

impl<R: ProcessRunner> AppState<R> {
    pub fn new(adapter: ToolAdapter<R>) -> Self {
        Self {
            adapter: Arc::new(adapter),
        }
    }
}

impl<R: ProcessRunner> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
        }
    }
}
