use async_trait::async_trait;

use crate::process::errors::ProcessError;
use crate::process::types::{ProcessOutput, ToolCommand};

/// Executes an external tool to completion.
///
/// Implementations return `Ok` for every run that completed, whatever its exit
/// code, and `Err` only when the tool could not be started or did not finish.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: &ToolCommand) -> Result<ProcessOutput, ProcessError>;
}
