use crate::errors::PanelError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Executable '{program}' not found")]
    ExecutableNotFound { program: String },

    #[error("Failed to start '{program}': {message}")]
    SpawnFailed { program: String, message: String },

    #[error("'{program}' did not exit within {timeout_ms}ms")]
    TimedOut { program: String, timeout_ms: u64 },

    #[error("Failed to collect output from '{program}': {message}")]
    WaitFailed { program: String, message: String },
}

impl PanelError for ProcessError {
    fn error_code(&self) -> &'static str {
        match self {
            ProcessError::ExecutableNotFound { .. } => "PROCESS_EXECUTABLE_NOT_FOUND",
            ProcessError::SpawnFailed { .. } => "PROCESS_SPAWN_FAILED",
            ProcessError::TimedOut { .. } => "PROCESS_TIMED_OUT",
            ProcessError::WaitFailed { .. } => "PROCESS_WAIT_FAILED",
        }
    }
}
