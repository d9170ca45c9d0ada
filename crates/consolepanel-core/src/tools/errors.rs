use std::path::PathBuf;

use crate::errors::PanelError;
use crate::process::ProcessError;

/// Failures of the capture/control adapter.
///
/// A tool that ran and printed `{"ok": false, ...}` is *not* an error; it is
/// returned as data. These variants cover bad requests and broken tools.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("missing {field}")]
    MissingField { field: &'static str },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("{tool} failed{}: {message}", .code.map(|c| format!(" (code={c})")).unwrap_or_default())]
    ToolInvocation {
        tool: &'static str,
        code: Option<i32>,
        message: String,
    },

    #[error("{tool} produced malformed output: {message}")]
    MalformedOutput { tool: &'static str, message: String },

    #[error("capture of '{handle}' reported success but '{}' is missing", .path.display())]
    CaptureIntegrity { handle: String, path: PathBuf },
}

impl ToolError {
    pub(crate) fn from_process(tool: &'static str, error: ProcessError) -> Self {
        ToolError::ToolInvocation {
            tool,
            code: None,
            message: error.to_string(),
        }
    }

    /// Whether the caller sent a bad request (never forwarded to a tool).
    pub fn is_client_validation(&self) -> bool {
        matches!(
            self,
            ToolError::MissingField { .. } | ToolError::InvalidField { .. }
        )
    }
}

impl PanelError for ToolError {
    fn error_code(&self) -> &'static str {
        match self {
            ToolError::MissingField { .. } => "CLIENT_VALIDATION_MISSING_FIELD",
            ToolError::InvalidField { .. } => "CLIENT_VALIDATION_INVALID_FIELD",
            ToolError::ToolInvocation { .. } => "TOOL_INVOCATION_ERROR",
            ToolError::MalformedOutput { .. } => "MALFORMED_OUTPUT_ERROR",
            ToolError::CaptureIntegrity { .. } => "CAPTURE_INTEGRITY_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        self.is_client_validation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        let error = ToolError::MissingField { field: "handle" };
        assert_eq!(error.to_string(), "missing handle");
        assert_eq!(error.error_code(), "CLIENT_VALIDATION_MISSING_FIELD");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_tool_invocation_display_with_code() {
        let error = ToolError::ToolInvocation {
            tool: "CaptureWindows --handle",
            code: Some(2),
            message: "ERROR: invalid handle: 0x0".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "CaptureWindows --handle failed (code=2): ERROR: invalid handle: 0x0"
        );
        assert_eq!(error.error_code(), "TOOL_INVOCATION_ERROR");
        assert!(!error.is_user_error());
    }

    #[test]
    fn test_tool_invocation_from_process_error() {
        let error = ToolError::from_process(
            "ListWindows",
            ProcessError::ExecutableNotFound {
                program: "dotnet".to_string(),
            },
        );
        assert_eq!(
            error.to_string(),
            "ListWindows failed: Executable 'dotnet' not found"
        );
    }

    #[test]
    fn test_capture_integrity_display() {
        let error = ToolError::CaptureIntegrity {
            handle: "0xAB".to_string(),
            path: PathBuf::from("/tmp/out/0xAB.png"),
        };
        assert_eq!(
            error.to_string(),
            "capture of '0xAB' reported success but '/tmp/out/0xAB.png' is missing"
        );
        assert_eq!(error.error_code(), "CAPTURE_INTEGRITY_ERROR");
        assert!(!error.is_user_error());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ToolError>();
    }
}
