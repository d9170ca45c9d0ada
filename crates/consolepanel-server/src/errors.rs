use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use consolepanel_core::errors::PanelError;
use consolepanel_core::tools::ToolError;
use consolepanel_core::windows::CaptureRecord;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address '{addr}'")]
    InvalidAddress { addr: String },

    #[error("Failed to bind {addr}: {source}")]
    BindFailed {
        addr: String,
        source: std::io::Error,
    },

    #[error("Server stopped unexpectedly: {source}")]
    ServeFailed { source: std::io::Error },
}

impl PanelError for ServerError {
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::InvalidAddress { .. } => "SERVER_INVALID_ADDRESS",
            ServerError::BindFailed { .. } => "SERVER_BIND_FAILED",
            ServerError::ServeFailed { .. } => "SERVER_SERVE_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, ServerError::InvalidAddress { .. })
    }
}

/// JSON error response: `{ ok: false, error, code, results? }`. Directory
/// listing errors also carry an empty `path` and `dirs`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    results: Option<Vec<CaptureRecord>>,
    listing: bool,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    ok: bool,
    error: &'a str,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<&'a [CaptureRecord]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dirs: Option<&'a [String]>,
}

impl ApiError {
    /// A capture that ran but produced no image.
    pub fn capture_failed(message: String, results: Vec<CaptureRecord>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "CAPTURE_FAILED",
            message,
            results: Some(results),
            listing: false,
        }
    }

    /// Shape the body like an empty directory listing.
    pub fn with_empty_listing(mut self) -> Self {
        self.listing = true;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ToolError> for ApiError {
    fn from(error: ToolError) -> Self {
        let status = if error.is_user_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            code: error.error_code(),
            message: error.to_string(),
            results: None,
            listing: false,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "CLIENT_VALIDATION_INVALID_BODY",
            message: rejection.body_text(),
            results: None,
            listing: false,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "CLIENT_VALIDATION_INVALID_BODY",
            message: error.to_string(),
            results: None,
            listing: false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            ok: false,
            error: &self.message,
            code: self.code,
            results: self.results.as_deref(),
            path: self.listing.then_some(""),
            dirs: self.listing.then_some(&[][..]),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_maps_to_bad_request() {
        let error = ApiError::from(ToolError::MissingField { field: "key" });
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.code(), "CLIENT_VALIDATION_MISSING_FIELD");
        assert_eq!(error.message(), "missing key");
    }

    #[test]
    fn test_tool_errors_map_to_server_error() {
        let error = ApiError::from(ToolError::MalformedOutput {
            tool: "ListWindows",
            message: "expected value".to_string(),
        });
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.code(), "MALFORMED_OUTPUT_ERROR");
    }

    #[tokio::test]
    async fn test_listing_error_carries_empty_listing() {
        let error = ApiError::from(ToolError::ToolInvocation {
            tool: "ListDir.py",
            code: Some(2),
            message: "boom".to_string(),
        })
        .with_empty_listing();

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["path"], "");
        assert_eq!(body["dirs"], serde_json::json!([]));
        assert!(body.get("results").is_none());
    }

    #[test]
    fn test_plain_error_has_no_listing_fields() {
        let body = serde_json::to_value(ErrorBody {
            ok: false,
            error: "missing key",
            code: "CLIENT_VALIDATION_MISSING_FIELD",
            results: None,
            path: None,
            dirs: None,
        })
        .unwrap();
        assert!(body.get("path").is_none());
        assert!(body.get("dirs").is_none());
    }

    #[test]
    fn test_bind_failed_is_not_user_error() {
        let error = ServerError::BindFailed {
            addr: "127.0.0.1:8787".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(!error.is_user_error());
        assert_eq!(error.error_code(), "SERVER_BIND_FAILED");
    }
}
