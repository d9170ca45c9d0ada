use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_visible() -> bool {
    true
}

/// One window as reported by the enumeration tool.
///
/// Produced fresh on every list query and never mutated in place; the
/// reconciler diffs snapshots by `handle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDescriptor {
    /// Opaque native handle, typically hex such as `0x304BE`
    pub handle: String,
    #[serde(default)]
    pub title: String,
    /// Owning process. Some tool builds report it as `pid`.
    #[serde(default, alias = "pid")]
    pub process_id: u32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub class_name: String,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

/// How the capture tool obtained the pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMethod {
    /// Window rendered itself (`PrintWindow`)
    Primary,
    /// Any fallback path (`WM_PRINT`, screen `BitBlt`)
    Fallback,
}

impl CaptureMethod {
    pub fn from_tool(method: &str) -> Self {
        if method.eq_ignore_ascii_case("PrintWindow") {
            CaptureMethod::Primary
        } else {
            CaptureMethod::Fallback
        }
    }
}

/// One element of the capture tool's JSON result array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    pub handle: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub ok: bool,
    /// Image file name, relative to the capture output directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub png: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one capture attempt for one window.
///
/// `ok == false` is a normal outcome (window minimized, occluded, gone).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    pub handle: String,
    pub ok: bool,
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<CaptureMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Raw result array from the tool, forwarded to HTTP clients
    pub records: Vec<CaptureRecord>,
}

impl CaptureResult {
    /// Captured image bytes, when the capture succeeded.
    pub fn image_bytes(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }
}

/// Status object printed by every control tool.
///
/// `ok: false` is a logical failure reported by the tool, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStatus {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Tool-specific fields (`handle`, `key`, `command`, ...), passed through verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of the directory-listing helper used by the folder picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    pub ok: bool,
    #[serde(default)]
    pub path: String,
    /// Immediate subdirectory names, sorted case-insensitively by the tool
    #[serde(default)]
    pub dirs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_descriptor_accepts_pid_alias() {
        let json = r#"{"handle":"0x304BE","title":"cmd","pid":4242,"width":800,"height":600,"className":"ConsoleWindowClass","isVisible":true}"#;
        let window: WindowDescriptor = serde_json::from_str(json).unwrap();

        assert_eq!(window.handle, "0x304BE");
        assert_eq!(window.process_id, 4242);
        assert_eq!(window.class_name, "ConsoleWindowClass");

        let out = serde_json::to_value(&window).unwrap();
        assert_eq!(out["processId"], 4242);
        assert_eq!(out["className"], "ConsoleWindowClass");
    }

    #[test]
    fn test_window_descriptor_minimal_fields() {
        let window: WindowDescriptor = serde_json::from_str(r#"{"handle":"0x10"}"#).unwrap();
        assert_eq!(window.title, "");
        assert_eq!(window.process_id, 0);
        assert!(window.is_visible);
    }

    #[test]
    fn test_capture_method_mapping() {
        assert_eq!(CaptureMethod::from_tool("PrintWindow"), CaptureMethod::Primary);
        assert_eq!(CaptureMethod::from_tool("WM_PRINT"), CaptureMethod::Fallback);
        assert_eq!(CaptureMethod::from_tool("BitBlt"), CaptureMethod::Fallback);
    }

    #[test]
    fn test_action_status_keeps_extra_fields() {
        let status: ActionStatus =
            serde_json::from_str(r#"{"ok":true,"handle":"0xAB","key":"ctrl+c"}"#).unwrap();
        assert!(status.ok);
        assert_eq!(status.error, None);
        assert_eq!(status.extra["key"], "ctrl+c");

        let out = serde_json::to_value(&status).unwrap();
        assert_eq!(out, serde_json::json!({"ok":true,"handle":"0xAB","key":"ctrl+c"}));
    }

    #[test]
    fn test_action_status_logical_failure() {
        let status: ActionStatus =
            serde_json::from_str(r#"{"ok":false,"error":"Window not found: 0xAB"}"#).unwrap();
        assert!(!status.ok);
        assert_eq!(status.error.as_deref(), Some("Window not found: 0xAB"));
    }

    #[test]
    fn test_capture_result_serialization_skips_image() {
        let result = CaptureResult {
            handle: "0x10".to_string(),
            ok: true,
            image: Some(vec![1, 2, 3]),
            method: Some(CaptureMethod::Primary),
            error: None,
            width: 10,
            height: 20,
            records: Vec::new(),
        };
        let out = serde_json::to_value(&result).unwrap();
        assert!(out.get("image").is_none());
        assert_eq!(out["method"], "primary");
    }
}
