//! Request field validation and normalization.
//!
//! Runs before any tool is invoked; failures are client errors.

use crate::tools::errors::ToolError;

/// Strip every character outside `[0-9a-fA-Fx]` from a handle.
///
/// Handles end up in temporary directory names and tool arguments, so
/// anything that could form a path separator, `..`, or a leading `-` is removed.
pub fn sanitize_handle(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_hexdigit() || *c == 'x')
        .collect()
}

/// Sanitize a handle and reject it when nothing usable remains.
pub fn require_handle(raw: Option<&str>) -> Result<String, ToolError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(ToolError::MissingField { field: "handle" });
    }

    let handle = sanitize_handle(raw);
    if handle.is_empty() {
        return Err(ToolError::InvalidField {
            field: "handle",
            reason: format!("'{}' contains no handle characters", raw),
        });
    }
    Ok(handle)
}

/// Text to type must be present and non-empty. It is not trimmed.
pub fn require_text(raw: Option<&str>) -> Result<&str, ToolError> {
    match raw {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ToolError::MissingField { field: "text" }),
    }
}

/// Normalize a key specification: `"Ctrl + C"` becomes `"ctrl+c"`.
///
/// Parts are split on `+`, trimmed, lower-cased, and empty parts dropped.
pub fn normalize_key_spec(raw: &str) -> String {
    raw.split('+')
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("+")
}

/// Normalize a key specification and reject it when empty.
pub fn require_key(raw: Option<&str>) -> Result<String, ToolError> {
    let key = normalize_key_spec(raw.unwrap_or_default());
    if key.is_empty() {
        return Err(ToolError::MissingField { field: "key" });
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_markup() {
        assert_eq!(sanitize_handle("0x1A2B<script>"), "0x1A2B");
    }

    #[test]
    fn test_sanitize_strips_path_traversal() {
        assert_eq!(sanitize_handle("../../etc/passwd"), "");
        assert_eq!(sanitize_handle("-0x10"), "0x10");
        assert_eq!(sanitize_handle("0xab\\..\\cd"), "0xabcd");
    }

    #[test]
    fn test_sanitize_keeps_decimal_handles() {
        assert_eq!(sanitize_handle("197822"), "197822");
    }

    #[test]
    fn test_require_handle_rejects_all_disallowed() {
        let err = require_handle(Some("<>/?")).unwrap_err();
        assert!(matches!(err, ToolError::InvalidField { field: "handle", .. }));
        assert!(err.is_client_validation());
    }

    #[test]
    fn test_require_handle_missing() {
        assert!(matches!(
            require_handle(None),
            Err(ToolError::MissingField { field: "handle" })
        ));
        assert!(matches!(
            require_handle(Some("   ")),
            Err(ToolError::MissingField { field: "handle" })
        ));
    }

    #[test]
    fn test_require_handle_trims_and_sanitizes() {
        assert_eq!(require_handle(Some(" 0x304BE ")).unwrap(), "0x304BE");
    }

    #[test]
    fn test_require_text_rejects_empty() {
        assert!(matches!(
            require_text(Some("")),
            Err(ToolError::MissingField { field: "text" })
        ));
        assert!(require_text(None).is_err());
        assert_eq!(require_text(Some("  dir  ")).unwrap(), "  dir  ");
    }

    #[test]
    fn test_normalize_key_spec() {
        assert_eq!(normalize_key_spec("Ctrl + C"), "ctrl+c");
        assert_eq!(normalize_key_spec("ENTER"), "enter");
        assert_eq!(normalize_key_spec(" alt++F4 "), "alt+f4");
        assert_eq!(normalize_key_spec(" + "), "");
    }

    #[test]
    fn test_require_key_rejects_blank() {
        assert!(matches!(
            require_key(Some("+")),
            Err(ToolError::MissingField { field: "key" })
        ));
        assert_eq!(require_key(Some("Ctrl+Shift+P")).unwrap(), "ctrl+shift+p");
    }
}
