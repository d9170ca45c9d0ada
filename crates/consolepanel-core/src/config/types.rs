//! Configuration type definitions for ConsolePanel.
//!
//! All file-backed fields are optional so that a project config can override
//! a single value from the user config without restating the rest. Accessors
//! in [`super::defaults`] resolve missing values to the built-in defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0"
//! port = 8787
//!
//! [tools]
//! python = "python"
//! scripts_dir = "tools"
//! capture_runtime = "dotnet"
//! capture_program = "tools/CaptureWindows/bin/Release/net8.0-windows/CaptureWindows.dll"
//! timeout_ms = 30000
//!
//! [scheduler]
//! expanded_interval_ms = 2000
//! thumbnail_interval_ms = 15000
//! stagger_unit_ms = 1000
//! list_interval_ms = 5000
//!
//! [preferences]
//! max_starred = 64
//! max_history = 50
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration loaded from TOML config files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PanelConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// External OS-automation tool locations and invocation limits
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Client-side capture and list polling cadence
    #[serde(default)]
    pub scheduler: SchedulerSettings,

    /// Bounds for the local preferences store
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    /// Address to bind. Default: 127.0.0.1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Port to listen on. Default: 8787.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// External tool configuration.
///
/// Control operations run `<python> <scripts_dir>/<Script>.py ...`; enumeration
/// and capture run `<capture_runtime> <capture_program> ...`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    /// Interpreter used for the control scripts. Default: "python".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,

    /// Directory holding the control scripts. Default: "tools".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts_dir: Option<PathBuf>,

    /// Runtime used to host the capture program. Default: "dotnet".
    /// Set to an empty string to execute `capture_program` directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_runtime: Option<String>,

    /// Capture/enumeration program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_program: Option<PathBuf>,

    /// Hard timeout for a single tool invocation. Default: 30000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Root directory for per-capture output folders.
    /// Default: `<system temp>/consolepanel-captures`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_dir: Option<PathBuf>,
}

/// Capture scheduler cadence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchedulerSettings {
    /// Refresh interval for an expanded (focused) window. Default: 2000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_interval_ms: Option<u64>,

    /// Refresh interval for a thumbnail-only window. Default: 15000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_interval_ms: Option<u64>,

    /// Per-index delay before a thumbnail's first capture. Default: 1000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stagger_unit_ms: Option<u64>,

    /// Interval between window list polls. Default: 5000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_interval_ms: Option<u64>,
}

/// Preferences store bounds.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PreferencesConfig {
    /// Maximum starred handles kept. Default: 64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_starred: Option<usize>,

    /// Maximum nicknames kept. Default: 256.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nicknames: Option<usize>,

    /// Maximum history entries kept. Default: 50.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_history: Option<usize>,
}
