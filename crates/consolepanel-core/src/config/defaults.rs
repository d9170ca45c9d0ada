//! Default values and resolving accessors for configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::types::{PreferencesConfig, SchedulerSettings, ServerConfig, ToolsConfig};
use crate::preferences::PreferenceLimits;
use crate::scheduler::SchedulerConfig;

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8787;

pub const DEFAULT_PYTHON: &str = "python";
pub const DEFAULT_SCRIPTS_DIR: &str = "tools";
pub const DEFAULT_CAPTURE_RUNTIME: &str = "dotnet";
pub const DEFAULT_CAPTURE_PROGRAM: &str =
    "tools/CaptureWindows/bin/Release/net8.0-windows/CaptureWindows.dll";

/// A hung OS-automation subprocess must not hold a scheduler slot forever.
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_EXPANDED_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_THUMBNAIL_INTERVAL_MS: u64 = 15_000;
pub const DEFAULT_STAGGER_UNIT_MS: u64 = 1_000;
pub const DEFAULT_LIST_INTERVAL_MS: u64 = 5_000;

pub const DEFAULT_MAX_STARRED: usize = 64;
pub const DEFAULT_MAX_NICKNAMES: usize = 256;
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Returns the default capture root: `<system temp>/consolepanel-captures`.
pub fn default_capture_dir() -> PathBuf {
    std::env::temp_dir().join("consolepanel-captures")
}

impl ServerConfig {
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

impl ToolsConfig {
    pub fn python(&self) -> &str {
        self.python.as_deref().unwrap_or(DEFAULT_PYTHON)
    }

    pub fn scripts_dir(&self) -> &Path {
        self.scripts_dir
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_SCRIPTS_DIR))
    }

    /// Runtime hosting the capture program, or `None` to execute it directly.
    pub fn capture_runtime(&self) -> Option<&str> {
        match self.capture_runtime.as_deref() {
            Some("") => None,
            Some(runtime) => Some(runtime),
            None => Some(DEFAULT_CAPTURE_RUNTIME),
        }
    }

    pub fn capture_program(&self) -> &Path {
        self.capture_program
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_CAPTURE_PROGRAM))
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_TOOL_TIMEOUT_MS)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms())
    }

    pub fn capture_dir(&self) -> PathBuf {
        self.capture_dir.clone().unwrap_or_else(default_capture_dir)
    }
}

impl SchedulerSettings {
    pub fn expanded_interval_ms(&self) -> u64 {
        self.expanded_interval_ms
            .unwrap_or(DEFAULT_EXPANDED_INTERVAL_MS)
    }

    pub fn thumbnail_interval_ms(&self) -> u64 {
        self.thumbnail_interval_ms
            .unwrap_or(DEFAULT_THUMBNAIL_INTERVAL_MS)
    }

    pub fn stagger_unit_ms(&self) -> u64 {
        self.stagger_unit_ms.unwrap_or(DEFAULT_STAGGER_UNIT_MS)
    }

    pub fn list_interval(&self) -> Duration {
        Duration::from_millis(self.list_interval_ms.unwrap_or(DEFAULT_LIST_INTERVAL_MS))
    }

    /// Resolve into the scheduler's runtime configuration.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            expanded_interval: Duration::from_millis(self.expanded_interval_ms()),
            thumbnail_interval: Duration::from_millis(self.thumbnail_interval_ms()),
            stagger_unit: Duration::from_millis(self.stagger_unit_ms()),
        }
    }
}

impl PreferencesConfig {
    pub fn limits(&self) -> PreferenceLimits {
        PreferenceLimits {
            max_starred: self.max_starred.unwrap_or(DEFAULT_MAX_STARRED),
            max_nicknames: self.max_nicknames.unwrap_or(DEFAULT_MAX_NICKNAMES),
            max_history: self.max_history.unwrap_or(DEFAULT_MAX_HISTORY),
        }
    }
}
