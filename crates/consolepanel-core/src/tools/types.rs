use serde::{Deserialize, Serialize};

/// How a tool's exit code is interpreted.
///
/// Exit-code semantics differ per tool and are encoded here explicitly rather
/// than assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCodePolicy {
    /// 0 is success; anything else is a `ToolInvocation` error.
    Strict,
    /// 0 is full success, 1 is partial success with a valid result body;
    /// anything else is a `ToolInvocation` error.
    PartialSuccess,
    /// The tool reports its own outcome as a status object and exits nonzero
    /// when that status is `ok: false`. A parseable body wins over the code.
    StatusReporting,
}

impl ExitCodePolicy {
    /// Whether `code` guarantees a result body worth parsing.
    pub fn accepts(&self, code: i32) -> bool {
        match self {
            ExitCodePolicy::Strict | ExitCodePolicy::StatusReporting => code == 0,
            ExitCodePolicy::PartialSuccess => code == 0 || code == 1,
        }
    }
}

/// Every external tool invocation the adapter knows how to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ListWindows,
    CaptureWindow,
    Foreground,
    TypeText,
    PressKey,
    Kill,
    NewConsole,
    ListDirectory,
}

impl ToolKind {
    /// Name used in logs and error messages. For control tools this is
    /// also the script file name under `scripts_dir`.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::ListWindows => "CaptureWindows --list",
            ToolKind::CaptureWindow => "CaptureWindows --handle",
            ToolKind::Foreground => "ForegroundWindow.py",
            ToolKind::TypeText => "TypeText.py",
            ToolKind::PressKey => "PressKey.py",
            ToolKind::Kill => "KillWindow.py",
            ToolKind::NewConsole => "NewConsole.py",
            ToolKind::ListDirectory => "ListDir.py",
        }
    }

    pub fn exit_policy(&self) -> ExitCodePolicy {
        match self {
            ToolKind::ListWindows => ExitCodePolicy::Strict,
            ToolKind::CaptureWindow => ExitCodePolicy::PartialSuccess,
            ToolKind::Foreground
            | ToolKind::TypeText
            | ToolKind::PressKey
            | ToolKind::Kill
            | ToolKind::NewConsole
            | ToolKind::ListDirectory => ExitCodePolicy::StatusReporting,
        }
    }
}

/// Options for spawning a new console window. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConsoleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

impl NewConsoleRequest {
    /// Flag arguments for `NewConsole.py`; blank fields are omitted.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (flag, value) in [
            ("--command", &self.command),
            ("--title", &self.title),
            ("--directory", &self.directory),
        ] {
            if let Some(value) = value.as_deref().map(str::trim)
                && !value.is_empty()
            {
                args.push(flag.to_string());
                args.push(value.to_string());
            }
        }
        args
    }
}

/// Availability of one configured executable on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolProbe {
    pub program: String,
    pub resolved: Option<std::path::PathBuf>,
}

impl ToolProbe {
    pub fn is_available(&self) -> bool {
        self.resolved.is_some()
    }
}
