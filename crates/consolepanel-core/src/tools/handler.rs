use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::ToolsConfig;
use crate::process::{ProcessOutput, ProcessRunner, SystemRunner, ToolCommand};
use crate::tools::errors::ToolError;
use crate::tools::traits::WindowBackend;
use crate::tools::types::{NewConsoleRequest, ToolKind, ToolProbe};
use crate::tools::validation::{require_handle, require_key, require_text, sanitize_handle};
use crate::windows::{
    ActionStatus, CaptureMethod, CaptureRecord, CaptureResult, DirectoryListing, WindowDescriptor,
};

/// Typed operations over the external OS-automation tools.
///
/// Each operation makes exactly one tool invocation through the
/// [`ProcessRunner`] and interprets its exit code with the tool's own
/// [`ExitCodePolicy`](crate::tools::ExitCodePolicy).
pub struct ToolAdapter<R: ProcessRunner = SystemRunner> {
    config: ToolsConfig,
    runner: R,
}

impl ToolAdapter<SystemRunner> {
    pub fn new(config: ToolsConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: ProcessRunner> ToolAdapter<R> {
    pub fn with_runner(config: ToolsConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ToolsConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Enumerate top-level windows.
    pub async fn list_windows(&self) -> Result<Vec<WindowDescriptor>, ToolError> {
        let kind = ToolKind::ListWindows;
        let output = self.invoke(kind, self.capture_command(["--list"])).await?;
        check_exit(kind, &output)?;

        let windows: Vec<WindowDescriptor> = parse_output(kind, &output.stdout)?;
        info!(event = "core.tools.list_completed", count = windows.len());
        Ok(windows)
    }

    /// Capture one window into a private temporary directory and read the image back.
    ///
    /// The directory is removed before returning, whatever the outcome.
    pub async fn capture_window(&self, handle: &str) -> Result<CaptureResult, ToolError> {
        let handle = require_handle(Some(handle))?;
        let out_dir = self.capture_out_dir(&handle);

        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(|e| ToolError::ToolInvocation {
                tool: ToolKind::CaptureWindow.name(),
                code: None,
                message: format!(
                    "cannot create capture directory '{}': {}",
                    out_dir.display(),
                    e
                ),
            })?;

        let result = self.capture_into(&handle, &out_dir).await;

        if let Err(e) = tokio::fs::remove_dir_all(&out_dir).await {
            warn!(
                event = "core.tools.capture_cleanup_failed",
                path = %out_dir.display(),
                error = %e
            );
        }

        result
    }

    async fn capture_into(&self, handle: &str, out_dir: &Path) -> Result<CaptureResult, ToolError> {
        let kind = ToolKind::CaptureWindow;
        let out_arg = out_dir.to_string_lossy().into_owned();
        let command = self.capture_command(["--handle", handle, "--out", out_arg.as_str()]);

        let output = self.invoke(kind, command).await?;
        check_exit(kind, &output)?;
        if output.code == 1 {
            info!(
                event = "core.tools.capture_partial",
                handle = handle,
                diagnostic = output.diagnostic()
            );
        }

        let records: Vec<CaptureRecord> = parse_output(kind, &output.stdout)?;
        let Some(record) = select_record(&records, handle) else {
            return Err(ToolError::MalformedOutput {
                tool: kind.name(),
                message: "empty result array".to_string(),
            });
        };

        let method = record.method.as_deref().map(CaptureMethod::from_tool);
        let mut result = CaptureResult {
            handle: handle.to_string(),
            ok: record.ok,
            image: None,
            method,
            error: record.error.clone(),
            width: record.width,
            height: record.height,
            records: Vec::new(),
        };

        if !record.ok {
            info!(
                event = "core.tools.capture_not_ok",
                handle = handle,
                error = record.error.as_deref().unwrap_or("")
            );
            if result.error.is_none() {
                result.error = Some("capture failed".to_string());
            }
            result.records = records;
            return Ok(result);
        }

        let image_path = record
            .png
            .as_deref()
            .and_then(|png| Path::new(png).file_name())
            .map(|name| out_dir.join(name))
            .ok_or_else(|| ToolError::CaptureIntegrity {
                handle: handle.to_string(),
                path: out_dir.to_path_buf(),
            })?;

        let bytes = match tokio::fs::read(&image_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::CaptureIntegrity {
                    handle: handle.to_string(),
                    path: image_path,
                });
            }
            Err(e) => {
                return Err(ToolError::ToolInvocation {
                    tool: kind.name(),
                    code: Some(output.code),
                    message: format!("cannot read '{}': {}", image_path.display(), e),
                });
            }
        };

        info!(
            event = "core.tools.capture_completed",
            handle = handle,
            bytes = bytes.len(),
            method = ?method
        );

        result.image = Some(bytes);
        result.records = records;
        Ok(result)
    }

    /// Bring a window to the foreground, restoring it when minimized.
    pub async fn foreground_window(&self, handle: &str) -> Result<ActionStatus, ToolError> {
        let handle = require_handle(Some(handle))?;
        self.run_reported(ToolKind::Foreground, vec![handle]).await
    }

    pub async fn type_text(&self, handle: &str, text: &str) -> Result<ActionStatus, ToolError> {
        let handle = require_handle(Some(handle))?;
        let text = require_text(Some(text))?;
        self.run_reported(ToolKind::TypeText, vec![handle, text.to_string()])
            .await
    }

    /// Send a key chord such as `ctrl+c`. The chord is normalized first.
    pub async fn press_key(&self, handle: &str, key: &str) -> Result<ActionStatus, ToolError> {
        let handle = require_handle(Some(handle))?;
        let key = require_key(Some(key))?;
        self.run_reported(ToolKind::PressKey, vec![handle, key])
            .await
    }

    pub async fn kill_window(&self, handle: &str) -> Result<ActionStatus, ToolError> {
        let handle = require_handle(Some(handle))?;
        self.run_reported(ToolKind::Kill, vec![handle]).await
    }

    pub async fn spawn_console(
        &self,
        request: &NewConsoleRequest,
    ) -> Result<ActionStatus, ToolError> {
        self.run_reported(ToolKind::NewConsole, request.to_args())
            .await
    }

    /// List immediate subdirectories of `path`, or the tool's default location.
    pub async fn list_directory(&self, path: Option<&str>) -> Result<DirectoryListing, ToolError> {
        let mut args = Vec::new();
        if let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) {
            args.push("--path".to_string());
            args.push(path.to_string());
        }
        self.run_reported(ToolKind::ListDirectory, args).await
    }

    /// Resolve the configured interpreter and capture runtime on `PATH`.
    pub fn probe(&self) -> Vec<ToolProbe> {
        let mut programs = vec![self.config.python().to_string()];
        if let Some(runtime) = self.config.capture_runtime() {
            programs.push(runtime.to_string());
        }

        programs
            .into_iter()
            .map(|program| {
                let resolved = which::which(&program).ok();
                ToolProbe { program, resolved }
            })
            .collect()
    }

    /// Run a control script and return its status body.
    ///
    /// A parseable body is returned whatever the exit code; the scripts exit
    /// nonzero when they report `ok: false`.
    async fn run_reported<T: DeserializeOwned>(
        &self,
        kind: ToolKind,
        args: Vec<String>,
    ) -> Result<T, ToolError> {
        let output = self.invoke(kind, self.script_command(kind, args)).await?;

        match parse_output(kind, &output.stdout) {
            Ok(body) => Ok(body),
            Err(_) if !kind.exit_policy().accepts(output.code) => Err(ToolError::ToolInvocation {
                tool: kind.name(),
                code: Some(output.code),
                message: output.diagnostic().to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn invoke(&self, kind: ToolKind, command: ToolCommand) -> Result<ProcessOutput, ToolError> {
        debug!(
            event = "core.tools.invoke_started",
            tool = kind.name(),
            program = command.program()
        );

        match self.runner.run(&command).await {
            Ok(output) => {
                debug!(
                    event = "core.tools.invoke_completed",
                    tool = kind.name(),
                    code = output.code
                );
                Ok(output)
            }
            Err(e) => {
                warn!(
                    event = "core.tools.invoke_failed",
                    tool = kind.name(),
                    error = %e
                );
                Err(ToolError::from_process(kind.name(), e))
            }
        }
    }

    fn capture_command<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> ToolCommand {
        let program_path = absolutize(self.config.capture_program());
        let program_arg = program_path.to_string_lossy().into_owned();

        let mut command = match self.config.capture_runtime() {
            Some(runtime) => ToolCommand::new(runtime).arg(program_arg),
            None => ToolCommand::new(program_arg),
        };
        command = command.args(args).timeout(self.config.timeout());

        if let Some(dir) = program_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            command = command.current_dir(dir);
        }
        command
    }

    fn script_command(&self, kind: ToolKind, args: Vec<String>) -> ToolCommand {
        let scripts_dir = absolutize(self.config.scripts_dir());
        let script = scripts_dir.join(kind.name());

        ToolCommand::new(self.config.python())
            .arg(script.to_string_lossy())
            .args(args)
            .current_dir(scripts_dir)
            .timeout(self.config.timeout())
    }

    fn capture_out_dir(&self, handle: &str) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        self.config
            .capture_dir()
            .join(handle)
            .join(format!("{}-{}", millis, uuid::Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl<R: ProcessRunner + 'static> WindowBackend for ToolAdapter<R> {
    async fn list_windows(&self) -> Result<Vec<WindowDescriptor>, ToolError> {
        ToolAdapter::list_windows(self).await
    }

    async fn capture_window(&self, handle: &str) -> Result<CaptureResult, ToolError> {
        ToolAdapter::capture_window(self, handle).await
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn check_exit(kind: ToolKind, output: &ProcessOutput) -> Result<(), ToolError> {
    if kind.exit_policy().accepts(output.code) {
        return Ok(());
    }
    warn!(
        event = "core.tools.exit_rejected",
        tool = kind.name(),
        code = output.code,
        diagnostic = output.diagnostic()
    );
    Err(ToolError::ToolInvocation {
        tool: kind.name(),
        code: Some(output.code),
        message: output.diagnostic().to_string(),
    })
}

fn parse_output<T: DeserializeOwned>(kind: ToolKind, stdout: &str) -> Result<T, ToolError> {
    let body = stdout.trim();
    if body.is_empty() {
        return Err(ToolError::MalformedOutput {
            tool: kind.name(),
            message: "empty output".to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| ToolError::MalformedOutput {
        tool: kind.name(),
        message: e.to_string(),
    })
}

/// The record for `handle`, else the first one.
fn select_record<'a>(records: &'a [CaptureRecord], handle: &str) -> Option<&'a CaptureRecord> {
    records
        .iter()
        .find(|r| sanitize_handle(&r.handle).eq_ignore_ascii_case(handle))
        .or_else(|| records.first())
}
