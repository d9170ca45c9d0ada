//! [`WindowBackend`] over a running ConsolePanel server.

use std::io::Read;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use consolepanel_core::tools::{ToolError, require_handle, sanitize_handle};
use consolepanel_core::windows::CaptureRecord;
use consolepanel_core::{CaptureMethod, CaptureResult, WindowBackend, WindowDescriptor};

const TOOL: &str = "remote server";
const CAPTURE_FAILED: &str = "CAPTURE_FAILED";
const MAX_IMAGE_BYTES: u64 = 64 * 1024 * 1024;

/// Error body of a non-2xx response.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    results: Vec<CaptureRecord>,
}

#[derive(Clone)]
pub struct RemoteBackend {
    base: String,
    agent: ureq::Agent,
}

impl RemoteBackend {
    /// `tool_timeout` is the server's tool limit; requests get some slack on top.
    pub fn new(base: &str, tool_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(tool_timeout + Duration::from_secs(5))
            .build();
        Self {
            base: base.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Run a blocking request on the blocking pool.
async fn run_blocking<T, F>(request: F) -> Result<T, ToolError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ToolError> + Send + 'static,
{
    tokio::task::spawn_blocking(request)
        .await
        .map_err(|e| ToolError::ToolInvocation {
            tool: TOOL,
            code: None,
            message: format!("request task failed: {}", e),
        })?
}

fn transport_error(error: ureq::Transport) -> ToolError {
    ToolError::ToolInvocation {
        tool: TOOL,
        code: None,
        message: error.to_string(),
    }
}

fn status_error(status: u16, body: ErrorBody) -> ToolError {
    ToolError::ToolInvocation {
        tool: TOOL,
        code: None,
        message: format!(
            "HTTP {}{}: {}",
            status,
            body.code.map(|c| format!(" {}", c)).unwrap_or_default(),
            body.error.unwrap_or_else(|| "no error message".to_string())
        ),
    }
}

fn read_capture(handle: String, response: ureq::Response) -> Result<CaptureResult, ToolError> {
    let records: Vec<CaptureRecord> = response
        .header("X-Capture-JSON")
        .map(|raw| serde_json::from_str::<Vec<CaptureRecord>>(raw))
        .transpose()
        .map_err(|e| ToolError::MalformedOutput {
            tool: TOOL,
            message: format!("capture header: {}", e),
        })?
        .unwrap_or_default();

    let image = read_image(response.into_reader(), MAX_IMAGE_BYTES)?;

    let record = records
        .iter()
        .find(|r| sanitize_handle(&r.handle).eq_ignore_ascii_case(&handle))
        .or_else(|| records.first());

    Ok(CaptureResult {
        ok: true,
        image: Some(image),
        method: record
            .and_then(|r| r.method.as_deref())
            .map(CaptureMethod::from_tool),
        error: None,
        width: record.map(|r| r.width).unwrap_or_default(),
        height: record.map(|r| r.height).unwrap_or_default(),
        handle,
        records,
    })
}

/// Read the whole image body, failing when it exceeds `limit` bytes.
fn read_image(reader: impl Read, limit: u64) -> Result<Vec<u8>, ToolError> {
    let mut image = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut image)
        .map_err(|e| ToolError::ToolInvocation {
            tool: TOOL,
            code: None,
            message: format!("reading image: {}", e),
        })?;

    if image.len() as u64 > limit {
        return Err(ToolError::ToolInvocation {
            tool: TOOL,
            code: None,
            message: format!("image exceeds {} bytes", limit),
        });
    }
    Ok(image)
}

fn failed_capture(handle: String, body: ErrorBody) -> CaptureResult {
    let record = body.results.first();
    CaptureResult {
        ok: false,
        image: None,
        method: None,
        error: body.error.or_else(|| record.and_then(|r| r.error.clone())),
        width: record.map(|r| r.width).unwrap_or_default(),
        height: record.map(|r| r.height).unwrap_or_default(),
        handle,
        records: body.results,
    }
}

#[async_trait]
impl WindowBackend for RemoteBackend {
    async fn list_windows(&self) -> Result<Vec<WindowDescriptor>, ToolError> {
        let url = self.url("/list");
        let agent = self.agent.clone();
        debug!(event = "cli.remote.request_started", url = url);

        run_blocking(move || match agent.get(&url).call() {
            Ok(response) => response.into_json().map_err(|e| ToolError::MalformedOutput {
                tool: TOOL,
                message: e.to_string(),
            }),
            Err(ureq::Error::Status(status, response)) => {
                Err(status_error(status, response.into_json().unwrap_or_default()))
            }
            Err(ureq::Error::Transport(e)) => Err(transport_error(e)),
        })
        .await
    }

    async fn capture_window(&self, handle: &str) -> Result<CaptureResult, ToolError> {
        let handle = require_handle(Some(handle))?;
        let url = self.url(&format!("/capture/{}", handle));
        let agent = self.agent.clone();
        debug!(event = "cli.remote.request_started", url = url);

        run_blocking(move || match agent.get(&url).call() {
            Ok(response) => read_capture(handle, response),
            Err(ureq::Error::Status(status, response)) => {
                let body: ErrorBody = response.into_json().unwrap_or_default();
                // A capture that ran but produced no image is an outcome, not a fault
                if body.code.as_deref() == Some(CAPTURE_FAILED) {
                    Ok(failed_capture(handle, body))
                } else {
                    Err(status_error(status, body))
                }
            }
            Err(ureq::Error::Transport(e)) => Err(transport_error(e)),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consolepanel_core::config::ToolsConfig;
    use consolepanel_core::process::{ProcessOutput, ScriptedRunner};
    use consolepanel_core::tools::ToolAdapter;
    use consolepanel_server::{AppState, serve};
    use std::path::PathBuf;
    use tokio::net::TcpListener;
    use tokio_util::sync::CancellationToken;

    async fn start(runner: ScriptedRunner) -> (RemoteBackend, CancellationToken, tempfile::TempDir) {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = ToolsConfig {
            capture_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };
        let state = AppState::new(ToolAdapter::with_runner(config, runner));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/", listener.local_addr().unwrap());
        let shutdown = CancellationToken::new();
        tokio::spawn(serve(listener, state, shutdown.clone()));
        (
            RemoteBackend::new(&base, Duration::from_secs(5)),
            shutdown,
            tmp,
        )
    }

    #[test]
    fn test_oversize_image_is_rejected() {
        let image = read_image(&b"\x89PNG"[..], 4).unwrap();
        assert_eq!(image, b"\x89PNG");

        let err = read_image(&b"\x89PNG!"[..], 4).unwrap_err();
        assert!(err.to_string().contains("image exceeds 4 bytes"));
    }

    #[tokio::test]
    async fn test_remote_list_windows() {
        let (backend, shutdown, _tmp) = start(ScriptedRunner::always(
            0,
            r#"[{"handle":"0x10","title":"cmd","processId":4,"width":640,"height":480}]"#,
        ))
        .await;

        let windows = backend.list_windows().await.unwrap();

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].handle, "0x10");
        assert_eq!(windows[0].process_id, 4);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_remote_capture_image_and_records() {
        let runner = ScriptedRunner::new(|command| {
            let args = command.get_args();
            let pos = args.iter().position(|a| a == "--out").unwrap();
            std::fs::write(PathBuf::from(&args[pos + 1]).join("0xAB.png"), b"\x89PNG").unwrap();
            Ok(ProcessOutput::completed(
                0,
                r#"[{"handle":"0xAB","title":"café","width":10,"height":20,"ok":true,"png":"0xAB.png","method":"PrintWindow"}]"#,
            ))
        });
        let (backend, shutdown, _tmp) = start(runner).await;

        let result = backend.capture_window("0xAB").await.unwrap();

        assert!(result.ok);
        assert_eq!(result.image_bytes(), Some(&b"\x89PNG"[..]));
        assert_eq!(result.method, Some(CaptureMethod::Primary));
        assert_eq!((result.width, result.height), (10, 20));
        assert_eq!(result.records[0].title, "café");
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_remote_logical_capture_failure_is_not_an_error() {
        let (backend, shutdown, _tmp) = start(ScriptedRunner::always(
            0,
            r#"[{"handle":"0xAB","ok":false,"error":"window minimized"}]"#,
        ))
        .await;

        let result = backend.capture_window("0xAB").await.unwrap();

        assert!(!result.ok);
        assert!(result.image.is_none());
        assert_eq!(result.error.as_deref(), Some("window minimized"));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_remote_tool_fault_is_an_error() {
        let (backend, shutdown, _tmp) = start(ScriptedRunner::always(2, "")).await;

        let err = backend.list_windows().await.unwrap_err();

        assert!(matches!(err, ToolError::ToolInvocation { .. }));
        assert!(err.to_string().contains("HTTP 500"));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_remote_unreachable_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let backend = RemoteBackend::new(&format!("http://{}", addr), Duration::from_secs(1));

        let err = backend.list_windows().await.unwrap_err();

        assert!(matches!(err, ToolError::ToolInvocation { code: None, .. }));
    }
}
