use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::process::errors::ProcessError;
use crate::process::traits::ProcessRunner;
use crate::process::types::{ProcessOutput, ToolCommand};

/// Runs tools as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ProcessOutput, ProcessError> {
        run_tool(command).await
    }
}

/// Run a tool to completion with a null stdin, collecting stdout and stderr.
///
/// Both pipes are drained concurrently while the child runs, so a chatty tool
/// cannot deadlock on a full pipe. When the timeout expires the child is
/// killed and `ProcessError::TimedOut` is returned.
pub async fn run_tool(command: &ToolCommand) -> Result<ProcessOutput, ProcessError> {
    let program = command.program();

    let mut cmd = Command::new(program);
    cmd.args(command.get_args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = command.working_dir() {
        // A missing working directory also fails with NotFound; name it here so
        // it is not reported as a missing executable.
        if !tokio::fs::metadata(dir).await.is_ok_and(|m| m.is_dir()) {
            return Err(ProcessError::SpawnFailed {
                program: program.to_string(),
                message: format!("working directory '{}' does not exist", dir.display()),
            });
        }
        cmd.current_dir(dir);
    }

    #[cfg(windows)]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    debug!(
        event = "core.process.spawn_started",
        program = program,
        arg_count = command.get_args().len()
    );

    let child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProcessError::ExecutableNotFound {
                program: program.to_string(),
            }
        } else {
            ProcessError::SpawnFailed {
                program: program.to_string(),
                message: e.to_string(),
            }
        }
    })?;

    let timeout = command.get_timeout();
    // Dropping the wait future on timeout drops the child, and kill_on_drop reaps it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| ProcessError::WaitFailed {
            program: program.to_string(),
            message: e.to_string(),
        })?,
        Err(_) => {
            warn!(
                event = "core.process.timed_out",
                program = program,
                timeout_ms = timeout.as_millis() as u64
            );
            return Err(ProcessError::TimedOut {
                program: program.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
    };

    let result = ProcessOutput {
        code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    debug!(
        event = "core.process.spawn_completed",
        program = program,
        code = result.code,
        stdout_bytes = result.stdout.len(),
        stderr_bytes = result.stderr.len()
    );

    Ok(result)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sh(script: &str) -> ToolCommand {
        ToolCommand::new("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_data() {
        let output = run_tool(&sh("echo out; echo err >&2; exit 3"))
            .await
            .unwrap();

        assert_eq!(output.code, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_missing_executable_is_distinct() {
        let command = ToolCommand::new("definitely-not-a-real-tool-4c1d");
        let err = run_tool(&command).await.unwrap_err();
        assert!(matches!(err, ProcessError::ExecutableNotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_working_dir_names_the_directory() {
        let command = sh("true").current_dir("/definitely/missing/dir");
        let err = run_tool(&command).await.unwrap_err();

        assert!(matches!(err, ProcessError::SpawnFailed { .. }));
        assert!(err.to_string().contains("/definitely/missing/dir"));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let command = sh("sleep 5").timeout(Duration::from_millis(100));
        let err = run_tool(&command).await.unwrap_err();
        assert!(matches!(
            err,
            ProcessError::TimedOut {
                timeout_ms: 100,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_large_output_on_both_streams_does_not_deadlock() {
        // Well past the default pipe buffer on both streams.
        let script = "i=0; while [ $i -lt 4000 ]; do \
                      echo 'stdout line padding padding padding padding'; \
                      echo 'stderr line padding padding padding padding' >&2; \
                      i=$((i+1)); done";
        let command = sh(script).timeout(Duration::from_secs(20));
        let output = run_tool(&command).await.unwrap();

        assert_eq!(output.code, 0);
        assert_eq!(output.stdout.lines().count(), 4000);
        assert_eq!(output.stderr.lines().count(), 4000);
    }

    #[tokio::test]
    async fn test_stdin_is_null() {
        // `cat` would block forever on an inherited terminal stdin.
        let command = ToolCommand::new("cat").timeout(Duration::from_secs(5));
        let output = run_tool(&command).await.unwrap();
        assert_eq!(output.code, 0);
        assert!(output.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_working_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let command = sh("pwd").current_dir(dir.path());
        let output = run_tool(&command).await.unwrap();

        let reported = std::path::PathBuf::from(output.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }
}
