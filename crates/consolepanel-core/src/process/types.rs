use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::defaults::DEFAULT_TOOL_TIMEOUT_MS;

/// A fully resolved external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            timeout: Duration::from_millis(DEFAULT_TOOL_TIMEOUT_MS),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }
}

/// Outcome of a tool that ran to completion.
///
/// A nonzero `code` is data, not an error: interpreting it is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or -1 when the process was terminated by a signal
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Best diagnostic text for logs and error messages: stderr, else stdout.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_command_builder() {
        let command = ToolCommand::new("python")
            .arg("TypeText.py")
            .args(["0x10", "dir"])
            .current_dir("/opt/tools")
            .timeout(Duration::from_secs(5));

        assert_eq!(command.program(), "python");
        assert_eq!(command.get_args(), ["TypeText.py", "0x10", "dir"]);
        assert_eq!(command.working_dir(), Some(Path::new("/opt/tools")));
        assert_eq!(command.get_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_diagnostic_prefers_stderr() {
        let output = ProcessOutput {
            code: 2,
            stdout: "ERROR: invalid handle: 0x0\n".to_string(),
            stderr: "  Unhandled exception  \n".to_string(),
        };
        assert_eq!(output.diagnostic(), "Unhandled exception");

        let output = ProcessOutput {
            stderr: String::new(),
            ..output
        };
        assert_eq!(output.diagnostic(), "ERROR: invalid handle: 0x0");
        assert!(!output.success());
    }
}
