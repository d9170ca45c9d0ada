//! In-memory [`ProcessRunner`] that answers from a script instead of spawning.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::process::errors::ProcessError;
use crate::process::traits::ProcessRunner;
use crate::process::types::{ProcessOutput, ToolCommand};

type Responder = dyn Fn(&ToolCommand) -> Result<ProcessOutput, ProcessError> + Send + Sync;

/// Replays canned tool behavior and records every invocation.
pub struct ScriptedRunner {
    responder: Box<Responder>,
    calls: Mutex<Vec<ToolCommand>>,
}

impl ScriptedRunner {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ToolCommand) -> Result<ProcessOutput, ProcessError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A runner whose every invocation exits with `code` and prints `stdout`.
    pub fn always(code: i32, stdout: &str) -> Self {
        let stdout = stdout.to_string();
        Self::new(move |_| Ok(ProcessOutput::completed(code, &stdout)))
    }

    /// Every command this runner has been asked to run, in order.
    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ProcessOutput, ProcessError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.clone());
        }
        (self.responder)(command)
    }
}

impl ProcessOutput {
    /// Output of a run that printed `stdout` and nothing on stderr.
    pub fn completed(code: i32, stdout: &str) -> Self {
        Self {
            code,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }
}
