//! Command execution.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, warn};

use crate::{
    error::{ExecError, Result},
    truncate,
    types::{ExecOptions, ExecResult},
};

/// Runs one command text through an interpreter and captures its output.
///
/// The scheduler holds an `Arc<dyn CommandRunner>`; tests substitute their
/// own implementation.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str, shell: &str) -> Result<ExecResult>;
}

/// Spawns `<shell> -c <command>` with a timeout, ANSI stripping and output
/// truncation.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    options: ExecOptions,
}

impl ShellRunner {
    pub fn new(options: ExecOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExecOptions {
        &self.options
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    /// # Errors
    ///
    /// - `Spawn`  : the interpreter could not be started.
    /// - `Timeout`: the child exceeded the configured timeout and was killed.
    /// - `Io`     : collecting the child's output failed.
    async fn run(&self, command: &str, shell: &str) -> Result<ExecResult> {
        debug!(shell, "exec: {command}");

        let timeout_secs = self.options.effective_timeout_secs();

        // kill_on_drop: when the timeout drops the wait future the child is
        // killed instead of being left behind.
        let child = AsyncCommand::new(shell)
            .arg("-c")
            .arg(command)
            .envs(&self.options.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecError::Spawn {
                shell: shell.to_string(),
                reason: e.to_string(),
            })?;

        match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await
        {
            Ok(Ok(output)) => {
                let exit_code = output.status.code().unwrap_or(-1);
                let max = self.options.max_output_chars;
                Ok(ExecResult {
                    exit_code,
                    stdout: truncate::truncate_output(&strip_text(&output.stdout), max),
                    stderr: truncate::truncate_output(&strip_text(&output.stderr), max),
                })
            }
            Ok(Err(e)) => Err(ExecError::Io(e)),
            Err(_elapsed) => {
                warn!(timeout_secs, "command timed out: {command}");
                Err(ExecError::Timeout {
                    ms: timeout_secs * 1_000,
                })
            }
        }
    }
}

/// Strip ANSI escape codes and convert bytes to a UTF-8 string.
fn strip_text(raw: &[u8]) -> String {
    let clean = strip_ansi_escapes::strip(raw);
    String::from_utf8_lossy(&clean).into_owned()
}
