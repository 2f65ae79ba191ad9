//! Shared data types for kubecron-exec.

use std::collections::BTreeMap;

use kubecron_core::config::{SchedulerConfig, DEFAULT_EXEC_TIMEOUT_SECS, DEFAULT_MAX_OUTPUT_CHARS};
use serde::{Deserialize, Serialize};

/// Hard ceiling for a single execution, whatever the config says.
pub const MAX_TIMEOUT_SECS: u64 = 3_600;

// ---------------------------------------------------------------------------
// ExecResult
// ---------------------------------------------------------------------------

/// Outcome of one command execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Process exit code (0 = success, -1 when killed by a signal).
    pub exit_code: i32,

    /// Captured standard output (ANSI escapes already stripped).
    pub stdout: String,

    /// Captured standard error (ANSI escapes already stripped).
    pub stderr: String,
}

impl ExecResult {
    /// The text recorded in history: stdout, then stderr, then a trailing
    /// exit code marker when the command failed.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim_end().to_string();
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(stderr);
        }
        if self.exit_code != 0 {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[exit code {}]", self.exit_code));
        }
        out
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

// ---------------------------------------------------------------------------
// ExecOptions
// ---------------------------------------------------------------------------

/// Configuration knobs shared by every execution of a runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecOptions {
    /// Timeout in seconds; clamped to [`MAX_TIMEOUT_SECS`].
    pub timeout_secs: u64,

    /// Maximum characters kept per stream before middle-omission truncation.
    pub max_output_chars: usize,

    /// Extra environment for the child, e.g. the cluster's `KUBECONFIG`.
    pub env: BTreeMap<String, String>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_EXEC_TIMEOUT_SECS,
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
            env: BTreeMap::new(),
        }
    }
}

impl ExecOptions {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            timeout_secs: config.exec_timeout_secs,
            max_output_chars: config.max_output_chars,
            env: config.env.clone(),
        }
    }

    pub(crate) fn effective_timeout_secs(&self) -> u64 {
        self.timeout_secs.min(MAX_TIMEOUT_SECS)
    }
}
