use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Everything needed to register a job. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    name: String,
    command: String,
    expression: String,
    description: String,
    email: Option<String>,
    /// `None` runs under the scheduler's default shell.
    shell: Option<String>,
    recurring: bool,
}

impl JobSpec {
    /// Start a recurring job definition.
    pub fn builder(
        name: impl Into<String>,
        command: impl Into<String>,
        expression: impl Into<String>,
    ) -> JobSpecBuilder {
        JobSpecBuilder {
            spec: JobSpec {
                name: name.into(),
                command: command.into(),
                expression: expression.into(),
                description: String::new(),
                email: None,
                shell: None,
                recurring: true,
            },
        }
    }

    /// Also the name of the job's reports folder.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Recorded but never used for delivery.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn shell(&self) -> Option<&str> {
        self.shell.as_deref()
    }

    pub fn recurring(&self) -> bool {
        self.recurring
    }
}

#[derive(Debug, Clone)]
pub struct JobSpecBuilder {
    spec: JobSpec,
}

impl JobSpecBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = description.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.spec.email = Some(email.into());
        self
    }

    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.spec.shell = Some(shell.into());
        self
    }

    pub fn recurring(mut self, recurring: bool) -> Self {
        self.spec.recurring = recurring;
        self
    }

    /// Fire on the next match of the expression only.
    pub fn one_shot(self) -> Self {
        self.recurring(false)
    }

    pub fn build(self) -> JobSpec {
        self.spec
    }
}

/// Point-in-time view of a registered job, as returned by
/// [`Scheduler::list_active_jobs`](crate::Scheduler::list_active_jobs).
///
/// Later executions do not change a snapshot already handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledJob {
    /// Sequential, starting at 1 for the first job registered in this process.
    pub id: u64,
    pub name: String,
    pub command: String,
    pub expression: String,
    pub description: String,
    pub email: Option<String>,
    /// Interpreter actually used, default applied.
    pub shell: String,
    pub recurring: bool,
    pub runs: u64,
    /// Set once a one-shot job has fired.
    pub done: bool,
    pub last_run: Option<DateTime<Local>>,
    /// `None` when done or when the expression has no future match.
    pub next_run: Option<DateTime<Local>>,
    pub reports_dir: PathBuf,
}
