use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SHELL: &str = "sh";
pub const DEFAULT_COMMANDS_EXTENSION: &str = "toml";
pub const DEFAULT_REPORTS_EXTENSION: &str = "txt";
pub const DEFAULT_USER_SEARCH_DEPTH: usize = 10;
pub const DEFAULT_DISCOVERY_DEPTH: usize = 2;
pub const DEFAULT_MAX_CONCURRENT_RUNS: usize = 4;
pub const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_OUTPUT_CHARS: usize = 30_000;

/// Rendered once per execution; `${time}`, `${command}` and `${output}` are
/// substituted by the history writer.
pub const DEFAULT_ENTRY_TEMPLATE: &str = "\
----------------------------------------------------------------------------------------
Time: ${time}
Command: ${command}
----------------------------------------------------------------------------------------
${output}

";

/// Top-level config (kubecron.toml + KUBECRON_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KubecronConfig {
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Jobs started by `kubecron serve`.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// Where command definition files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Bundled catalog, parsed first.
    #[serde(default = "default_predefined_path")]
    pub predefined_path: String,
    /// Operator catalog, parsed after the predefined one.
    #[serde(default = "default_user_path")]
    pub user_path: String,
    #[serde(default = "default_user_search_depth")]
    pub user_search_depth: usize,
    #[serde(default = "default_commands_extension")]
    pub extension: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            predefined_path: default_predefined_path(),
            user_path: default_user_path(),
            user_search_depth: DEFAULT_USER_SEARCH_DEPTH,
            extension: DEFAULT_COMMANDS_EXTENSION.to_string(),
        }
    }
}

impl CommandsConfig {
    pub fn predefined_dir(&self) -> PathBuf {
        expand_home(&self.predefined_path)
    }

    pub fn user_dir(&self) -> PathBuf {
        expand_home(&self.user_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Root under which every job gets its own `<name>/` folder.
    #[serde(default = "default_reports_path")]
    pub base_path: String,
    #[serde(default = "default_reports_extension")]
    pub extension: String,
    /// Max directory depth searched below each group folder.
    #[serde(default = "default_discovery_depth")]
    pub discovery_depth: usize,
    #[serde(default = "default_entry_template")]
    pub entry_template: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            base_path: default_reports_path(),
            extension: DEFAULT_REPORTS_EXTENSION.to_string(),
            discovery_depth: DEFAULT_DISCOVERY_DEPTH,
            entry_template: DEFAULT_ENTRY_TEMPLATE.to_string(),
        }
    }
}

impl ReportsConfig {
    pub fn base_dir(&self) -> PathBuf {
        expand_home(&self.base_path)
    }

    /// Create the reports base folder when missing and return its path.
    pub fn ensure_base_dir(&self) -> crate::error::Result<PathBuf> {
        let dir = self.base_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interpreter used when a job does not name one.
    #[serde(default = "default_shell")]
    pub default_shell: String,
    /// Upper bound on executions running at the same time across all jobs.
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,
    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: u64,
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,
    /// SQLite file used to persist started jobs. Empty keeps the registry
    /// in memory only.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Extra environment passed to every command, e.g. `KUBECONFIG`.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_shell: DEFAULT_SHELL.to_string(),
            max_concurrent_runs: DEFAULT_MAX_CONCURRENT_RUNS,
            exec_timeout_secs: DEFAULT_EXEC_TIMEOUT_SECS,
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
            database_path: default_database_path(),
            env: BTreeMap::new(),
        }
    }
}

impl SchedulerConfig {
    pub fn database_file(&self) -> Option<PathBuf> {
        let path = self.database_path.trim();
        (!path.is_empty()).then(|| expand_home(path))
    }
}

/// A job declared in the config file.
///
/// Exactly one of `command` and `catalog` should be set; `catalog` names a
/// command definition whose template is used as the command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub catalog: Option<String>,
    pub expression: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default = "bool_true")]
    pub recurring: bool,
}

fn bool_true() -> bool {
    true
}

fn default_predefined_path() -> String {
    "~/.kubecron/commands".to_string()
}
fn default_user_path() -> String {
    "~/.kubecron/user-commands".to_string()
}
fn default_user_search_depth() -> usize {
    DEFAULT_USER_SEARCH_DEPTH
}
fn default_commands_extension() -> String {
    DEFAULT_COMMANDS_EXTENSION.to_string()
}
fn default_reports_path() -> String {
    "~/.kubecron/reports".to_string()
}
fn default_reports_extension() -> String {
    DEFAULT_REPORTS_EXTENSION.to_string()
}
fn default_discovery_depth() -> usize {
    DEFAULT_DISCOVERY_DEPTH
}
fn default_entry_template() -> String {
    DEFAULT_ENTRY_TEMPLATE.to_string()
}
fn default_database_path() -> String {
    "~/.kubecron/jobs.db".to_string()
}
fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}
fn default_max_concurrent_runs() -> usize {
    DEFAULT_MAX_CONCURRENT_RUNS
}
fn default_exec_timeout_secs() -> u64 {
    DEFAULT_EXEC_TIMEOUT_SECS
}
fn default_max_output_chars() -> usize {
    DEFAULT_MAX_OUTPUT_CHARS
}

/// Replace a leading `~` with `$HOME` (or `.` when HOME is unset).
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(format!("{home}{rest}"))
        }
        None => PathBuf::from(path),
    }
}

impl KubecronConfig {
    /// Load config from a TOML file with KUBECRON_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `KUBECRON_SCHEDULER__DEFAULT_SHELL=bash`.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.kubecron/kubecron.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path);

        let config: KubecronConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("KUBECRON_").split("__"))
            .extract()
            .map_err(|e| crate::error::KubecronError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> PathBuf {
    expand_home("~/.kubecron/kubecron.toml")
}
