//! kubecron-exec: runs scheduled commands through a shell interpreter.
//!
//! The scheduler only knows the [`CommandRunner`] trait; [`ShellRunner`] is
//! the production implementation:
//!
//! ```rust,no_run
//! use kubecron_exec::{CommandRunner, ExecOptions, ShellRunner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = ShellRunner::new(ExecOptions::default());
//!     let result = runner.run("kubectl get nodes", "sh").await.unwrap();
//!     println!("{}", result.combined());
//! }
//! ```

pub mod error;
pub mod runner;
pub mod truncate;
pub mod types;

pub use error::{ExecError, Result};
pub use runner::{CommandRunner, ShellRunner};
pub use types::{ExecOptions, ExecResult};
