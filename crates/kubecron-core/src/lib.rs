//! `kubecron-core`: configuration, shared errors and the diagnostics
//! collector used by every other kubecron crate.

pub mod config;
pub mod diagnostics;
pub mod error;

pub use config::KubecronConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{KubecronError, Result};
