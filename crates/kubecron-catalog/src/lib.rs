//! `kubecron-catalog`: parses command definition files into a catalog.
//!
//! A command file is a TOML document where each top-level table is one
//! command:
//!
//! ```toml
//! [pods-not-running]
//! group = "pods"
//! description = "List pods that are not Running"
//! command = "kubectl get pods -A --field-selector=status.phase!=Running"
//! ```
//!
//! Files are merged into one [`Catalog`]: the predefined set first, then the
//! operator's own files. Malformed entries are reported as
//! [`CommandParseError`]s and skipped; they never abort the batch.

pub mod error;
pub mod parser;
pub mod sources;
pub mod types;

pub use error::{CommandParseError, FieldViolation, Violation};
pub use parser::Catalog;
pub use sources::load_sources;
pub use types::{CommandDefinition, PartialCommand};
