use thiserror::Error;

use crate::types::PartialCommand;

/// Why a single field of a command block was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Missing,
    Blank,
    NotAString,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Violation::Missing => "missing",
            Violation::Blank => "blank",
            Violation::NotAString => "not a string",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub violation: Violation,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is {}", self.field, self.violation)
    }
}

/// A command definition, or a whole command file, that could not be parsed.
#[derive(Debug, Clone, Error)]
pub enum CommandParseError {
    /// One command block failed validation and was left out of the catalog.
    #[error(
        "Command parse error in {source_file}: name, group, description and command are \
         mandatory ({}). Object: {partial}",
        join_violations(.violations)
    )]
    InvalidCommand {
        source_file: String,
        partial: PartialCommand,
        violations: Vec<FieldViolation>,
    },

    /// A top-level value is not a table, so it cannot describe a command.
    #[error("Command parse error in {source_file}: entry '{name}' is not a table")]
    NotATable { source_file: String, name: String },

    /// The file is not valid TOML; none of its commands were read.
    #[error("Cannot parse command file {source_file}: {reason}")]
    InvalidDocument { source_file: String, reason: String },
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
