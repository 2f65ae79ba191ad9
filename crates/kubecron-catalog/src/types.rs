use serde::Serialize;

/// One validated entry of the command catalog.
///
/// Identity is `(source, name)`; `id` is the 1-based display position
/// assigned when the entry was added to its [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    pub id: usize,
    /// Stem of the file the command was read from.
    pub source: String,
    pub name: String,
    pub group: String,
    pub description: String,
    /// Command text handed to the shell interpreter.
    pub command: String,
}

/// Whatever could be read from a command block before validation.
///
/// Kept on parse errors so the operator can see which entry was rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartialCommand {
    pub source: String,
    pub name: String,
    pub group: Option<String>,
    pub description: Option<String>,
    pub command: Option<String>,
}

impl PartialCommand {
    /// Succeeds when every mandatory field was read; otherwise hands the
    /// partial entry back unchanged.
    pub(crate) fn into_definition(self, id: usize) -> Result<CommandDefinition, PartialCommand> {
        match (self.group, self.description, self.command) {
            (Some(group), Some(description), Some(command)) => Ok(CommandDefinition {
                id,
                source: self.source,
                name: self.name,
                group,
                description,
                command,
            }),
            (group, description, command) => Err(PartialCommand {
                source: self.source,
                name: self.name,
                group,
                description,
                command,
            }),
        }
    }
}

impl std::fmt::Display for PartialCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{source: {}, name: {}, group: {:?}, description: {:?}, command: {:?}}}",
            self.source, self.name, self.group, self.description, self.command
        )
    }
}
