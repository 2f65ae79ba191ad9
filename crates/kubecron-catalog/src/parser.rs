use std::collections::BTreeMap;

use kubecron_core::Diagnostic;
use tracing::{debug, error};

use crate::error::{CommandParseError, FieldViolation, Violation};
use crate::types::{CommandDefinition, PartialCommand};

/// Parse every command block of every source.
///
/// `sources` maps a source id (file stem) to raw TOML text. Display ids start
/// at `previous + 1`, so parsing the user catalog after the predefined one
/// continues the numbering. Rejected blocks do not consume an id.
pub fn parse_commands(
    previous: usize,
    sources: &BTreeMap<String, String>,
) -> (Vec<CommandDefinition>, Vec<CommandParseError>) {
    let mut commands = Vec::new();
    let mut errors = Vec::new();

    for (source, text) in sources {
        let table = match text.parse::<toml::Table>() {
            Ok(t) => t,
            Err(e) => {
                let err = CommandParseError::InvalidDocument {
                    source_file: source.clone(),
                    reason: e.message().to_string(),
                };
                error!("{err}");
                errors.push(err);
                continue;
            }
        };

        for (name, value) in &table {
            let Some(block) = value.as_table() else {
                let err = CommandParseError::NotATable {
                    source_file: source.clone(),
                    name: name.clone(),
                };
                error!("{err}");
                errors.push(err);
                continue;
            };

            let id = previous + commands.len() + 1;
            match read_block(id, source, name, block) {
                Ok(def) => {
                    debug!(id, source = %def.source, name = %def.name, "command parsed");
                    commands.push(def);
                }
                Err((partial, violations)) => {
                    let err = CommandParseError::InvalidCommand {
                        source_file: source.clone(),
                        partial,
                        violations,
                    };
                    error!("{err}");
                    errors.push(err);
                }
            }
        }
    }

    (commands, errors)
}

fn read_block(
    id: usize,
    source: &str,
    name: &str,
    block: &toml::Table,
) -> Result<CommandDefinition, (PartialCommand, Vec<FieldViolation>)> {
    let mut violations = Vec::new();
    if name.trim().is_empty() {
        violations.push(FieldViolation {
            field: "name",
            violation: Violation::Blank,
        });
    }

    let partial = PartialCommand {
        source: source.to_string(),
        name: name.to_string(),
        group: read_field(block, "group", &mut violations),
        description: read_field(block, "description", &mut violations),
        command: read_field(block, "command", &mut violations),
    };

    if !violations.is_empty() {
        return Err((partial, violations));
    }
    partial.into_definition(id).map_err(|p| (p, violations))
}

fn read_field(
    block: &toml::Table,
    field: &'static str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let violation = match block.get(field) {
        None => Violation::Missing,
        Some(toml::Value::String(s)) if s.trim().is_empty() => {
            violations.push(FieldViolation {
                field,
                violation: Violation::Blank,
            });
            return Some(s.clone());
        }
        Some(toml::Value::String(s)) => return Some(s.clone()),
        Some(_) => Violation::NotAString,
    };
    violations.push(FieldViolation { field, violation });
    None
}

/// The merged set of commands available for scheduling.
#[derive(Debug, Default)]
pub struct Catalog {
    commands: Vec<CommandDefinition>,
    errors: Vec<CommandParseError>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `sources` and append the valid commands.
    ///
    /// Returns the parse errors of this call; they are also kept on the
    /// catalog and available through [`Catalog::errors`].
    pub fn ingest(&mut self, sources: &BTreeMap<String, String>) -> Vec<CommandParseError> {
        let (commands, errors) = parse_commands(self.commands.len(), sources);
        self.commands.extend(commands);
        self.errors.extend(errors.iter().cloned());
        errors
    }

    pub fn commands(&self) -> &[CommandDefinition] {
        &self.commands
    }

    pub fn errors(&self) -> &[CommandParseError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// First command with the given name, in catalog order.
    pub fn find(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Commands grouped by their `group` field, groups in ascending order.
    pub fn groups(&self) -> BTreeMap<&str, Vec<&CommandDefinition>> {
        let mut groups: BTreeMap<&str, Vec<&CommandDefinition>> = BTreeMap::new();
        for command in &self.commands {
            groups.entry(command.group.as_str()).or_default().push(command);
        }
        groups
    }

    /// Parse errors rendered as operator diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors
            .iter()
            .map(|e| Diagnostic::parse(e.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const PODS: &str = r#"
[list-pods]
group = "pods"
description = "All pods"
command = "kubectl get pods -A"

[missing-group]
description = "No group here"
command = "kubectl get nodes"

[top-nodes]
group = "nodes"
description = "Node usage"
command = "kubectl top nodes"
"#;

    #[test]
    fn invalid_entry_is_skipped_and_reported() {
        let mut catalog = Catalog::new();
        let errors = catalog.ingest(&sources(&[("pods", PODS)]));

        let names: Vec<_> = catalog.commands().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["list-pods", "top-nodes"]);
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            CommandParseError::InvalidCommand {
                partial,
                violations,
                ..
            } => {
                assert_eq!(partial.name, "missing-group");
                assert_eq!(partial.command.as_deref(), Some("kubectl get nodes"));
                assert_eq!(
                    violations,
                    &vec![FieldViolation {
                        field: "group",
                        violation: Violation::Missing
                    }]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_and_non_string_fields_are_rejected() {
        let doc = r#"
[blank-command]
group = "pods"
description = "Blank command"
command = "   "

[numeric-description]
group = "pods"
description = 42
command = "kubectl get pods"
"#;
        let mut catalog = Catalog::new();
        let errors = catalog.ingest(&sources(&[("bad", doc)]));

        assert!(catalog.is_empty());
        assert_eq!(errors.len(), 2);
        let message = errors[0].to_string();
        assert!(message.contains("command is blank"), "{message}");
        let message = errors[1].to_string();
        assert!(message.contains("description is not a string"), "{message}");
    }

    #[test]
    fn ids_continue_across_ingest_calls() {
        let mut catalog = Catalog::new();
        catalog.ingest(&sources(&[("pods", PODS)]));
        catalog.ingest(&sources(&[(
            "mine",
            "[events]\ngroup = \"cluster\"\ndescription = \"Events\"\ncommand = \"kubectl get events\"\n",
        )]));

        let ids: Vec<_> = catalog.commands().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(catalog.find("events").map(|c| c.source.as_str()), Some("mine"));
    }

    #[test]
    fn broken_document_does_not_stop_other_sources() {
        let mut catalog = Catalog::new();
        let errors = catalog.ingest(&sources(&[("a-broken", "[oops"), ("pods", PODS)]));

        assert_eq!(catalog.len(), 2);
        assert!(matches!(
            errors[0],
            CommandParseError::InvalidDocument { ref source_file, .. } if source_file == "a-broken"
        ));
    }

    #[test]
    fn scalar_top_level_value_is_reported() {
        let mut catalog = Catalog::new();
        let errors = catalog.ingest(&sources(&[("odd", "version = 2\n")]));
        assert!(catalog.is_empty());
        assert!(matches!(errors[0], CommandParseError::NotATable { ref name, .. } if name == "version"));
    }

    #[test]
    fn groups_are_sorted() {
        let mut catalog = Catalog::new();
        catalog.ingest(&sources(&[("pods", PODS)]));
        let groups: Vec<_> = catalog.groups().keys().copied().collect();
        assert_eq!(groups, vec!["nodes", "pods"]);
        assert_eq!(catalog.diagnostics().len(), 1);
    }
}
