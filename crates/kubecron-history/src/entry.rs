use std::collections::HashMap;

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Timestamp format of the `${time}` placeholder, e.g. `14:03:59 2024-01-02`.
pub const TIME_FORMAT: &str = "%H:%M:%S %Y-%m-%d";

/// One execution record. Never changes once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    timestamp: NaiveDateTime,
    command: String,
    output: String,
}

impl HistoryEntry {
    pub fn new(timestamp: NaiveDateTime, command: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            timestamp,
            command: command.into(),
            output: output.into(),
        }
    }

    /// Entry stamped with the current local time.
    pub fn now(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(Local::now().naive_local(), command, output)
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Day partition the entry belongs to.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Substitute `${time}`, `${command}` and `${output}` into `template`.
    pub fn render(&self, template: &str) -> String {
        let time = self.timestamp.format(TIME_FORMAT).to_string();
        let values = HashMap::from([
            ("time", time.as_str()),
            ("command", self.command.as_str()),
            ("output", self.output.as_str()),
        ]);
        render_template(template, &values)
    }
}

/// Replace every `${name}` whose name is in `values`.
///
/// Single pass: substituted text is never scanned again, so command output
/// containing `${...}` is written verbatim. Unknown placeholders and an
/// unterminated `${` are kept as they are.
pub fn render_template(template: &str, values: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match values.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("timestamp")
    }

    #[test]
    fn renders_all_placeholders() {
        let entry = HistoryEntry::new(at("2024-01-02 09:05:07"), "kubectl get ns", "default\nkube-system");
        let rendered = entry.render("[${time}] $ ${command}\n${output}\n");
        assert_eq!(rendered, "[09:05:07 2024-01-02] $ kubectl get ns\ndefault\nkube-system\n");
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let entry = HistoryEntry::new(at("2024-01-02 00:00:00"), "echo '${time}'", "${command}");
        let rendered = entry.render("${command} => ${output}");
        assert_eq!(rendered, "echo '${time}' => ${command}");
    }

    #[test]
    fn unknown_and_unterminated_placeholders_are_kept() {
        let values = HashMap::from([("time", "now")]);
        assert_eq!(render_template("${time} ${user} ${oops", &values), "now ${user} ${oops");
    }

    #[test]
    fn date_is_the_local_day() {
        let entry = HistoryEntry::new(at("2024-03-31 23:59:59"), "c", "o");
        assert_eq!(entry.date(), NaiveDate::from_ymd_opt(2024, 3, 31).expect("date"));
    }
}
