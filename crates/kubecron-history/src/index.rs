//! Report discovery.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use kubecron_core::Diagnostics;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{HistoryError, Result};

/// A history file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFile {
    /// Name of the top-level folder the file was found under.
    pub group: String,
    /// File name without extension.
    pub label: String,
    pub path: PathBuf,
}

impl ReportFile {
    /// The day this file covers, when its label is an ISO date.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.label, "%Y-%m-%d").ok()
    }

    pub fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(HistoryError::io(&self.path))
    }
}

/// group → (label → file), both levels in ascending order.
#[derive(Debug, Clone, Default)]
pub struct ReportIndex {
    groups: BTreeMap<String, BTreeMap<String, ReportFile>>,
}

impl ReportIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; a later file with the same group and label replaces the
    /// earlier one.
    pub fn insert(&mut self, file: ReportFile) {
        self.groups
            .entry(file.group.clone())
            .or_default()
            .insert(file.label.clone(), file);
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn labels(&self, group: &str) -> impl Iterator<Item = &str> {
        self.groups
            .get(group)
            .into_iter()
            .flat_map(|labels| labels.keys().map(String::as_str))
    }

    pub fn get(&self, group: &str, label: &str) -> Option<&ReportFile> {
        self.groups.get(group)?.get(label)
    }

    /// Every file, by group then label.
    pub fn files(&self) -> impl Iterator<Item = &ReportFile> {
        self.groups.values().flat_map(|labels| labels.values())
    }

    /// First label of the first group.
    pub fn first(&self) -> Option<&ReportFile> {
        self.files().next()
    }

    /// A copy of the index restricted to one group.
    pub fn only(&self, group: &str) -> ReportIndex {
        let groups = self
            .groups
            .get_key_value(group)
            .map(|(k, v)| BTreeMap::from([(k.clone(), v.clone())]))
            .unwrap_or_default();
        ReportIndex { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Raw content of one report.
    pub fn read(&self, group: &str, label: &str) -> Result<String> {
        self.get(group, label)
            .ok_or_else(|| HistoryError::ReportNotFound {
                group: group.to_string(),
                label: label.to_string(),
            })?
            .read()
    }
}

/// The report currently shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub group: String,
    pub label: String,
    pub raw: String,
}

/// Result of [`prepare_reports`]: the index, its default selection and any
/// I/O trouble met along the way.
#[derive(Debug, Default)]
pub struct ReportsView {
    pub index: ReportIndex,
    pub selection: Option<Selection>,
    pub diagnostics: Diagnostics,
}

impl ReportsView {
    /// Show another report. On failure the previous selection is kept and a
    /// notification is recorded.
    pub fn select(&mut self, group: &str, label: &str) -> bool {
        match self.index.read(group, label) {
            Ok(raw) => {
                self.selection = Some(Selection {
                    group: group.to_string(),
                    label: label.to_string(),
                    raw,
                });
                true
            }
            Err(e) => {
                warn!(group, label, "cannot select report: {e}");
                self.diagnostics.notify(format!("Cannot show report: {e}"));
                false
            }
        }
    }
}

/// Index every `*.<extension>` file found at most `depth` levels below each
/// immediate subfolder of `base`, and select the first one.
///
/// Failures are collected in [`ReportsView::diagnostics`]; the index keeps
/// whatever was found before the failure.
pub fn prepare_reports(base: &Path, depth: usize, extension: &str) -> ReportsView {
    let mut view = ReportsView::default();

    let groups = match list_group_dirs(base, &mut view.diagnostics) {
        Ok(groups) => groups,
        Err(e) => {
            warn!(base = %base.display(), "cannot list report groups: {e}");
            view.diagnostics
                .notify(format!("Cannot prepare reports: {e}"));
            return view;
        }
    };

    for (group, dir) in groups {
        for entry in WalkDir::new(&dir).max_depth(depth) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(group = %group, "report discovery failed: {e}");
                    view.diagnostics
                        .notify(format!("Cannot prepare reports for {group}: {e}"));
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(extension)
            {
                continue;
            }
            let Some(label) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            view.index.insert(ReportFile {
                group: group.clone(),
                label: label.to_string(),
                path: path.to_path_buf(),
            });
        }
    }
    debug!(files = view.index.len(), "reports indexed");

    if let Some(first) = view.index.first().cloned() {
        view.select(&first.group, &first.label);
    }
    view
}

/// Folder name (when UTF-8), path, and whether it is a directory.
type GroupEntry = (Option<String>, PathBuf, bool);

/// Immediate subfolders of `base`, sorted by name. Entries that cannot be
/// inspected are reported and skipped; only an unreadable `base` fails.
fn list_group_dirs(base: &Path, diagnostics: &mut Diagnostics) -> std::io::Result<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(base)?.map(|entry| -> std::io::Result<GroupEntry> {
        let entry = entry?;
        let is_dir = entry.file_type()?.is_dir();
        Ok((entry.file_name().to_str().map(str::to_string), entry.path(), is_dir))
    });
    Ok(collect_groups(entries, diagnostics))
}

fn collect_groups<I>(entries: I, diagnostics: &mut Diagnostics) -> Vec<(String, PathBuf)>
where
    I: IntoIterator<Item = std::io::Result<GroupEntry>>,
{
    let mut groups = Vec::new();
    for entry in entries {
        match entry {
            Ok((Some(name), path, true)) => groups.push((name, path)),
            Ok(_) => {}
            Err(e) => {
                warn!("cannot inspect report folder entry: {e}");
                diagnostics.notify(format!("Cannot prepare reports: {e}"));
            }
        }
    }
    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups
}
