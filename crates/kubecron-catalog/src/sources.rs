//! Command file discovery.

use std::collections::BTreeMap;
use std::path::Path;

use kubecron_core::Diagnostics;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Read every `*.<extension>` file under `dir`, at most `max_depth` levels
/// deep, keyed by file stem.
///
/// Unreadable entries are reported as notifications and skipped; whatever
/// was read is still returned. Two files sharing a stem keep the one
/// visited last.
pub fn load_sources(
    dir: &Path,
    max_depth: usize,
    extension: &str,
) -> (BTreeMap<String, String>, Diagnostics) {
    let mut sources = BTreeMap::new();
    let mut diagnostics = Diagnostics::new();

    for entry in WalkDir::new(dir).max_depth(max_depth).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), "command discovery failed: {e}");
                diagnostics.notify(format!(
                    "Error at parse commands in {}: {e}",
                    dir.display()
                ));
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension)
        {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "command file loaded");
                if sources.insert(stem.to_string(), text).is_some() {
                    warn!(source = stem, path = %path.display(), "duplicate command file name; keeping the last one");
                }
            }
            Err(e) => {
                warn!(path = %path.display(), "cannot read command file: {e}");
                diagnostics.notify(format!("Error at parse commands {}: {e}", path.display()));
            }
        }
    }

    (sources, diagnostics)
}
