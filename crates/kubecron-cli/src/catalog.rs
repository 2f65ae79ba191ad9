//! `kubecron catalog`

use kubecron_catalog::{load_sources, Catalog};
use kubecron_core::{config::CommandsConfig, Diagnostics, KubecronConfig};

/// Predefined command files sit directly in their folder.
const PREDEFINED_DEPTH: usize = 1;

/// Parse the predefined catalog, then the user's, into one catalog.
///
/// Parse errors stay on the catalog; unreadable files and folders are
/// returned as notifications.
pub fn load_catalog(config: &CommandsConfig) -> (Catalog, Diagnostics) {
    let mut catalog = Catalog::new();
    let mut diagnostics = Diagnostics::new();

    let (predefined, notes) = load_sources(&config.predefined_dir(), PREDEFINED_DEPTH, &config.extension);
    diagnostics.extend(notes);
    catalog.ingest(&predefined);

    let (user, notes) = load_sources(&config.user_dir(), config.user_search_depth, &config.extension);
    diagnostics.extend(notes);
    catalog.ingest(&user);

    tracing::info!(
        commands = catalog.len(),
        errors = catalog.errors().len(),
        "catalog loaded"
    );
    (catalog, diagnostics)
}

pub fn run(config: &KubecronConfig, json: bool) -> anyhow::Result<()> {
    let (catalog, diagnostics) = load_catalog(&config.commands);

    if json {
        println!("{}", serde_json::to_string_pretty(catalog.commands())?);
    } else {
        for (group, commands) in catalog.groups() {
            println!("[{group}]");
            for c in commands {
                println!("  {:>3}  {}  ({})  {}", c.id, c.name, c.source, c.description);
                println!("       $ {}", c.command);
            }
            println!();
        }
    }

    for d in catalog.diagnostics().iter().chain(diagnostics.iter()) {
        eprintln!("{d}");
    }
    Ok(())
}
