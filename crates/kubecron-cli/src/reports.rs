//! `kubecron reports`, `kubecron history` and `kubecron show`

use chrono::NaiveDate;
use kubecron_core::{Diagnostics, KubecronConfig};
use kubecron_history::{prepare_reports, range_query, ReportsView};

fn prepare(config: &KubecronConfig) -> ReportsView {
    prepare_reports(
        &config.reports.base_dir(),
        config.reports.discovery_depth,
        &config.reports.extension,
    )
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for d in diagnostics.iter() {
        eprintln!("{d}");
    }
}

pub fn list(config: &KubecronConfig) {
    let view = prepare(config);
    for group in view.index.groups() {
        let labels: Vec<_> = view.index.labels(group).collect();
        println!("{group}: {}", labels.join(", "));
    }
    if let Some(selection) = &view.selection {
        println!("\n==> {}/{} <==\n{}", selection.group, selection.label, selection.raw);
    }
    print_diagnostics(&view.diagnostics);
}

pub fn history(config: &KubecronConfig, from: NaiveDate, to: NaiveDate, group: Option<&str>) {
    let view = prepare(config);
    let index = match group {
        Some(group) => view.index.only(group),
        None => view.index,
    };
    let report = range_query(&index, from, to);
    print!("{}", report.raw);
    print_diagnostics(&view.diagnostics);
    print_diagnostics(&report.diagnostics);
}

pub fn show(config: &KubecronConfig, group: &str, label: &str) -> anyhow::Result<()> {
    let view = prepare(config);
    print_diagnostics(&view.diagnostics);
    print!("{}", view.index.read(group, label)?);
    Ok(())
}
