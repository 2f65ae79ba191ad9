//! `kubecron serve`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kubecron_catalog::Catalog;
use kubecron_core::{config::JobConfig, Diagnostic, KubecronConfig};
use kubecron_exec::{ExecOptions, ShellRunner};
use kubecron_history::HistoryWriter;
use kubecron_scheduler::{JobStore, Scheduler, SchedulerSettings};
use tracing::{info, warn};

use crate::{catalog::load_catalog, jobs::resolve_job};

/// How often background failures are written to the log.
const NOTIFICATION_INTERVAL: Duration = Duration::from_secs(5);

pub async fn run(config: KubecronConfig) -> anyhow::Result<()> {
    let (catalog, notes) = load_catalog(&config.commands);
    for d in catalog.diagnostics().iter().chain(notes.iter()) {
        warn!("{d}");
    }

    let store = match config.scheduler.database_file() {
        Some(path) => {
            ensure_parent_dir(&path);
            info!(path = %path.display(), "opening job store");
            Some(JobStore::open(&path)?)
        }
        None => {
            warn!("no database_path set; jobs will not survive a restart");
            None
        }
    };

    config.reports.ensure_base_dir()?;
    let settings = SchedulerSettings::from_config(&config);
    let scheduler = Scheduler::new(
        settings,
        Arc::new(ShellRunner::new(ExecOptions::from_config(&config.scheduler))),
        Arc::new(HistoryWriter::from_config(&config.reports)),
        store,
    );

    let restored = scheduler.restore()?;
    for job in &restored {
        info!(job = %job.name, runs = job.runs, done = job.done, "job restored");
    }

    schedule_config_jobs(&scheduler, &config.jobs, &catalog);

    let active = scheduler.list_active_jobs();
    info!(jobs = active.len(), "kubecron running; press Ctrl-C to stop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(NOTIFICATION_INTERVAL);
    loop {
        tokio::select! {
            res = &mut shutdown => {
                if let Err(e) = res {
                    warn!("cannot listen for Ctrl-C: {e}");
                }
                break;
            }
            _ = ticker.tick() => {
                for d in scheduler.drain_notifications() {
                    report(&d);
                }
            }
        }
    }

    info!("shutting down; waiting for running commands");
    scheduler.shutdown().await;
    for d in scheduler.drain_notifications() {
        report(&d);
    }
    Ok(())
}

/// Start every `[[jobs]]` entry that is not already active (restored from
/// the store). Config jobs own their reports folder across restarts, so they
/// are adopted rather than claimed. Returns how many were started.
pub fn schedule_config_jobs(scheduler: &Scheduler, jobs: &[JobConfig], catalog: &Catalog) -> usize {
    let mut started = 0;
    for job in jobs {
        if scheduler.get_job(&job.name).is_some() {
            continue;
        }
        let adopted = resolve_job(job, catalog)
            .and_then(|spec| scheduler.adopt_job(spec).map_err(anyhow::Error::from));
        match adopted {
            Ok(scheduled) => {
                started += 1;
                info!(job = %scheduled.name, id = scheduled.id, next = ?scheduled.next_run, "job scheduled");
            }
            Err(e) => {
                warn!(job = %job.name, "job not started: {e}");
                report(&Diagnostic::registration(e.to_string()));
            }
        }
    }
    started
}

fn report(diagnostic: &Diagnostic) {
    warn!(kind = %diagnostic.kind, at = %diagnostic.at.format("%H:%M:%S"), "{}", diagnostic.message);
}

fn ensure_parent_dir(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(path = %parent.display(), "cannot create directory: {e}");
        }
    }
}
