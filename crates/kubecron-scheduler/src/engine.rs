use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use kubecron_core::{config::KubecronConfig, Diagnostic, Diagnostics};
use kubecron_exec::CommandRunner;
use kubecron_history::{HistoryEntry, HistoryWriter};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::{Result, SchedulerError},
    expression::{next_fire, parse_expression},
    store::JobStore,
    types::{JobSpec, ScheduledJob},
};

/// Process-wide scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Every job writes to `<reports_base>/<job name>/`.
    pub reports_base: PathBuf,
    pub default_shell: String,
    pub max_concurrent_runs: usize,
}

impl SchedulerSettings {
    pub fn from_config(config: &KubecronConfig) -> Self {
        Self {
            reports_base: config.reports.base_dir(),
            default_shell: config.scheduler.default_shell.clone(),
            max_concurrent_runs: config.scheduler.max_concurrent_runs,
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    runs: u64,
    done: bool,
    last_run: Option<DateTime<Local>>,
}

/// A registered job as seen by its timer task and by reruns.
struct JobTarget {
    id: u64,
    spec: JobSpec,
    shell: String,
    schedule: cron::Schedule,
    reports_dir: PathBuf,
    progress: Mutex<Progress>,
}

impl JobTarget {
    fn snapshot(&self) -> ScheduledJob {
        let progress = self.progress.lock().expect("job progress poisoned");
        let next_run = if progress.done {
            None
        } else {
            next_fire(&self.schedule, Local::now())
        };
        ScheduledJob {
            id: self.id,
            name: self.spec.name().to_string(),
            command: self.spec.command().to_string(),
            expression: self.spec.expression().to_string(),
            description: self.spec.description().to_string(),
            email: self.spec.email().map(str::to_string),
            shell: self.shell.clone(),
            recurring: self.spec.recurring(),
            runs: progress.runs,
            done: progress.done,
            last_run: progress.last_run,
            next_run,
            reports_dir: self.reports_dir.clone(),
        }
    }
}

struct JobSlot {
    target: Arc<JobTarget>,
    /// Sending `true` (or dropping the sender) stops the timer task.
    cancel: watch::Sender<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Schedule,
    Rerun,
}

struct Inner {
    settings: SchedulerSettings,
    registry: Mutex<BTreeMap<String, JobSlot>>,
    next_id: AtomicU64,
    permits: Semaphore,
    permit_count: u32,
    runner: Arc<dyn CommandRunner>,
    writer: Arc<HistoryWriter>,
    store: Option<JobStore>,
    notifications: Mutex<Diagnostics>,
}

impl Inner {
    fn notify(&self, message: impl Into<String>) {
        self.notifications
            .lock()
            .expect("notifications poisoned")
            .notify(message);
    }

    fn push(&self, diagnostic: Diagnostic) {
        self.notifications
            .lock()
            .expect("notifications poisoned")
            .push(diagnostic);
    }
}

/// Registry of active jobs. Cheap to clone; all clones share one registry.
///
/// Each job has its own timer task. Executions from every job share a
/// bounded pool of `max_concurrent_runs` permits, and a job's run counter
/// and done flag are only updated under that job's lock, so overlapping
/// firings of one job never lose an increment.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new(
        settings: SchedulerSettings,
        runner: Arc<dyn CommandRunner>,
        writer: Arc<HistoryWriter>,
        store: Option<JobStore>,
    ) -> Self {
        let permit_count = u32::try_from(settings.max_concurrent_runs.max(1)).unwrap_or(u32::MAX);
        Self {
            inner: Arc::new(Inner {
                settings,
                registry: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
                permits: Semaphore::new(permit_count as usize),
                permit_count,
                runner,
                writer,
                store,
                notifications: Mutex::new(Diagnostics::new()),
            }),
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.inner.settings
    }

    /// Register `spec` and start its timer.
    ///
    /// The job's reports folder doubles as a claim on the name: if another
    /// active job uses the name, or the folder already exists (a job of that
    /// name ran before, even in an earlier process), registration fails with
    /// [`SchedulerError::DuplicateJobName`] and nothing changes. Otherwise
    /// the folder is created before the job becomes visible.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_job(&self, spec: JobSpec) -> Result<ScheduledJob> {
        let target = self.register(spec, true, Progress::default())?;
        self.persist(&target);
        info!(
            job = %target.spec.name(),
            id = target.id,
            expression = %target.spec.expression(),
            "job started"
        );
        Ok(target.snapshot())
    }

    /// Register a job the application declares itself (e.g. in its config
    /// file) and start its timer, reusing the job's reports folder when it
    /// already exists.
    ///
    /// Only an active job with the same name is a conflict. Must be called
    /// from within a Tokio runtime.
    pub fn adopt_job(&self, spec: JobSpec) -> Result<ScheduledJob> {
        let target = self.register(spec, false, Progress::default())?;
        self.persist(&target);
        info!(
            job = %target.spec.name(),
            id = target.id,
            expression = %target.spec.expression(),
            "job adopted"
        );
        Ok(target.snapshot())
    }

    /// Run `name` once right now, outside its schedule, and wait for the
    /// execution to finish. Returns the job's state afterwards.
    ///
    /// A rerun counts as a run but never marks a one-shot job done.
    pub async fn rerun_job(&self, name: &str) -> Result<ScheduledJob> {
        let target = self.target(name)?;
        execute(&self.inner, &target, Trigger::Rerun).await;
        Ok(target.snapshot())
    }

    /// Remove `name` from the registry and stop its timer.
    ///
    /// An execution already in progress runs to completion and still writes
    /// its history entry. The reports folder is left in place, so the name
    /// stays taken.
    pub fn cancel_job(&self, name: &str) -> Result<ScheduledJob> {
        let slot = self
            .inner
            .registry
            .lock()
            .expect("job registry poisoned")
            .remove(name)
            .ok_or_else(|| SchedulerError::JobNotFound {
                name: name.to_string(),
            })?;
        // The timer task may already have exited (one-shot job).
        let _ = slot.cancel.send(true);

        if let Some(store) = &self.inner.store {
            if let Err(e) = store.delete(name) {
                warn!(job = %name, "cannot remove persisted job: {e}");
                self.inner
                    .notify(format!("Job '{name}' may come back after a restart: {e}"));
            }
        }
        info!(job = %name, "job cancelled");
        Ok(slot.target.snapshot())
    }

    /// Snapshot of every registered job, ordered by name.
    pub fn list_active_jobs(&self) -> Vec<ScheduledJob> {
        self.inner
            .registry
            .lock()
            .expect("job registry poisoned")
            .values()
            .map(|slot| slot.target.snapshot())
            .collect()
    }

    pub fn get_job(&self, name: &str) -> Option<ScheduledJob> {
        self.target(name).ok().map(|target| target.snapshot())
    }

    /// Re-register every job held by the store, with its stored progress.
    ///
    /// Restored jobs already own their reports folder, so the folder check
    /// of [`start_job`](Self::start_job) does not apply. Jobs that cannot be
    /// restored are reported as registration diagnostics. One-shot jobs that
    /// are already done are listed but get no timer.
    pub fn restore(&self) -> Result<Vec<ScheduledJob>> {
        let Some(store) = &self.inner.store else {
            return Ok(Vec::new());
        };

        let mut restored = Vec::new();
        for stored in store.list()? {
            let name = stored.spec.name().to_string();
            let progress = Progress {
                runs: stored.runs,
                done: stored.done,
                last_run: None,
            };
            match self.register(stored.spec, false, progress) {
                Ok(target) => restored.push(target.snapshot()),
                Err(e) => {
                    warn!(job = %name, "cannot restore job: {e}");
                    self.inner
                        .push(Diagnostic::registration(format!("Cannot restore job '{name}': {e}")));
                }
            }
        }
        info!(count = restored.len(), "jobs restored");
        Ok(restored)
    }

    /// Stop every timer and wait for in-flight executions to finish.
    ///
    /// Jobs stay in the store, so [`restore`](Self::restore) brings them
    /// back on the next start. Executions requested after shutdown are
    /// skipped.
    pub async fn shutdown(&self) {
        let slots = std::mem::take(&mut *self.inner.registry.lock().expect("job registry poisoned"));
        for slot in slots.values() {
            let _ = slot.cancel.send(true);
        }

        // Holding every permit means no execution is running.
        if let Ok(_all) = self.inner.permits.acquire_many(self.inner.permit_count).await {
            self.inner.permits.close();
        }
        info!(jobs = slots.len(), "scheduler stopped");
    }

    /// Failures met by background executions since the last drain.
    pub fn drain_notifications(&self) -> Vec<Diagnostic> {
        self.inner
            .notifications
            .lock()
            .expect("notifications poisoned")
            .drain()
    }

    // --- private helpers ---------------------------------------------------

    fn persist(&self, target: &JobTarget) {
        if let Some(store) = &self.inner.store {
            if let Err(e) = store.insert(&target.spec) {
                warn!(job = %target.spec.name(), "cannot persist job: {e}");
                self.inner
                    .notify(format!("Job '{}' will not survive a restart: {e}", target.spec.name()));
            }
        }
    }

    fn target(&self, name: &str) -> Result<Arc<JobTarget>> {
        self.inner
            .registry
            .lock()
            .expect("job registry poisoned")
            .get(name)
            .map(|slot| Arc::clone(&slot.target))
            .ok_or_else(|| SchedulerError::JobNotFound {
                name: name.to_string(),
            })
    }

    fn register(&self, spec: JobSpec, claim_folder: bool, progress: Progress) -> Result<Arc<JobTarget>> {
        validate_name(spec.name())?;
        let schedule = parse_expression(spec.expression())?;
        let reports_dir = self.inner.settings.reports_base.join(spec.name());
        let shell = spec
            .shell()
            .unwrap_or(&self.inner.settings.default_shell)
            .to_string();
        let done = progress.done;
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let target = {
            let mut registry = self.inner.registry.lock().expect("job registry poisoned");
            if registry.contains_key(spec.name()) || (claim_folder && reports_dir.exists()) {
                return Err(SchedulerError::DuplicateJobName {
                    name: spec.name().to_string(),
                });
            }
            std::fs::create_dir_all(&reports_dir).map_err(|source| {
                SchedulerError::ReportsFolder {
                    path: reports_dir.clone(),
                    source,
                }
            })?;

            let target = Arc::new(JobTarget {
                id: self.inner.next_id.fetch_add(1, Ordering::SeqCst),
                spec,
                shell,
                schedule,
                reports_dir,
                progress: Mutex::new(progress),
            });
            registry.insert(
                target.spec.name().to_string(),
                JobSlot {
                    target: Arc::clone(&target),
                    cancel: cancel_tx,
                },
            );
            target
        };

        if !done {
            tokio::spawn(run_timer(
                Arc::clone(&self.inner),
                Arc::clone(&target),
                cancel_rx,
            ));
        }
        Ok(target)
    }
}

/// Job names become folder names, so they must be exactly one plain path
/// component.
fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c.to_str() == Some(name)
    );
    if name.trim().is_empty() || !single {
        return Err(SchedulerError::InvalidJob(format!(
            "'{name}' cannot be used as a job name; it must be a single folder name"
        )));
    }
    Ok(())
}

/// Sleep until each match of the job's expression and fire. Returns when
/// cancelled, when a one-shot job has fired, or when the expression has no
/// future match.
async fn run_timer(inner: Arc<Inner>, target: Arc<JobTarget>, mut cancel: watch::Receiver<bool>) {
    let name = target.spec.name().to_string();
    let mut last_fired: Option<DateTime<Local>> = None;

    loop {
        let now = Local::now();
        // Never compute from before the last firing; the wall clock and the
        // timer clock can disagree by a few microseconds.
        let from = last_fired.map_or(now, |fired| fired.max(now));
        let Some(next) = next_fire(&target.schedule, from) else {
            info!(job = %name, "no upcoming match, timer stopped");
            break;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        debug!(job = %name, next = %next, "timer armed");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    debug!(job = %name, "timer cancelled");
                    break;
                }
                continue;
            }
        }

        last_fired = Some(next);
        execute(&inner, &target, Trigger::Schedule).await;
        if !target.spec.recurring() {
            break;
        }
    }
}

/// One execution: run the command and prepend the outcome to today's file.
///
/// Failures never propagate; they are logged and recorded as notifications.
async fn execute(inner: &Inner, target: &JobTarget, trigger: Trigger) {
    let name = target.spec.name();
    let Ok(_permit) = inner.permits.acquire().await else {
        debug!(job = %name, "scheduler stopped, run skipped");
        return;
    };

    let run = {
        let mut progress = target.progress.lock().expect("job progress poisoned");
        progress.runs += 1;
        progress.last_run = Some(Local::now());
        progress.runs
    };
    let run_id = Uuid::now_v7();
    info!(job = %name, %run_id, run, ?trigger, "executing job");

    let output = match inner.runner.run(target.spec.command(), &target.shell).await {
        Ok(result) => {
            if !result.success() {
                warn!(job = %name, %run_id, exit_code = result.exit_code, "command exited with failure");
            }
            result.combined()
        }
        Err(e) => {
            warn!(job = %name, %run_id, "command failed: {e}");
            inner.notify(format!("Job '{name}' could not run its command: {e}"));
            format!("Command failed: {e}")
        }
    };

    let entry = HistoryEntry::now(target.spec.command(), output);
    if let Err(e) = inner.writer.append(&target.reports_dir, &entry).await {
        warn!(job = %name, %run_id, "cannot write history: {e}");
        inner.notify(format!("Cannot write command to execution history: {e}"));
    }

    let (runs, done) = {
        let mut progress = target.progress.lock().expect("job progress poisoned");
        if trigger == Trigger::Schedule && !target.spec.recurring() {
            progress.done = true;
        }
        (progress.runs, progress.done)
    };

    if let Some(store) = &inner.store {
        if let Err(e) = store.update_progress(name, runs, done) {
            warn!(job = %name, "cannot store job progress: {e}");
            inner.notify(format!("Cannot store progress of job '{name}': {e}"));
        }
    }
    debug!(job = %name, %run_id, runs, done, "run finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kubecron_core::DiagnosticKind;
    use kubecron_exec::{ExecError, ExecResult};
    use std::time::Duration;

    /// Six-field expression that only matches at midnight on January 1st.
    const YEARLY: &str = "0 0 0 1 1 *";
    const EVERY_SECOND: &str = "* * * * * *";

    #[derive(Default)]
    struct FakeRunner {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
        delay: Duration,
    }

    impl FakeRunner {
        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().expect("calls poisoned").clone()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, command: &str, shell: &str) -> kubecron_exec::Result<ExecResult> {
            self.calls
                .lock()
                .expect("calls poisoned")
                .push((command.to_string(), shell.to_string()));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(ExecError::Spawn {
                    shell: shell.to_string(),
                    reason: "not found".to_string(),
                });
            }
            Ok(ExecResult {
                exit_code: 0,
                stdout: format!("ran {command}"),
                stderr: String::new(),
            })
        }
    }

    fn scheduler_with(base: &Path, runner: Arc<FakeRunner>, store: Option<JobStore>) -> Scheduler {
        Scheduler::new(
            SchedulerSettings {
                reports_base: base.to_path_buf(),
                default_shell: "sh".to_string(),
                max_concurrent_runs: 2,
            },
            runner,
            Arc::new(HistoryWriter::new("${command}|${output}\n", "txt")),
            store,
        )
    }

    fn yearly(name: &str, command: &str) -> JobSpec {
        JobSpec::builder(name, command, YEARLY).build()
    }

    /// Contents of every history file in `dir`.
    fn history(dir: &Path) -> Vec<String> {
        let mut files: Vec<_> = std::fs::read_dir(dir)
            .expect("read_dir")
            .map(|e| e.expect("entry").path())
            .collect();
        files.sort();
        files
            .iter()
            .map(|p| std::fs::read_to_string(p).expect("read"))
            .collect()
    }

    async fn wait_for(scheduler: &Scheduler, name: &str, pred: impl Fn(&ScheduledJob) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if scheduler.get_job(name).is_some_and(|job| pred(&job)) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .expect("condition reached within 5s");
    }

    #[tokio::test]
    async fn existing_folder_blocks_registration() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("backup")).expect("mkdir");
        let scheduler = scheduler_with(dir.path(), Arc::default(), None);

        let err = scheduler.start_job(yearly("backup", "tar czf b.tgz /etc")).unwrap_err();

        assert!(matches!(err, SchedulerError::DuplicateJobName { ref name } if name == "backup"));
        assert!(err.to_string().contains("already exists or existed"));
        assert!(scheduler.list_active_jobs().is_empty());
    }

    #[tokio::test]
    async fn active_name_cannot_be_started_twice() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scheduler = scheduler_with(dir.path(), Arc::default(), None);

        let first = scheduler.start_job(yearly("pods", "kubectl get pods")).expect("start");
        let err = scheduler.start_job(yearly("pods", "kubectl get nodes")).unwrap_err();

        assert!(matches!(err, SchedulerError::DuplicateJobName { .. }));
        let jobs = scheduler.list_active_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, first.id);
        assert_eq!(jobs[0].command, "kubectl get pods");
    }

    #[tokio::test]
    async fn rejected_jobs_leave_no_trace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scheduler = scheduler_with(dir.path(), Arc::default(), None);

        let err = scheduler
            .start_job(JobSpec::builder("nodes", "kubectl get nodes", "every day").build())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidExpression { .. }));
        assert!(!dir.path().join("nodes").exists());

        for bad in ["", "  ", "../escape", "a/b", "."] {
            let err = scheduler.start_job(yearly(bad, "true")).unwrap_err();
            assert!(matches!(err, SchedulerError::InvalidJob(_)), "{bad:?}");
        }
        assert!(scheduler.list_active_jobs().is_empty());
    }

    #[tokio::test]
    async fn start_creates_folder_and_assigns_sequential_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scheduler = scheduler_with(dir.path(), Arc::default(), None);

        let a = scheduler.start_job(yearly("a", "true")).expect("start a");
        let b = scheduler.start_job(yearly("b", "true")).expect("start b");

        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(a.reports_dir, dir.path().join("a"));
        assert!(a.reports_dir.is_dir());
        assert_eq!(a.runs, 0);
        assert!(a.next_run.is_some());
        assert_eq!(a.shell, "sh");
    }

    #[tokio::test]
    async fn rerun_executes_now_and_writes_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = Arc::new(FakeRunner::default());
        let scheduler = scheduler_with(dir.path(), runner.clone(), None);
        let before = scheduler
            .start_job(
                JobSpec::builder("ns", "kubectl get ns", YEARLY)
                    .shell("bash")
                    .build(),
            )
            .expect("start");

        let after = scheduler.rerun_job("ns").await.expect("rerun");

        assert_eq!(before.runs, 0);
        assert_eq!(after.runs, 1);
        assert!(after.last_run.is_some());
        assert_eq!(
            runner.calls(),
            vec![("kubectl get ns".to_string(), "bash".to_string())]
        );
        assert_eq!(
            history(&dir.path().join("ns")),
            vec!["kubectl get ns|ran kubectl get ns\n".to_string()]
        );
    }

    #[tokio::test]
    async fn reruns_of_one_job_never_lose_a_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scheduler = scheduler_with(dir.path(), Arc::default(), None);
        scheduler.start_job(yearly("pods", "kubectl get pods")).expect("start");

        let mut handles = Vec::new();
        for _ in 0..10 {
            let scheduler = scheduler.clone();
            handles.push(tokio::spawn(async move { scheduler.rerun_job("pods").await }));
        }
        for handle in handles {
            handle.await.expect("join").expect("rerun");
        }

        assert_eq!(scheduler.get_job("pods").expect("job").runs, 10);
        let lines: usize = history(&dir.path().join("pods"))
            .iter()
            .map(|content| content.lines().count())
            .sum();
        assert_eq!(lines, 10);
    }

    #[tokio::test]
    async fn one_shot_job_fires_once_then_is_done() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = Arc::new(FakeRunner::default());
        let scheduler = scheduler_with(dir.path(), runner.clone(), None);
        scheduler
            .start_job(JobSpec::builder("once", "date", EVERY_SECOND).one_shot().build())
            .expect("start");

        wait_for(&scheduler, "once", |job| job.done).await;
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        let job = scheduler.get_job("once").expect("still listed");
        assert_eq!(job.runs, 1);
        assert!(job.done);
        assert!(job.next_run.is_none());
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn recurring_job_fires_until_cancelled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = Arc::new(FakeRunner::default());
        let scheduler = scheduler_with(dir.path(), runner.clone(), None);
        scheduler
            .start_job(JobSpec::builder("tick", "uptime", EVERY_SECOND).build())
            .expect("start");

        wait_for(&scheduler, "tick", |job| job.runs >= 2).await;
        let cancelled = scheduler.cancel_job("tick").expect("cancel");
        let calls = runner.calls().len();
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        assert!(cancelled.runs >= 2);
        assert!(!cancelled.done);
        assert_eq!(runner.calls().len(), calls);
        assert!(scheduler.list_active_jobs().is_empty());

        // The folder outlives the job and keeps the name taken.
        assert!(dir.path().join("tick").is_dir());
        let err = scheduler.start_job(yearly("tick", "uptime")).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateJobName { .. }));
    }

    #[tokio::test]
    async fn cancel_lets_the_running_execution_finish() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = Arc::new(FakeRunner {
            delay: Duration::from_millis(800),
            ..FakeRunner::default()
        });
        let scheduler = scheduler_with(dir.path(), runner.clone(), None);
        scheduler
            .start_job(JobSpec::builder("slow", "kubectl top nodes", EVERY_SECOND).build())
            .expect("start");

        // `runs` is bumped before the command starts, so this is mid-run.
        wait_for(&scheduler, "slow", |job| job.runs >= 1).await;
        let cancelled = scheduler.cancel_job("slow").expect("cancel");
        assert!(history(&dir.path().join("slow")).is_empty());

        tokio::time::sleep(Duration::from_millis(1_500)).await;

        assert_eq!(cancelled.runs, 1);
        assert_eq!(runner.calls().len(), 1);
        let lines: usize = history(&dir.path().join("slow"))
            .iter()
            .map(|content| content.lines().count())
            .sum();
        assert_eq!(lines, 1);
        assert!(scheduler.list_active_jobs().is_empty());
    }

    #[tokio::test]
    async fn adopted_job_reuses_its_folder_after_restart() {
        let dir = tempfile::tempdir().expect("tempdir");

        let first = scheduler_with(dir.path(), Arc::default(), None);
        first
            .adopt_job(yearly("nightly", "kubectl get events -A"))
            .expect("first adopt");
        first.shutdown().await;
        assert!(dir.path().join("nightly").is_dir());

        let second = scheduler_with(dir.path(), Arc::default(), None);
        let err = second.start_job(yearly("nightly", "kubectl get events -A")).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateJobName { .. }));

        let job = second
            .adopt_job(yearly("nightly", "kubectl get events -A"))
            .expect("adopt after restart");
        assert_eq!(job.reports_dir, dir.path().join("nightly"));
        assert_eq!(second.list_active_jobs().len(), 1);

        // An active name is still taken.
        let err = second.adopt_job(yearly("nightly", "true")).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateJobName { .. }));
        assert_eq!(second.list_active_jobs().len(), 1);
    }

    #[tokio::test]
    async fn unknown_jobs_are_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scheduler = scheduler_with(dir.path(), Arc::default(), None);

        assert!(matches!(
            scheduler.rerun_job("ghost").await.unwrap_err(),
            SchedulerError::JobNotFound { .. }
        ));
        assert!(matches!(
            scheduler.cancel_job("ghost").unwrap_err(),
            SchedulerError::JobNotFound { .. }
        ));
        assert!(scheduler.get_job("ghost").is_none());
    }

    #[tokio::test]
    async fn runner_failure_is_recorded_and_notified() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = Arc::new(FakeRunner {
            fail: true,
            ..FakeRunner::default()
        });
        let scheduler = scheduler_with(dir.path(), runner, None);
        scheduler.start_job(yearly("broken", "kubectl version")).expect("start");

        let job = scheduler.rerun_job("broken").await.expect("rerun");

        assert_eq!(job.runs, 1);
        let content = history(&dir.path().join("broken")).concat();
        assert!(content.starts_with("kubectl version|Command failed: Spawn error"));
        let notes = scheduler.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, DiagnosticKind::Notification);
        assert!(scheduler.drain_notifications().is_empty());
    }

    #[tokio::test]
    async fn history_write_failure_becomes_notification() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scheduler = scheduler_with(dir.path(), Arc::default(), None);
        let job = scheduler.start_job(yearly("pods", "kubectl get pods")).expect("start");

        // Replace the job folder with a plain file.
        std::fs::remove_dir(&job.reports_dir).expect("rmdir");
        std::fs::write(&job.reports_dir, "blocker").expect("write");

        let after = scheduler.rerun_job("pods").await.expect("rerun");

        assert_eq!(after.runs, 1);
        let notes = scheduler.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert!(notes[0]
            .message
            .starts_with("Cannot write command to execution history"));
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_runs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = Arc::new(FakeRunner {
            delay: Duration::from_millis(300),
            ..FakeRunner::default()
        });
        let scheduler = scheduler_with(dir.path(), runner, None);
        scheduler.start_job(yearly("slow", "sleep 1")).expect("start");

        let background = scheduler.clone();
        let rerun = tokio::spawn(async move { background.rerun_job("slow").await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        scheduler.shutdown().await;

        assert_eq!(history(&dir.path().join("slow")).len(), 1);
        assert!(scheduler.list_active_jobs().is_empty());
        rerun.await.expect("join").expect("rerun");
    }

    #[tokio::test]
    async fn restore_brings_back_persisted_jobs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let reports = dir.path().join("reports");
        let db = dir.path().join("jobs.db");

        let first = scheduler_with(&reports, Arc::default(), Some(JobStore::open(&db).expect("open")));
        first.start_job(yearly("pods", "kubectl get pods")).expect("start pods");
        first.start_job(yearly("gone", "true")).expect("start gone");
        first.rerun_job("pods").await.expect("rerun");
        first.cancel_job("gone").expect("cancel");
        first.shutdown().await;

        let second = scheduler_with(&reports, Arc::default(), Some(JobStore::open(&db).expect("reopen")));
        let restored = second.restore().expect("restore");

        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].name, "pods");
        assert_eq!(restored[0].runs, 1);
        assert_eq!(second.rerun_job("pods").await.expect("rerun").runs, 2);
        assert!(second.drain_notifications().is_empty());
    }

    #[tokio::test]
    async fn restore_without_store_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scheduler = scheduler_with(dir.path(), Arc::default(), None);
        assert!(scheduler.restore().expect("restore").is_empty());
    }
}
