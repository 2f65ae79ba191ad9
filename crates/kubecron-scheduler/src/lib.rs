//! `kubecron-scheduler`: Tokio-based cron scheduler for operator commands.
//!
//! # Overview
//!
//! A [`Scheduler`] is created once by the application and shared by handle.
//! [`Scheduler::start_job`] registers a job under its name and spawns one
//! timer task for it; every firing runs the command through a
//! [`CommandRunner`](kubecron_exec::CommandRunner) and prepends the result to
//! the job's day file via [`HistoryWriter`](kubecron_history::HistoryWriter).
//!
//! # Job kinds
//!
//! | Kind      | Behaviour                                                  |
//! |-----------|------------------------------------------------------------|
//! | recurring | Fires on every match of its cron expression until cancelled |
//! | one-shot  | Fires on the next match once, then is marked done           |
//!
//! Registered jobs can optionally be persisted to SQLite ([`JobStore`]) and
//! restored at startup with [`Scheduler::restore`].

pub mod db;
pub mod engine;
pub mod error;
pub mod expression;
pub mod store;
pub mod types;

pub use engine::{Scheduler, SchedulerSettings};
pub use error::{Result, SchedulerError};
pub use store::{JobStore, StoredJob};
pub use types::{JobSpec, JobSpecBuilder, ScheduledJob};
