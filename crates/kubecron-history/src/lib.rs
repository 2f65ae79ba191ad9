//! `kubecron-history`: execution history files and the report views built
//! on top of them.
//!
//! # Layout
//!
//! ```text
//! <reports base>/
//!   <job name>/
//!     2024-01-02.txt   newest entry first
//!     2024-01-01.txt
//! ```
//!
//! Each job owns one folder (its *group*); every day it runs gets one file
//! (its *label* is the ISO date). [`HistoryWriter`] prepends rendered entries
//! to the day file, [`prepare_reports`] indexes the tree, and
//! [`range_query`] stitches day files into one report.

pub mod entry;
pub mod error;
pub mod index;
pub mod range;
pub mod writer;

pub use entry::{render_template, HistoryEntry, TIME_FORMAT};
pub use error::{HistoryError, Result};
pub use index::{prepare_reports, ReportFile, ReportIndex, ReportsView, Selection};
pub use range::{day_header, range_query, RangePreset, RangeReport};
pub use writer::HistoryWriter;
