//! Reporting capability injected into every component.
//!
//! Components describe what happened through [`Notice`] values; the caller
//! decides where they go. [`TracingReporter`] is what the binary uses.

use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::error::TriplineError;
use crate::monitor::CycleReport;
use crate::reconcile::{DriftCause, DriftEvent};

#[derive(Debug)]
pub enum Notice<'a> {
    /// A root directory or explicit file was accepted into the monitored set.
    Monitoring { path: &'a Path },
    /// A root or explicit file was rejected and skipped.
    Skipped { error: &'a TriplineError },
    /// A valid root contained no files after exclusions.
    RootEmpty { path: &'a Path },
    HashFailed { error: &'a TriplineError },
    Drift(&'a DriftEvent),
    /// A modification was detected but could not be appended to the alert record.
    AlertNotRecorded { error: &'a TriplineError },
    BaselineSaved { path: &'a Path, entries: usize },
    CycleCompleted(&'a CycleReport),
}

pub trait Reporter {
    fn notify(&self, notice: Notice<'_>);
}

/// Discards every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn notify(&self, _notice: Notice<'_>) {}
}

/// Forwards notices to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn notify(&self, notice: Notice<'_>) {
        match notice {
            Notice::Monitoring { path } => info!(path = %path.display(), "monitoring"),
            Notice::Skipped { error } => error!("{error}"),
            Notice::RootEmpty { path } => {
                warn!(path = %path.display(), "directory is potentially empty")
            }
            Notice::HashFailed { error } => error!("error hashing file: {error}"),
            Notice::Drift(event) => match event.cause {
                DriftCause::Modified => warn!(path = %event.path, "File {} has been modified.", event.path),
                DriftCause::Missing => warn!(path = %event.path, "monitored file is missing"),
                DriftCause::Unreadable => error!(
                    path = %event.path,
                    detail = event.detail.as_deref().unwrap_or(""),
                    "monitored file is unreadable"
                ),
            },
            Notice::AlertNotRecorded { error } => error!("alert not recorded: {error}"),
            Notice::BaselineSaved { path, entries } => {
                debug!(path = %path.display(), entries, "baseline saved")
            }
            Notice::CycleCompleted(report) => info!(
                cycle = report.cycle,
                checked = report.checked,
                modified = report.modified.len(),
                failures = report.failures,
                "alert check completed"
            ),
        }
    }
}
