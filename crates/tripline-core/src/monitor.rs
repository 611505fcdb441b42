//! Periodic reconciliation loop behind the `alert` mode.
//!
//! Each cycle loads the baseline, reconciles it, appends one alert line per
//! modified file, and saves the refreshed baseline. The loop sleeps between
//! cycles and only stops when the caller asks it to or a cycle fails with a
//! baseline-level error.

use chrono::{DateTime, Utc};
use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;
use tracing::info;

use crate::alert_log::AlertLog;
use crate::baseline::BaselineStore;
use crate::error::Result;
use crate::reconcile::{reconcile, DriftCause, DriftEvent};
use crate::report::{Notice, Reporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Cycling,
}

/// Summary handed back after every completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub checked: usize,
    pub modified: Vec<DriftEvent>,
    /// Missing plus unreadable entries.
    pub failures: usize,
    pub completed_at: DateTime<Utc>,
}

pub struct Monitor<'r> {
    store: BaselineStore,
    alerts: AlertLog,
    interval: Duration,
    reporter: &'r dyn Reporter,
    state: MonitorState,
    cycles: u64,
}

impl<'r> Monitor<'r> {
    pub fn new(
        store: BaselineStore,
        alerts: AlertLog,
        interval: Duration,
        reporter: &'r dyn Reporter,
    ) -> Self {
        Self {
            store,
            alerts,
            interval,
            reporter,
            state: MonitorState::Idle,
            cycles: 0,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run a single pass. Errors here are baseline-level and fatal to the loop.
    pub fn cycle(&mut self) -> Result<CycleReport> {
        self.state = MonitorState::Cycling;
        let result = self.run_cycle();
        self.state = MonitorState::Idle;
        result
    }

    fn run_cycle(&mut self) -> Result<CycleReport> {
        let baseline = self.store.load()?;
        let checked = baseline.len();
        let outcome = reconcile(&baseline, self.reporter);

        let modified: Vec<DriftEvent> = outcome.modified().cloned().collect();
        for event in &modified {
            if let Err(error) = self.alerts.record_modified(&event.path) {
                self.reporter.notify(Notice::AlertNotRecorded { error: &error });
            }
        }

        self.store.save(&outcome.baseline)?;
        self.reporter.notify(Notice::BaselineSaved {
            path: self.store.path(),
            entries: outcome.baseline.len(),
        });

        self.cycles += 1;
        let report = CycleReport {
            cycle: self.cycles,
            checked,
            failures: outcome.count(DriftCause::Missing) + outcome.count(DriftCause::Unreadable),
            modified,
            completed_at: Utc::now(),
        };
        self.reporter.notify(Notice::CycleCompleted(&report));
        Ok(report)
    }

    /// Cycle, hand the report to `on_cycle`, sleep, repeat. Returns the number
    /// of completed cycles once `on_cycle` breaks.
    pub fn run<F>(&mut self, mut on_cycle: F) -> Result<u64>
    where
        F: FnMut(&CycleReport) -> ControlFlow<()>,
    {
        info!(
            interval_secs = self.interval.as_secs(),
            baseline = %self.store.path().display(),
            "monitor loop started"
        );
        loop {
            let report = self.cycle()?;
            if on_cycle(&report).is_break() {
                info!(cycles = self.cycles, "monitor loop stopped");
                return Ok(self.cycles);
            }
            thread::sleep(self.interval);
        }
    }
}
