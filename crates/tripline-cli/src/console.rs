//! Console rendering. Status lines go to stdout; everything is also logged.

use tripline_core::{
    CycleReport, DriftCause, Notice, Outcome, Reconciliation, Reporter, TracingReporter,
    TriplineError,
};

#[derive(Default)]
pub struct ConsoleReporter {
    log: TracingReporter,
}

impl Reporter for ConsoleReporter {
    fn notify(&self, notice: Notice<'_>) {
        match &notice {
            Notice::Monitoring { path } => println!("Monitoring: {}", path.display()),
            Notice::Skipped { error } => println!("{}", skipped_line(error)),
            Notice::RootEmpty { path } => println!(
                "Warning: scanning directory '{}' - potentially empty.",
                path.display()
            ),
            Notice::HashFailed { error } => println!("Error hashing file: {error}"),
            Notice::Drift(event) => match event.cause {
                DriftCause::Modified => println!("File {} has been modified.", event.path),
                DriftCause::Missing => println!("File {} is missing.", event.path),
                DriftCause::Unreadable => println!(
                    "Error hashing file {}: {}",
                    event.path,
                    event.detail.as_deref().unwrap_or("unreadable")
                ),
            },
            Notice::AlertNotRecorded { error } => println!("Alert not recorded: {error}"),
            Notice::BaselineSaved { .. } | Notice::CycleCompleted(_) => {}
        }
        self.log.notify(notice);
    }
}

fn skipped_line(error: &TriplineError) -> String {
    match error {
        TriplineError::InvalidRoot { path } if path.exists() => {
            format!("{} is not a directory.", path.display())
        }
        TriplineError::InvalidRoot { path } => {
            format!("Directory {} does not exist.", path.display())
        }
        TriplineError::FileNotFound { path } => format!("File {} does not exist.", path.display()),
        other => format!("Skipped: {other}"),
    }
}

pub fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Created { baseline, failures } => {
            println!(
                "Baseline created: {} files hashed with {}.",
                baseline.len(),
                baseline.algorithm()
            );
            print_failures(failures);
        }
        Outcome::Checked(result) => print_check(result),
        Outcome::Updated {
            summary,
            entries,
            failures,
        } => {
            println!(
                "Baseline updated: {} added, {} replaced, {} total.",
                summary.added, summary.replaced, entries
            );
            print_failures(failures);
        }
        Outcome::Stopped { cycles } => println!("Monitoring stopped after {cycles} cycles."),
    }
}

fn print_check(result: &Reconciliation) {
    if result.is_clean() {
        println!("All {} files match the baseline.", result.baseline.len());
        return;
    }
    println!(
        "{} checked: {} modified, {} missing, {} unreadable.",
        result.baseline.len(),
        result.count(DriftCause::Modified),
        result.count(DriftCause::Missing),
        result.count(DriftCause::Unreadable)
    );
}

fn print_failures(failures: &[TriplineError]) {
    if !failures.is_empty() {
        println!("{} files could not be hashed.", failures.len());
    }
}

pub fn print_cycle(report: &CycleReport) {
    println!(
        "Check {} completed at {}: {} files, {} modified.",
        report.cycle,
        report.completed_at.format("%Y-%m-%d %H:%M:%S"),
        report.checked,
        report.modified.len()
    );
}
