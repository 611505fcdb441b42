//! Drift detection against a recorded baseline.

use std::path::Path;

use crate::baseline::Baseline;
use crate::digest::{Digest, DigestEngine};
use crate::error::TriplineError;
use crate::report::{Notice, Reporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftCause {
    Modified,
    Unreadable,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftEvent {
    pub path: String,
    pub old_digest: Digest,
    pub new_digest: Option<Digest>,
    pub cause: DriftCause,
    /// Error text for `Unreadable` events.
    pub detail: Option<String>,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// The input baseline with every `Modified` entry refreshed. Missing and
    /// unreadable entries keep their recorded digest.
    pub baseline: Baseline,
    pub events: Vec<DriftEvent>,
}

impl Reconciliation {
    pub fn is_clean(&self) -> bool {
        self.events.is_empty()
    }

    pub fn with_cause(&self, cause: DriftCause) -> impl Iterator<Item = &DriftEvent> {
        self.events.iter().filter(move |e| e.cause == cause)
    }

    pub fn modified(&self) -> impl Iterator<Item = &DriftEvent> {
        self.with_cause(DriftCause::Modified)
    }

    pub fn count(&self, cause: DriftCause) -> usize {
        self.with_cause(cause).count()
    }
}

/// Recompute every recorded digest and compare. Never persists; one failing
/// file never stops the rest from being checked.
pub fn reconcile(baseline: &Baseline, reporter: &dyn Reporter) -> Reconciliation {
    let engine = DigestEngine::new(baseline.algorithm());
    let mut updated = baseline.clone();
    let mut events = Vec::new();

    for (path, old_digest) in baseline.entries() {
        let event = match engine.compute(Path::new(path)) {
            Ok(new_digest) if &new_digest == old_digest => continue,
            Ok(new_digest) => {
                updated.record(path, new_digest.clone());
                DriftEvent {
                    path: path.clone(),
                    old_digest: old_digest.clone(),
                    new_digest: Some(new_digest),
                    cause: DriftCause::Modified,
                    detail: None,
                }
            }
            Err(TriplineError::FileNotFound { .. }) => DriftEvent {
                path: path.clone(),
                old_digest: old_digest.clone(),
                new_digest: None,
                cause: DriftCause::Missing,
                detail: None,
            },
            Err(error) => DriftEvent {
                path: path.clone(),
                old_digest: old_digest.clone(),
                new_digest: None,
                cause: DriftCause::Unreadable,
                detail: Some(error.to_string()),
            },
        };
        reporter.notify(Notice::Drift(&event));
        events.push(event);
    }

    Reconciliation {
        baseline: updated,
        events,
    }
}
