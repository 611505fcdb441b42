//! Operating modes and the component sequence each one runs.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::alert_log::AlertLog;
use crate::algorithm::Algorithm;
use crate::baseline::{Baseline, BaselineStore, MergeSummary};
use crate::digest::DigestEngine;
use crate::error::{Result, TriplineError};
use crate::monitor::{CycleReport, Monitor};
use crate::reconcile::{reconcile, Reconciliation};
use crate::report::{Notice, Reporter};
use crate::scanner::{validate_files, ScanRules, Scanner};

/// What to monitor: directory trees or an explicit file list, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    Directories { roots: Vec<PathBuf>, rules: ScanRules },
    Files(Vec<PathBuf>),
}

impl Targets {
    /// Validates the directories-xor-files rule without touching the
    /// filesystem.
    pub fn resolve(
        directories: Vec<PathBuf>,
        files: Vec<PathBuf>,
        rules: ScanRules,
    ) -> Result<Self> {
        match (directories.is_empty(), files.is_empty()) {
            (false, false) => Err(TriplineError::Validation(
                "Both directories and files detected. Please specify only one.".into(),
            )),
            (true, true) => Err(TriplineError::Validation(
                "No directories or files detected. Please specify at least one.".into(),
            )),
            (false, true) => Ok(Self::Directories {
                roots: directories,
                rules,
            }),
            (true, false) => Ok(Self::Files(files)),
        }
    }

    /// Expand into the concrete file list.
    pub fn collect(&self, reporter: &dyn Reporter) -> Result<Vec<PathBuf>> {
        let files = match self {
            Self::Directories { roots, rules } => {
                Scanner::new(rules.clone()).scan(roots, reporter)
            }
            Self::Files(files) => validate_files(files, reporter),
        };
        if files.is_empty() {
            return Err(TriplineError::NoFilesToMonitor);
        }
        Ok(files)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Create {
        targets: Targets,
        algorithm: Algorithm,
    },
    Check,
    Update {
        targets: Targets,
        /// Must match the baseline's algorithm when given.
        algorithm: Option<Algorithm>,
    },
    Alert {
        interval: Duration,
    },
}

impl Mode {
    pub fn create(targets: Targets, algorithm: Option<&str>) -> Result<Self> {
        let name =
            algorithm.ok_or_else(|| TriplineError::Validation("No hash type specified.".into()))?;
        Ok(Self::Create {
            targets,
            algorithm: name.parse::<Algorithm>()?,
        })
    }

    pub fn update(targets: Targets, algorithm: Option<&str>) -> Result<Self> {
        Ok(Self::Update {
            targets,
            algorithm: algorithm.map(str::parse::<Algorithm>).transpose()?,
        })
    }

    pub fn alert(interval_secs: u64) -> Result<Self> {
        if interval_secs == 0 {
            return Err(TriplineError::Validation(
                "interval must be at least one second".into(),
            ));
        }
        Ok(Self::Alert {
            interval: Duration::from_secs(interval_secs),
        })
    }
}

#[derive(Debug)]
pub enum Outcome {
    Created {
        baseline: Baseline,
        failures: Vec<TriplineError>,
    },
    Checked(Reconciliation),
    Updated {
        summary: MergeSummary,
        entries: usize,
        failures: Vec<TriplineError>,
    },
    /// The monitor loop was stopped by its caller.
    Stopped { cycles: u64 },
}

/// Binds the persisted files and the reporter every mode works against.
pub struct Session<'r> {
    store: BaselineStore,
    alerts: AlertLog,
    reporter: &'r dyn Reporter,
}

impl<'r> Session<'r> {
    pub fn new(store: BaselineStore, alerts: AlertLog, reporter: &'r dyn Reporter) -> Self {
        Self {
            store,
            alerts,
            reporter,
        }
    }

    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Run a mode to completion. `Alert` only returns on a fatal error.
    pub fn execute(&self, mode: Mode) -> Result<Outcome> {
        match mode {
            Mode::Create { targets, algorithm } => self.create(&targets, algorithm),
            Mode::Check => self.check().map(Outcome::Checked),
            Mode::Update { targets, algorithm } => self.update(&targets, algorithm),
            Mode::Alert { interval } => self.alert(interval, |_| ControlFlow::Continue(())),
        }
    }

    pub fn create(&self, targets: &Targets, algorithm: Algorithm) -> Result<Outcome> {
        info!(%algorithm, "creating baseline");
        let engine = DigestEngine::new(algorithm);
        let files = targets.collect(self.reporter)?;
        let hashed = engine.compute_all(&files, self.reporter);
        let baseline = Baseline::create(algorithm, hashed.digests)?;
        self.persist(&baseline)?;
        Ok(Outcome::Created {
            baseline,
            failures: hashed.failures,
        })
    }

    /// Compare every entry against the filesystem. The baseline file is left
    /// untouched.
    pub fn check(&self) -> Result<Reconciliation> {
        let baseline = self.store.load()?;
        info!(entries = baseline.len(), algorithm = %baseline.algorithm(), "checking files");
        Ok(reconcile(&baseline, self.reporter))
    }

    pub fn update(&self, targets: &Targets, algorithm: Option<Algorithm>) -> Result<Outcome> {
        let mut baseline = self.store.load()?;
        let algorithm = match algorithm {
            Some(requested) if requested != baseline.algorithm() => {
                return Err(TriplineError::AlgorithmMismatch {
                    baseline: baseline.algorithm(),
                    requested,
                })
            }
            _ => baseline.algorithm(),
        };
        info!(%algorithm, entries = baseline.len(), "updating baseline");

        let files = targets.collect(self.reporter)?;
        let hashed = DigestEngine::new(algorithm).compute_all(&files, self.reporter);
        let summary = baseline.merge(algorithm, hashed.digests)?;
        self.persist(&baseline)?;
        Ok(Outcome::Updated {
            summary,
            entries: baseline.len(),
            failures: hashed.failures,
        })
    }

    /// Run the monitor loop until `on_cycle` breaks or a cycle fails.
    pub fn alert<F>(&self, interval: Duration, on_cycle: F) -> Result<Outcome>
    where
        F: FnMut(&CycleReport) -> ControlFlow<()>,
    {
        let mut monitor = Monitor::new(
            self.store.clone(),
            self.alerts.clone(),
            interval,
            self.reporter,
        );
        let cycles = monitor.run(on_cycle)?;
        Ok(Outcome::Stopped { cycles })
    }

    fn persist(&self, baseline: &Baseline) -> Result<()> {
        self.store.save(baseline)?;
        self.reporter.notify(Notice::BaselineSaved {
            path: self.store.path(),
            entries: baseline.len(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullReporter;
    use std::fs;
    use tempfile::tempdir;

    fn session(dir: &std::path::Path) -> Session<'static> {
        Session::new(
            BaselineStore::new(dir.join("data.json")),
            AlertLog::new(dir.join("alerts.txt")),
            &NullReporter,
        )
    }

    #[test]
    fn targets_must_be_exclusive() {
        let both = Targets::resolve(
            vec![PathBuf::from("/etc")],
            vec![PathBuf::from("/etc/passwd")],
            ScanRules::default(),
        );
        assert!(matches!(both, Err(TriplineError::Validation(_))));

        let neither = Targets::resolve(vec![], vec![], ScanRules::default());
        assert!(matches!(neither, Err(TriplineError::Validation(_))));
    }

    #[test]
    fn create_requires_a_supported_algorithm() {
        let targets = Targets::Files(vec![PathBuf::from("a.txt")]);
        assert!(matches!(
            Mode::create(targets.clone(), None),
            Err(TriplineError::Validation(_))
        ));
        assert!(matches!(
            Mode::create(targets, Some("rot13")),
            Err(TriplineError::UnsupportedAlgorithm(_))
        ));
        assert!(Mode::alert(0).is_err());
    }

    #[test]
    fn create_fails_when_nothing_exists() {
        let dir = tempdir().unwrap();
        let targets = Targets::Files(vec![dir.path().join("missing.txt")]);
        let err = session(dir.path())
            .create(&targets, Algorithm::Sha256)
            .unwrap_err();
        assert!(matches!(err, TriplineError::NoFilesToMonitor));
        assert!(!dir.path().join("data.json").exists());
    }

    #[test]
    fn update_rejects_algorithm_mismatch_before_hashing() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        let session = session(dir.path());
        session
            .create(&Targets::Files(vec![file.clone()]), Algorithm::Md5)
            .unwrap();
        let before = fs::read_to_string(dir.path().join("data.json")).unwrap();

        let err = session
            .update(&Targets::Files(vec![file]), Some(Algorithm::Sha256))
            .unwrap_err();
        assert!(matches!(err, TriplineError::AlgorithmMismatch { .. }));
        assert_eq!(fs::read_to_string(dir.path().join("data.json")).unwrap(), before);
    }

    #[test]
    fn update_without_baseline_is_fatal() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        let err = session(dir.path())
            .update(&Targets::Files(vec![file]), None)
            .unwrap_err();
        assert!(matches!(err, TriplineError::BaselineNotFound { .. }));
    }
}
