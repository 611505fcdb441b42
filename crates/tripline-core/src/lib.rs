//! File integrity monitoring core.
//!
//! A baseline records one digest per monitored file under a single
//! algorithm. The operating modes create it, check the filesystem against it,
//! merge new files into it, or keep reconciling it on an interval.
//!
//! ```text
//!  Session (create | check | update | alert)
//!    ├── Scanner ──────── directory walk + name exclusions
//!    ├── DigestEngine ─── streaming digests
//!    ├── BaselineStore ── JSON load / atomic save
//!    ├── reconcile ────── drift events
//!    └── Monitor ──────── periodic reconcile + alert record
//! ```

pub mod alert_log;
pub mod algorithm;
pub mod baseline;
pub mod digest;
pub mod error;
pub mod monitor;
pub mod paths;
pub mod reconcile;
pub mod report;
pub mod scanner;
pub mod session;
pub mod settings;

pub use alert_log::AlertLog;
pub use algorithm::Algorithm;
pub use baseline::{Baseline, BaselineStore, MergeSummary};
pub use digest::{Digest, DigestEngine};
pub use error::{Result, TriplineError};
pub use monitor::{CycleReport, Monitor, MonitorState};
pub use reconcile::{reconcile, DriftCause, DriftEvent, Reconciliation};
pub use report::{Notice, NullReporter, Reporter, TracingReporter};
pub use scanner::{validate_files, ScanRules, Scanner};
pub use session::{Mode, Outcome, Session, Targets};
pub use settings::Settings;
