//! Error taxonomy shared by every tripline component.

use std::path::PathBuf;

use crate::algorithm::Algorithm;

pub type Result<T> = std::result::Result<T, TriplineError>;

#[derive(Debug, thiserror::Error)]
pub enum TriplineError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("unsupported hash type: {0}")]
    UnsupportedAlgorithm(String),

    #[error("{} is not a directory", path.display())]
    InvalidRoot { path: PathBuf },

    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("{} is not valid UTF-8 and cannot be recorded", path.display())]
    NonUtf8Path { path: PathBuf },

    #[error("error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("baseline file not found: {}", path.display())]
    BaselineNotFound { path: PathBuf },

    #[error("baseline {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to create a baseline with no entries")]
    EmptyBaseline,

    #[error("no files to monitor")]
    NoFilesToMonitor,

    #[error("baseline uses {baseline} but {requested} was requested")]
    AlgorithmMismatch {
        baseline: Algorithm,
        requested: Algorithm,
    },
}

impl TriplineError {
    /// Per-file failures are reported and skipped; everything else ends the
    /// current operation.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::InvalidRoot { .. }
                | Self::FileNotFound { .. }
                | Self::NonUtf8Path { .. }
                | Self::Read { .. }
        )
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
