use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::algorithm::Algorithm;
use crate::error::{Result, TriplineError};
use crate::paths;

pub const DEFAULT_BASELINE_FILE: &str = "data.json";
pub const DEFAULT_ALERT_FILE: &str = "alerts.txt";
pub const DEFAULT_INTERVAL_SECS: u64 = 500;

/// Defaults for every run, optionally read from a JSON settings file and
/// then overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub baseline_file: PathBuf,
    pub alert_file: PathBuf,
    pub interval_secs: u64,
    pub ignore_files: Vec<String>,
    pub ignore_dirs: Vec<String>,
    pub algorithm: Option<Algorithm>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            baseline_file: PathBuf::from(DEFAULT_BASELINE_FILE),
            alert_file: PathBuf::from(DEFAULT_ALERT_FILE),
            interval_secs: DEFAULT_INTERVAL_SECS,
            ignore_files: vec![],
            ignore_dirs: vec![],
            algorithm: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            TriplineError::Validation(format!("cannot read settings {}: {e}", path.display()))
        })?;
        let settings = serde_json::from_str(&json).map_err(|e| {
            TriplineError::Validation(format!("invalid settings {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Resolve settings from, in order: an explicit path, the
    /// `TRIPLINE_CONFIG` environment variable, the platform config directory.
    /// Only the last one may be absent.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = paths::env_settings_path() {
            return Self::load(&path);
        }
        match paths::default_settings_path() {
            Ok(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}
