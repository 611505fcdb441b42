use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, TriplineError};

/// Append-only plain-text record of detected modifications.
#[derive(Debug, Clone)]
pub struct AlertLog {
    path: PathBuf,
}

impl AlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_modified(&self, monitored: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| TriplineError::write(&self.path, e))?;
        writeln!(file, "File {monitored} has been modified.")
            .and_then(|_| file.flush())
            .map_err(|e| TriplineError::write(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn appends_one_line_per_alert() {
        let dir = tempdir().unwrap();
        let log = AlertLog::new(dir.path().join("alerts.txt"));
        log.record_modified("/etc/passwd").unwrap();
        log.record_modified("a.txt").unwrap();

        assert_eq!(
            fs::read_to_string(log.path()).unwrap(),
            "File /etc/passwd has been modified.\nFile a.txt has been modified.\n"
        );
    }
}
