//! Baseline model and JSON persistence.
//!
//! On disk a baseline is one JSON object with exactly one key, the algorithm
//! name, mapping each monitored path to its hex digest:
//!
//! ```json
//! { "SHA256": { "/etc/passwd": "ab12…" } }
//! ```

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::algorithm::Algorithm;
use crate::digest::Digest;
use crate::error::{Result, TriplineError};

/// Recorded digests for a set of paths, all under one algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    algorithm: Algorithm,
    entries: BTreeMap<String, Digest>,
}

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub replaced: usize,
}

impl Baseline {
    /// Build a fresh baseline. An empty entry set is rejected.
    pub fn create(algorithm: Algorithm, entries: BTreeMap<String, Digest>) -> Result<Self> {
        if entries.is_empty() {
            return Err(TriplineError::EmptyBaseline);
        }
        Ok(Self {
            algorithm,
            entries,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn entries(&self) -> &BTreeMap<String, Digest> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Digest> {
        self.entries.get(path)
    }

    /// Fold `new_entries`, hashed with `algorithm`, into this baseline. New
    /// digests win on collision. Mixing digest spaces is refused.
    pub fn merge(
        &mut self,
        algorithm: Algorithm,
        new_entries: BTreeMap<String, Digest>,
    ) -> Result<MergeSummary> {
        if algorithm != self.algorithm {
            return Err(TriplineError::AlgorithmMismatch {
                baseline: self.algorithm,
                requested: algorithm,
            });
        }
        let mut summary = MergeSummary::default();
        for (path, digest) in new_entries {
            match self.entries.insert(path, digest) {
                Some(_) => summary.replaced += 1,
                None => summary.added += 1,
            }
        }
        Ok(summary)
    }

    /// Overwrite the digest of a path already in the baseline.
    pub(crate) fn record(&mut self, path: &str, digest: Digest) {
        if let Some(slot) = self.entries.get_mut(path) {
            *slot = digest;
        }
    }

    fn to_json(&self) -> Value {
        let entries: Map<String, Value> = self
            .entries
            .iter()
            .map(|(path, digest)| (path.clone(), Value::String(digest.to_string())))
            .collect();
        let mut root = Map::new();
        root.insert(self.algorithm.as_str().to_string(), Value::Object(entries));
        Value::Object(root)
    }

    fn from_json(source: &Path, value: Value) -> Result<Self> {
        let Value::Object(root) = value else {
            return Err(TriplineError::corrupt(source, "top level is not an object"));
        };
        if root.len() != 1 {
            return Err(TriplineError::corrupt(
                source,
                format!("expected exactly one hash type, found {}", root.len()),
            ));
        }
        let Some((name, entries)) = root.into_iter().next() else {
            return Err(TriplineError::corrupt(source, "no hash type"));
        };
        let algorithm: Algorithm = name
            .parse()
            .map_err(|_| TriplineError::corrupt(source, format!("unknown hash type {name}")))?;
        let Value::Object(entries) = entries else {
            return Err(TriplineError::corrupt(
                source,
                format!("{name} does not map paths to digests"),
            ));
        };

        let mut parsed = BTreeMap::new();
        for (path, digest) in entries {
            let digest = digest
                .as_str()
                .and_then(|hex| Digest::parse(algorithm, hex))
                .ok_or_else(|| {
                    TriplineError::corrupt(source, format!("invalid {name} digest for {path}"))
                })?;
            parsed.insert(path, digest);
        }
        Ok(Self {
            algorithm,
            entries: parsed,
        })
    }
}

/// The file a baseline lives in.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Baseline> {
        let json = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                TriplineError::BaselineNotFound {
                    path: self.path.clone(),
                }
            } else {
                TriplineError::Read {
                    path: self.path.clone(),
                    source: e,
                }
            }
        })?;
        let value: Value = serde_json::from_str(&json)
            .map_err(|e| TriplineError::corrupt(&self.path, e.to_string()))?;
        let baseline = Baseline::from_json(&self.path, value)?;
        debug!(
            path = %self.path.display(),
            entries = baseline.len(),
            algorithm = %baseline.algorithm(),
            "baseline loaded"
        );
        Ok(baseline)
    }

    /// Write through a temporary file in the same directory and rename it
    /// over the target, so readers only ever see a complete baseline.
    pub fn save(&self, baseline: &Baseline) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut staging =
            NamedTempFile::new_in(&dir).map_err(|e| TriplineError::write(&self.path, e))?;
        let json = serde_json::to_vec_pretty(&baseline.to_json())
            .map_err(|e| TriplineError::write(&self.path, e.into()))?;
        staging
            .write_all(&json)
            .and_then(|_| staging.as_file().sync_all())
            .map_err(|e| TriplineError::write(&self.path, e))?;
        staging
            .persist(&self.path)
            .map_err(|e| TriplineError::write(&self.path, e.error))?;
        fsync_dir(&dir).map_err(|e| TriplineError::write(&self.path, e))?;
        debug!(path = %self.path.display(), entries = baseline.len(), "baseline saved");
        Ok(())
    }
}

fn fsync_dir(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        fs::File::open(path)?.sync_all()?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
