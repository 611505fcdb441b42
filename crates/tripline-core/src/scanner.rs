//! Monitored-set discovery.
//!
//! Roots are walked depth-first with entries sorted by name, so the same tree
//! always yields the same sequence. Excluded directory names are pruned before
//! descent; excluded file names are dropped wherever they appear.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::TriplineError;
use crate::report::{Notice, Reporter};

/// Name-based exclusions applied while walking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRules {
    pub ignore_files: BTreeSet<String>,
    pub ignore_dirs: BTreeSet<String>,
}

impl ScanRules {
    pub fn new<F, D>(ignore_files: F, ignore_dirs: D) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            ignore_files: ignore_files.into_iter().map(Into::into).collect(),
            ignore_dirs: ignore_dirs.into_iter().map(Into::into).collect(),
        }
    }

    fn prunes(&self, entry: &DirEntry) -> bool {
        // depth 0 is the root itself; it is never pruned by name
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self.ignore_dirs.contains(entry.file_name().to_string_lossy().as_ref())
    }

    fn ignores_file(&self, entry: &DirEntry) -> bool {
        self.ignore_files
            .contains(entry.file_name().to_string_lossy().as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct Scanner {
    rules: ScanRules,
}

impl Scanner {
    pub fn new(rules: ScanRules) -> Self {
        Self { rules }
    }

    /// Walk every root and return the files to monitor. Roots that are not
    /// directories are reported and skipped.
    pub fn scan(&self, roots: &[PathBuf], reporter: &dyn Reporter) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for root in roots {
            if !root.is_dir() {
                let error = TriplineError::InvalidRoot { path: root.clone() };
                reporter.notify(Notice::Skipped { error: &error });
                continue;
            }
            reporter.notify(Notice::Monitoring { path: root });

            let found = self.walk(root, reporter);
            if found.is_empty() {
                reporter.notify(Notice::RootEmpty { path: root });
            }
            files.extend(found);
        }
        files
    }

    fn walk(&self, root: &Path, reporter: &dyn Reporter) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.rules.prunes(entry));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    let error = TriplineError::Read {
                        path,
                        source: io::Error::from(e),
                    };
                    reporter.notify(Notice::Skipped { error: &error });
                    continue;
                }
            };
            if !is_monitorable(&entry) || self.rules.ignores_file(&entry) {
                continue;
            }
            files.push(entry.into_path());
        }

        debug!(root = %root.display(), files = files.len(), "directory scanned");
        files
    }
}

/// Regular files, plus symlinks that resolve to one. Linked directories are
/// never descended.
fn is_monitorable(entry: &DirEntry) -> bool {
    let kind = entry.file_type();
    kind.is_file() || (kind.is_symlink() && entry.path().is_file())
}

/// Keep the explicit files that exist, reporting the rest.
pub fn validate_files(files: &[PathBuf], reporter: &dyn Reporter) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|path| {
            if path.is_file() {
                reporter.notify(Notice::Monitoring {
                    path: path.as_path(),
                });
                true
            } else {
                let error = TriplineError::FileNotFound {
                    path: path.to_path_buf(),
                };
                reporter.notify(Notice::Skipped { error: &error });
                false
            }
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullReporter;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn walks_recursively_in_name_order() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b.txt"));
        touch(&dir.path().join("a.txt"));
        touch(&dir.path().join("sub/c.txt"));

        let scanner = Scanner::new(ScanRules::default());
        let files = scanner.scan(&[dir.path().to_path_buf()], &NullReporter);
        assert_eq!(names(dir.path(), &files), vec!["a.txt", "b.txt", "sub/c.txt"]);
    }

    #[test]
    fn ignored_dirs_are_pruned_at_any_depth() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("keep.txt"));
        touch(&dir.path().join("cache/deep/inner.txt"));
        touch(&dir.path().join("src/cache/nested.txt"));
        touch(&dir.path().join("src/cache.txt"));

        let scanner = Scanner::new(ScanRules::new(Vec::<String>::new(), ["cache"]));
        let files = scanner.scan(&[dir.path().to_path_buf()], &NullReporter);
        assert_eq!(names(dir.path(), &files), vec!["keep.txt", "src/cache.txt"]);
    }

    #[test]
    fn ignored_file_names_are_dropped_everywhere() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("app.log"));
        touch(&dir.path().join("nested/app.log"));
        touch(&dir.path().join("nested/app.conf"));

        let scanner = Scanner::new(ScanRules::new(["app.log"], Vec::<String>::new()));
        let files = scanner.scan(&[dir.path().to_path_buf()], &NullReporter);
        assert_eq!(names(dir.path(), &files), vec!["nested/app.conf"]);
    }

    #[test]
    fn invalid_roots_are_skipped() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("real/file.txt"));
        let not_a_dir = dir.path().join("real/file.txt");
        let missing = dir.path().join("missing");

        let scanner = Scanner::new(ScanRules::default());
        let files = scanner.scan(
            &[missing, not_a_dir, dir.path().join("real")],
            &NullReporter,
        );
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn validate_files_filters_missing() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present.txt");
        touch(&present);

        let files = validate_files(
            &[dir.path().join("gone.txt"), present.clone(), dir.path().to_path_buf()],
            &NullReporter,
        );
        assert_eq!(files, vec![present]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_monitored_but_linked_dirs_are_not_descended() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let root = dir.path().join("etc");
        let outside = dir.path().join("outside");
        touch(&root.join("hosts"));
        touch(&outside.join("resolv.conf"));
        touch(&outside.join("linked/inner.txt"));
        symlink(outside.join("resolv.conf"), root.join("resolv.conf")).unwrap();
        symlink(outside.join("linked"), root.join("linked")).unwrap();
        symlink(outside.join("gone"), root.join("dangling")).unwrap();

        let scanner = Scanner::new(ScanRules::default());
        let files = scanner.scan(&[root.clone()], &NullReporter);
        assert_eq!(names(&root, &files), vec!["hosts", "resolv.conf"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_reported_and_skipped() {
        use parking_lot::Mutex;
        use std::os::unix::fs::PermissionsExt;

        #[derive(Default)]
        struct Skips(Mutex<Vec<String>>);

        impl Reporter for Skips {
            fn notify(&self, notice: Notice<'_>) {
                if let Notice::Skipped { error } = notice {
                    self.0.lock().push(error.to_string());
                }
            }
        }

        let dir = tempdir().unwrap();
        touch(&dir.path().join("open.txt"));
        let locked = dir.path().join("locked");
        touch(&locked.join("secret.txt"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // running with privileges that ignore directory modes
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let skips = Skips::default();
        let files = Scanner::new(ScanRules::default()).scan(&[dir.path().to_path_buf()], &skips);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(names(dir.path(), &files), vec!["open.txt"]);
        let skips = skips.0.lock();
        assert_eq!(skips.len(), 1);
        assert!(skips[0].contains("locked"), "{skips:?}");
    }
}
