//! Per-(user, app, key) local persistence.
//!
//! Records are plain files under the storage root at the location derived
//! by [`KeyspacePath`]. Files are opened, used, and closed per operation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use pane_core::error::{PaneError, PaneResult};
use pane_core::{KeyspacePath, ABSENT_VALUE};

/// File-backed keyspace rooted at a directory.
#[derive(Debug, Clone)]
pub struct StorageKeyspace {
    root: PathBuf,
}

impl StorageKeyspace {
    /// Create a keyspace rooted at `root`. Nothing is touched until first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the record for `(user, app, key)`.
    ///
    /// A record that was never set reads back as `"-1"`. Stored payloads
    /// are returned verbatim, including trailing whitespace.
    pub fn get(&self, user: &str, app: &str, key: &str) -> PaneResult<String> {
        let path = KeyspacePath::record(user, app, key);
        Ok(self
            .read(&path)?
            .unwrap_or_else(|| ABSENT_VALUE.to_string()))
    }

    /// Overwrite the record for `(user, app, key)` with `value`.
    pub fn set(&self, user: &str, app: &str, key: &str, value: &str) -> PaneResult<()> {
        let path = KeyspacePath::record(user, app, key);
        self.write(&path, value)
    }

    /// Create every missing directory of `path`, outermost first.
    ///
    /// Existing directories are left alone, so calling this repeatedly is harmless.
    pub fn ensure_dirs(&self, path: &KeyspacePath) -> PaneResult<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|e| {
                PaneError::Storage(format!("failed to create {}: {e}", self.root.display()))
            })?;
        }

        for dir in path.ancestors_under(&self.root) {
            if dir.is_dir() {
                continue;
            }
            match fs::create_dir(&dir) {
                Ok(()) => debug!(dir = %dir.display(), "created directory"),
                Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => {}
                Err(e) => {
                    warn!("failed to create directory {}: {}", dir.display(), e);
                    return Err(PaneError::Storage(format!(
                        "failed to create directory {}: {e}",
                        dir.display()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Read a whole file, or `None` if it does not exist.
    pub(crate) fn read(&self, path: &KeyspacePath) -> PaneResult<Option<String>> {
        let file = path.under(&self.root);
        match fs::read(&file) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PaneError::Storage(format!(
                "failed to read {}: {e}",
                file.display()
            ))),
        }
    }

    /// Replace a file's contents, creating its directories first.
    pub(crate) fn write(&self, path: &KeyspacePath, contents: &str) -> PaneResult<()> {
        self.ensure_dirs(path)?;
        let file = path.under(&self.root);
        fs::write(&file, contents).map_err(|e| {
            PaneError::Storage(format!("failed to write {}: {e}", file.display()))
        })?;
        debug!(path = %path, bytes = contents.len(), "stored record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keyspace() -> (TempDir, StorageKeyspace) {
        let dir = TempDir::new().unwrap();
        let storage = StorageKeyspace::new(dir.path().join("fs"));
        (dir, storage)
    }

    #[test]
    fn unset_key_reads_sentinel() {
        let (_dir, storage) = keyspace();
        assert_eq!(storage.get("alice", "app", "missing").unwrap(), "-1");
    }

    #[test]
    fn set_then_get() {
        let (_dir, storage) = keyspace();
        for (key, value) in [("score", "42"), ("", ""), ("a/b", "multi\nline\n"), ("k", "  padded  ")] {
            storage.set("alice", "app:9000", key, value).unwrap();
            assert_eq!(storage.get("alice", "app:9000", key).unwrap(), value);
        }
    }

    #[test]
    fn long_identities_round_trip() {
        let (_dir, storage) = keyspace();
        let user = "u".repeat(200);
        let app = "a".repeat(200);
        let key = "k".repeat(200);

        storage.set(&user, &app, &key, "v").unwrap();
        assert_eq!(storage.get(&user, &app, &key).unwrap(), "v");
        assert_eq!(storage.get(&user, &app, &"k".repeat(201)).unwrap(), "-1");
    }

    #[test]
    fn keys_differing_only_in_case_stay_apart() {
        let (_dir, storage) = keyspace();
        storage.set("alice", "app", "aaa", "lower").unwrap();
        storage.set("alice", "app", "aaG", "upper").unwrap();
        assert_eq!(storage.get("alice", "app", "aaa").unwrap(), "lower");
        assert_eq!(storage.get("alice", "app", "aaG").unwrap(), "upper");
    }

    #[test]
    fn empty_value_is_not_absent() {
        let (_dir, storage) = keyspace();
        storage.set("alice", "app", "k", "").unwrap();
        assert_eq!(storage.get("alice", "app", "k").unwrap(), "");
    }

    #[test]
    fn set_overwrites() {
        let (_dir, storage) = keyspace();
        storage.set("alice", "app", "k", "a much longer first value").unwrap();
        storage.set("alice", "app", "k", "short").unwrap();
        assert_eq!(storage.get("alice", "app", "k").unwrap(), "short");
    }

    #[test]
    fn keys_are_scoped_by_user_and_app() {
        let (_dir, storage) = keyspace();
        storage.set("alice", "app1", "k", "a1").unwrap();
        storage.set("alice", "app2", "k", "a2").unwrap();
        storage.set("bob", "app1", "k", "b1").unwrap();
        assert_eq!(storage.get("alice", "app1", "k").unwrap(), "a1");
        assert_eq!(storage.get("alice", "app2", "k").unwrap(), "a2");
        assert_eq!(storage.get("bob", "app1", "k").unwrap(), "b1");
        assert_eq!(storage.get("bob", "app2", "k").unwrap(), "-1");
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let (_dir, storage) = keyspace();
        let path = KeyspacePath::record("alice", "app", "k");
        storage.ensure_dirs(&path).unwrap();
        storage.ensure_dirs(&path).unwrap();

        let app_dir = path.ancestors_under(storage.root()).pop().unwrap();
        assert!(app_dir.is_dir());
        assert_eq!(fs::read_dir(&app_dir).unwrap().count(), 0);

        let user_dir = &path.ancestors_under(storage.root())[0];
        assert_eq!(fs::read_dir(user_dir).unwrap().count(), 1);
    }

    #[test]
    fn blocked_directory_is_reported() {
        let (_dir, storage) = keyspace();
        let path = KeyspacePath::record("alice", "app", "k");
        // A plain file where the user directory should go.
        fs::create_dir_all(storage.root()).unwrap();
        fs::write(&path.ancestors_under(storage.root())[0], "not a dir").unwrap();

        let err = storage.set("alice", "app", "k", "v").unwrap_err();
        assert!(matches!(err, PaneError::Storage(_)));
    }
}
