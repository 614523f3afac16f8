//! Keyspace path derivation.
//!
//! Every persisted record lives at a path built from independently encoded
//! segments, relative to the storage root:
//!
//! ```text
//! <enc(user)>/browser/storage/<enc(app)>/<enc(key)>.data   per-app record
//! <enc(user)>/browser/storage/apps.data                    recent apps
//! ```
//!
//! Segments are lowercase hex of the raw bytes, so they survive
//! case-insensitive filesystems. Components longer than
//! [`MAX_DIRECT_BYTES`] are replaced by `_` followed by the hex SHA-256 of
//! the raw bytes, which keeps every name well under 255 bytes. The empty
//! string encodes as `=`. Neither `_` nor `=` is a hex digit, so the three
//! forms never collide, and no form contains `.`, so the recent-apps file
//! cannot alias an app directory.

use std::fmt;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Fixed directories between the user segment and the app segment.
pub const STORAGE_DIRS: [&str; 2] = ["browser", "storage"];

/// Extension appended to every record file name.
pub const RECORD_EXTENSION: &str = "data";

/// File name of the per-user recent apps list.
pub const RECENT_APPS_FILE: &str = "apps.data";

/// Longest component, in bytes, that is hex-encoded directly.
pub const MAX_DIRECT_BYTES: usize = 120;

const EMPTY_SEGMENT: &str = "=";
const DIGEST_PREFIX: char = '_';

/// Encode one raw component into a safe path segment.
pub fn encode_segment(raw: &str) -> String {
    let bytes = raw.as_bytes();
    if bytes.is_empty() {
        return EMPTY_SEGMENT.to_string();
    }
    if bytes.len() <= MAX_DIRECT_BYTES {
        return hex::encode(bytes);
    }
    format!("{DIGEST_PREFIX}{}", hex::encode(Sha256::digest(bytes)))
}

/// A derived keyspace location: directory segments plus a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyspacePath {
    dirs: Vec<String>,
    file: String,
}

impl KeyspacePath {
    /// Path of the record for `(user, app, key)`.
    pub fn record(user: &str, app: &str, key: &str) -> Self {
        let mut dirs = Self::storage_dirs(user);
        dirs.push(encode_segment(app));
        Self {
            dirs,
            file: format!("{}.{RECORD_EXTENSION}", encode_segment(key)),
        }
    }

    /// Path of the recent apps list for `user`.
    pub fn recent_apps(user: &str) -> Self {
        Self {
            dirs: Self::storage_dirs(user),
            file: RECENT_APPS_FILE.to_string(),
        }
    }

    fn storage_dirs(user: &str) -> Vec<String> {
        let mut dirs = vec![encode_segment(user)];
        dirs.extend(STORAGE_DIRS.iter().map(|d| d.to_string()));
        dirs
    }

    /// Directory segments, outermost first.
    pub fn dirs(&self) -> &[String] {
        &self.dirs
    }

    pub fn file_name(&self) -> &str {
        &self.file
    }

    /// Every directory that must exist for this path, outermost first.
    pub fn ancestors_under(&self, root: &Path) -> Vec<PathBuf> {
        let mut current = root.to_path_buf();
        self.dirs
            .iter()
            .map(|segment| {
                current.push(segment);
                current.clone()
            })
            .collect()
    }

    /// Full file path under `root`.
    pub fn under(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.dirs);
        path.push(&self.file);
        path
    }
}

impl fmt::Display for KeyspacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for dir in &self.dirs {
            write!(f, "/{dir}")?;
        }
        write!(f, "/{}", self.file)
    }
}
