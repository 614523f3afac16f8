//! Recently used application endpoints, persisted per user.
//!
//! Stored at `<enc(user)>/browser/storage/apps.data` under the storage root.
//! Format: one endpoint per line, most recently added first. Duplicates are
//! kept. The synthetic "input new" entry is only ever added at read time.

use tracing::{debug, info};

use pane_core::error::PaneResult;
use pane_core::KeyspacePath;

use crate::storage::StorageKeyspace;

/// Synthetic first entry that starts the add-endpoint flow.
pub const NEW_ENDPOINT_MARKER: &str = "input new";

/// Recent apps list manager.
#[derive(Debug, Clone)]
pub struct RecentAppsRegistry {
    storage: StorageKeyspace,
    default_endpoint: String,
}

impl RecentAppsRegistry {
    /// Create a registry that persists through `storage` and seeds `default_endpoint`.
    pub fn new(storage: StorageKeyspace, default_endpoint: impl Into<String>) -> Self {
        Self {
            storage,
            default_endpoint: default_endpoint.into(),
        }
    }

    pub fn default_endpoint(&self) -> &str {
        &self.default_endpoint
    }

    /// The selectable list for `user`: the marker, then stored endpoints.
    ///
    /// Without a stored list the default endpoint is offered, but not written.
    pub fn list(&self, user: &str) -> PaneResult<Vec<String>> {
        let mut apps = vec![NEW_ENDPOINT_MARKER.to_string()];

        match self.storage.read(&KeyspacePath::recent_apps(user))? {
            Some(content) => apps.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            ),
            None => apps.push(self.default_endpoint.clone()),
        }

        debug!(user, count = apps.len() - 1, "listed recent apps");
        Ok(apps)
    }

    /// Put `endpoint` at the front of the stored list for `user`.
    ///
    /// The first write also stores the default endpoint ahead of the new one,
    /// so the fallback survives; later writes leave it where it is.
    pub fn add(&self, user: &str, endpoint: &str) -> PaneResult<()> {
        let path = KeyspacePath::recent_apps(user);
        let existing = self.storage.read(&path)?.unwrap_or_default();

        let mut content = String::new();
        if existing.is_empty() {
            content.push_str(&self.default_endpoint);
            content.push('\n');
        }
        content.push_str(endpoint);
        content.push('\n');
        content.push_str(&existing);

        self.storage.write(&path, &content)?;
        info!(user, endpoint, "added recent app");
        Ok(())
    }
}
