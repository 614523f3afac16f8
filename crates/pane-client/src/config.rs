//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use pane_core::DEFAULT_PORT;

/// Endpoint seeded into an empty recent apps list.
pub const DEFAULT_ENDPOINT: &str = "hg2z.duckdns.org";

/// Tunables for a [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Identity that scopes the recent apps list and the keyspace.
    pub user: String,
    /// Root directory of the device filesystem.
    pub storage_root: PathBuf,
    /// Port used for endpoints without `:port`.
    pub default_port: u16,
    /// Endpoint offered when the user has no recent apps yet.
    pub default_endpoint: String,
    /// Bound on a single connect attempt.
    pub connect_timeout: Duration,
    /// How long to wait for the rest of a partially received frame before yielding.
    pub frame_timeout: Duration,
    /// How long to wait for new data at a frame boundary before yielding.
    pub poll_interval: Duration,
    /// How long full-screen notices ("Connected!", "Offline!", errors) stay up.
    pub notice_duration: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user: "guest".to_string(),
            storage_root: PathBuf::from("pane-data"),
            default_port: DEFAULT_PORT,
            default_endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(10),
            frame_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
            notice_duration: Duration::from_secs(1),
        }
    }
}
