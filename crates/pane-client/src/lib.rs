//! pane-client: the device-side session engine for the pane thin client.
//!
//! A remote application server draws the UI by streaming line-oriented
//! commands; this crate selects the server, keeps the connection alive,
//! executes render/storage/prompt commands, and forwards local gestures.
//!
//! # Quick Start
//!
//! ```no_run
//! use pane_client::{EngineConfig, Peripherals, SessionManager, TcpConnector};
//!
//! # async fn example(peripherals: Peripherals) -> pane_core::PaneResult<()> {
//! let mut manager = SessionManager::new(EngineConfig::default(), TcpConnector, peripherals);
//! loop {
//!     manager.tick().await?;
//! }
//! # }
//! ```

pub mod config;
pub mod device;
pub mod dispatcher;
pub mod input;
pub mod recent_apps;
pub mod session;
pub mod storage;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod transport;

// Re-export primary public types.
pub use config::EngineConfig;
pub use device::{Display, Gesture, GestureSource, LinkStatus, Peripherals, Prompter};
pub use dispatcher::{DispatchContext, ProtocolDispatcher};
pub use input::{InputOutcome, InputTranslator};
pub use recent_apps::{RecentAppsRegistry, NEW_ENDPOINT_MARKER};
pub use session::{connect_bounded, SessionManager, SessionState, TickOutcome};
pub use storage::StorageKeyspace;
pub use transport::{StreamTransport, TcpConnector};

// Re-export pane-core error types for convenience.
pub use pane_core::{PaneError, PaneResult};
