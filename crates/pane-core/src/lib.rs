//! pane-core: Shared protocol library for the pane thin client.
//!
//! Provides the opcode table, typed server commands and client messages,
//! the newline-delimited frame codec, endpoint parsing, keyspace path
//! derivation, and abstract transport traits.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod keyspace;
pub mod messages;
pub mod transport;

// Re-export commonly used items at crate root.
pub use codec::{encode_message, lenient_int, FrameDecoder};
pub use endpoint::Endpoint;
pub use error::{PaneError, PaneResult};
pub use keyspace::KeyspacePath;
pub use messages::{ClientMessage, Opcode, ServerCommand, ABSENT_VALUE, DEFAULT_PORT};
