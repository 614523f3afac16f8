//! Abstract transport traits for pane.
//!
//! The engine only needs a reliable, ordered byte stream to one peer.
//! Production uses TCP; tests use in-memory duplex pipes.

use crate::endpoint::Endpoint;
use crate::error::PaneResult;

/// A connected byte stream to the remote application server.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Read up to `buf.len()` bytes. Returns number of bytes read, 0 = EOF.
    async fn recv(&mut self, buf: &mut [u8]) -> PaneResult<usize>;

    /// Write all bytes.
    async fn send(&mut self, data: &[u8]) -> PaneResult<()>;

    /// Close the stream. Closing twice is a no-op.
    async fn close(&mut self) -> PaneResult<()>;

    /// Whether the stream is still open in both directions.
    fn is_connected(&self) -> bool;
}

/// Opens transports to endpoints (client side only).
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Transport: Transport;

    /// Open a stream to `endpoint`. Callers bound the attempt with a timeout.
    async fn connect(&self, endpoint: &Endpoint) -> PaneResult<Self::Transport>;
}
