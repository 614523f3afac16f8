//! Stream transport for pane.
//!
//! [`StreamTransport`] adapts any tokio byte stream (a `TcpStream` in
//! production, a `DuplexStream` in tests) to the [`Transport`] trait and
//! tracks whether the peer is still there.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use pane_core::codec::encode_message;
use pane_core::error::{PaneError, PaneResult};
use pane_core::messages::ClientMessage;
use pane_core::transport::{Connector, Transport};
use pane_core::Endpoint;

/// A [`Transport`] over a tokio byte stream.
pub struct StreamTransport<S> {
    stream: S,
    peer: String,
    connected: bool,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: impl Into<String>) -> Self {
        Self {
            stream,
            peer: peer.into(),
            connected: true,
        }
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn recv(&mut self, buf: &mut [u8]) -> PaneResult<usize> {
        if !self.connected {
            return Ok(0);
        }

        match self.stream.read(buf).await {
            Ok(0) => {
                debug!(peer = %self.peer, "peer closed the stream");
                self.connected = false;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                self.connected = false;
                Err(PaneError::Transport(format!("read from {}: {e}", self.peer)))
            }
        }
    }

    async fn send(&mut self, data: &[u8]) -> PaneResult<()> {
        if !self.connected {
            return Err(PaneError::Transport(format!("{} is not connected", self.peer)));
        }

        let result = async {
            self.stream.write_all(data).await?;
            self.stream.flush().await
        }
        .await;

        result.map_err(|e| {
            self.connected = false;
            PaneError::Transport(format!("write to {}: {e}", self.peer))
        })
    }

    async fn close(&mut self) -> PaneResult<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        self.stream.shutdown().await?;
        debug!(peer = %self.peer, "stream closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Send `msg` if the stream is still open.
///
/// Returns whether the message was written. A message for a peer that has
/// gone away is dropped, never queued or retried.
pub async fn send_if_connected<T: Transport>(transport: &mut T, msg: &ClientMessage) -> bool {
    if !transport.is_connected() {
        debug!(?msg, "dropping message, peer gone");
        return false;
    }

    match transport.send(&encode_message(msg)).await {
        Ok(()) => {
            debug!(?msg, "sent");
            true
        }
        Err(e) => {
            warn!("failed to send {:?}: {}", msg, e);
            false
        }
    }
}

/// Opens plain TCP streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Transport = StreamTransport<TcpStream>;

    async fn connect(&self, endpoint: &Endpoint) -> PaneResult<Self::Transport> {
        let stream = TcpStream::connect((endpoint.host(), endpoint.port()))
            .await
            .map_err(|e| PaneError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        stream.set_nodelay(true)?;
        Ok(StreamTransport::new(stream, endpoint.to_string()))
    }
}
