//! The session state machine.
//!
//! ```text
//! Disconnected ──▶ Selecting ──▶ Connecting ──▶ Connected
//!                     ▲  ▲            │             │
//!                     │  └── failed ──┘             │ stream closed
//!                     │                             ▼
//!                     └──────── (exit) ◀──────── Faulted
//! ```
//!
//! `SessionManager` owns the stream exclusively and lends it to the input
//! translator and the protocol dispatcher for the duration of a tick.

use std::time::Duration;

use tokio::time;
use tracing::{debug, info, warn};

use pane_core::error::{PaneError, PaneResult};
use pane_core::messages::ClientMessage;
use pane_core::transport::{Connector, Transport};
use pane_core::Endpoint;

use crate::config::EngineConfig;
use crate::device::{show_error, show_notice, Peripherals};
use crate::dispatcher::{DispatchContext, ProtocolDispatcher};
use crate::input::{InputOutcome, InputTranslator};
use crate::recent_apps::RecentAppsRegistry;
use crate::storage::StorageKeyspace;
use crate::transport::send_if_connected;

pub const ADD_ENDPOINT_PROMPT: &str = "Input domain (host:port)";
pub const CONNECTED_NOTICE: &str = "Connected!";
pub const OFFLINE_NOTICE: &str = "Offline!";
pub const CONNECT_FAILED_NOTICE: &str = "Connection failed";

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Power-on state; nothing chosen yet.
    Disconnected,
    /// Waiting for the user to pick (or add) an endpoint.
    Selecting,
    /// An endpoint is chosen; the next tick opens the stream.
    Connecting,
    /// Handshake sent; commands and gestures flow.
    Connected,
    /// The stream dropped while connected.
    Faulted,
}

/// What a single [`SessionManager::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing happened (link down, or an empty add-endpoint entry).
    Idle,
    /// The recent apps list was dismissed; it is presented again next tick.
    Dismissed,
    /// An endpoint was picked from the recent apps list.
    Selected,
    /// A new endpoint was validated and stored.
    EndpointAdded,
    /// A connection attempt failed; back to selection.
    ConnectFailed,
    /// A stream was opened and the handshake sent.
    Connected,
    /// Gestures and server frames were processed.
    Dispatched { frames: usize },
    /// The user left the app.
    Exited,
    /// The stream dropped and the reselect/reconnect cycle ran.
    Faulted,
}

/// Drives one device session at a time.
pub struct SessionManager<C: Connector> {
    config: EngineConfig,
    connector: C,
    peripherals: Peripherals,
    storage: StorageKeyspace,
    registry: RecentAppsRegistry,
    dispatcher: ProtocolDispatcher,
    input: InputTranslator,
    state: SessionState,
    endpoint: Option<String>,
    transport: Option<C::Transport>,
}

impl<C: Connector> SessionManager<C> {
    pub fn new(config: EngineConfig, connector: C, peripherals: Peripherals) -> Self {
        let storage = StorageKeyspace::new(config.storage_root.clone());
        let registry = RecentAppsRegistry::new(storage.clone(), config.default_endpoint.clone());
        let dispatcher = ProtocolDispatcher::new(config.poll_interval, config.frame_timeout);

        Self {
            config,
            connector,
            peripherals,
            storage,
            registry,
            dispatcher,
            input: InputTranslator::new(),
            state: SessionState::Disconnected,
            endpoint: None,
            transport: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The chosen endpoint string, which is also the app's storage identity.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn registry(&self) -> &RecentAppsRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &StorageKeyspace {
        &self.storage
    }

    /// Bytes of a half-received server frame waiting for the rest.
    pub fn pending_frame_bytes(&self) -> usize {
        self.dispatcher.pending()
    }

    /// Skip selection and connect to `endpoint` on the next tick.
    pub fn choose(&mut self, endpoint: impl Into<String>) {
        self.endpoint = Some(endpoint.into());
        self.state = SessionState::Connecting;
    }

    /// Advance the state machine by one step.
    pub async fn tick(&mut self) -> PaneResult<TickOutcome> {
        if !self.peripherals.link.is_ready() {
            return Ok(TickOutcome::Idle);
        }

        match self.state {
            SessionState::Disconnected | SessionState::Selecting => self.start().await,
            SessionState::Connecting => self.connect().await,
            SessionState::Connected => self.serve().await,
            SessionState::Faulted => self.recover().await,
        }
    }

    /// Present the recent apps list once.
    ///
    /// Index 0 is the add-endpoint entry. A dismissed list leaves the state
    /// at `Selecting`, so the next tick presents it again.
    pub async fn start(&mut self) -> PaneResult<TickOutcome> {
        self.state = SessionState::Selecting;

        let apps = self.registry.list(&self.config.user)?;
        match self.peripherals.prompter.select(&apps) {
            None => {
                debug!("app list dismissed");
                Ok(TickOutcome::Dismissed)
            }
            Some(0) => self.add_endpoint().await,
            Some(index) => match apps.get(index) {
                Some(endpoint) => {
                    info!(endpoint = %endpoint, "selected app");
                    self.endpoint = Some(endpoint.clone());
                    self.state = SessionState::Connecting;
                    Ok(TickOutcome::Selected)
                }
                None => {
                    warn!(index, "selection out of range");
                    Ok(TickOutcome::Idle)
                }
            },
        }
    }

    /// Ask for a new endpoint, validate it with a live connection, and store it.
    async fn add_endpoint(&mut self) -> PaneResult<TickOutcome> {
        let raw = self.peripherals.prompter.ask_text(ADD_ENDPOINT_PROMPT, "");
        let raw = raw.trim();
        self.state = SessionState::Selecting;

        if raw.is_empty() {
            debug!("empty endpoint entered");
            return Ok(TickOutcome::Idle);
        }

        match self.register_endpoint(raw).await {
            Ok(()) => Ok(TickOutcome::EndpointAdded),
            Err(e @ PaneError::Storage(_)) => Err(e),
            Err(e) => {
                warn!("not adding {}: {}", raw, e);
                self.show_failure().await;
                Ok(TickOutcome::ConnectFailed)
            }
        }
    }

    /// Store `raw` in the recent apps list if a connection to it succeeds.
    ///
    /// The probe stream is closed again without a handshake.
    pub async fn register_endpoint(&self, raw: &str) -> PaneResult<()> {
        let endpoint = Endpoint::parse_with_default(raw, self.config.default_port)?;
        let mut probe = self.open(&endpoint).await?;
        if let Err(e) = probe.close().await {
            debug!("closing probe to {} failed: {}", endpoint, e);
        }
        self.registry.add(&self.config.user, raw)
    }

    /// Open a stream to the chosen endpoint and send the handshake.
    pub async fn connect(&mut self) -> PaneResult<TickOutcome> {
        let Some(raw) = self.endpoint.clone() else {
            self.state = SessionState::Selecting;
            return Ok(TickOutcome::Idle);
        };
        self.state = SessionState::Connecting;

        let opened = match Endpoint::parse_with_default(&raw, self.config.default_port) {
            Ok(endpoint) => self.open(&endpoint).await,
            Err(e) => Err(e),
        };

        match opened {
            Err(e) => {
                warn!("connection to {} failed: {}", raw, e);
                self.show_failure().await;
                self.endpoint = None;
                self.state = SessionState::Selecting;
                Ok(TickOutcome::ConnectFailed)
            }
            Ok(mut transport) => {
                show_notice(&mut *self.peripherals.display, CONNECTED_NOTICE);
                self.pause().await;

                self.dispatcher.reset();
                send_if_connected(&mut transport, &ClientMessage::Init).await;
                self.transport = Some(transport);
                self.state = SessionState::Connected;
                info!(endpoint = %raw, "connected");
                Ok(TickOutcome::Connected)
            }
        }
    }

    /// One connected step: a gesture, then everything the server sent.
    async fn serve(&mut self) -> PaneResult<TickOutcome> {
        let Some(transport) = self.transport.as_mut() else {
            return self.recover().await;
        };
        if !transport.is_connected() {
            return self.recover().await;
        }

        let outcome = self
            .input
            .tick(
                transport,
                &mut *self.peripherals.gestures,
                &mut *self.peripherals.prompter,
            )
            .await;
        if outcome == InputOutcome::ExitConfirmed {
            self.transport = None;
            self.endpoint = None;
            self.state = SessionState::Selecting;
            return Ok(TickOutcome::Exited);
        }

        let mut ctx = DispatchContext {
            display: &mut *self.peripherals.display,
            prompter: &mut *self.peripherals.prompter,
            storage: &self.storage,
            user: &self.config.user,
            app: self.endpoint.as_deref().unwrap_or_default(),
        };
        let frames = self.dispatcher.tick(transport, &mut ctx).await;
        Ok(TickOutcome::Dispatched { frames })
    }

    /// The stream dropped: tell the user, then reselect and reconnect.
    async fn recover(&mut self) -> PaneResult<TickOutcome> {
        self.state = SessionState::Faulted;
        info!(endpoint = ?self.endpoint, "stream lost");
        self.transport = None;

        show_notice(&mut *self.peripherals.display, OFFLINE_NOTICE);
        self.pause().await;

        self.start().await?;
        if self.state == SessionState::Connecting {
            self.connect().await?;
        }
        Ok(TickOutcome::Faulted)
    }

    /// Close any live stream and go back to the power-on state.
    pub async fn shutdown(&mut self) -> PaneResult<()> {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await?;
        }
        self.state = SessionState::Disconnected;
        Ok(())
    }

    async fn open(&self, endpoint: &Endpoint) -> PaneResult<C::Transport> {
        connect_bounded(&self.connector, endpoint, self.config.connect_timeout).await
    }

    async fn show_failure(&mut self) {
        show_error(&mut *self.peripherals.display, CONNECT_FAILED_NOTICE);
        self.pause().await;
    }

    async fn pause(&self) {
        let duration = self.config.notice_duration;
        if duration > Duration::ZERO {
            time::sleep(duration).await;
        }
    }
}

/// Open a stream to `endpoint`, giving up after `timeout`.
pub async fn connect_bounded<C: Connector>(
    connector: &C,
    endpoint: &Endpoint,
    timeout: Duration,
) -> PaneResult<C::Transport> {
    debug!(%endpoint, "connecting");
    match time::timeout(timeout, connector.connect(endpoint)).await {
        Ok(result) => result,
        Err(_) => Err(PaneError::Timeout),
    }
}
