//! `pane [ENDPOINT]`: run the thin client on this terminal.
//!
//! Drives the session manager until Ctrl+] is pressed or the app list is
//! dismissed. The console shows text the server prints; the keyboard
//! stands in for the device button.

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time;
use tracing::{debug, info, warn};

use pane_client::{EngineConfig, SessionManager, TcpConnector, TickOutcome};

use crate::devices::terminal_peripherals;

/// Sleep between ticks that did nothing.
const IDLE_BACKOFF: Duration = Duration::from_millis(20);

/// Esc on the app list leaves the client.
fn ends_run(outcome: TickOutcome) -> bool {
    outcome == TickOutcome::Dismissed
}

pub async fn run(engine: EngineConfig, endpoint: Option<&str>) -> Result<()> {
    if !std::io::stdin().is_terminal() {
        anyhow::bail!("the interactive client needs a terminal on stdin");
    }

    info!(user = %engine.user, root = %engine.storage_root.display(), "starting client");
    let quit = Arc::new(AtomicBool::new(false));
    let mut manager = SessionManager::new(engine, TcpConnector, terminal_peripherals(quit.clone()));
    if let Some(endpoint) = endpoint {
        manager.choose(endpoint);
    }

    eprintln!("keys: c click, l long press, d double click, t triple click, Ctrl+] quit (Esc on the app list)");

    while !quit.load(Ordering::SeqCst) {
        match manager.tick().await {
            Ok(outcome) if ends_run(outcome) => break,
            Ok(TickOutcome::Idle) => time::sleep(IDLE_BACKOFF).await,
            Ok(outcome) => debug!(
                ?outcome,
                state = ?manager.state(),
                endpoint = ?manager.endpoint(),
                pending = manager.pending_frame_bytes(),
                "tick"
            ),
            Err(e) => {
                warn!("{}", e);
                time::sleep(IDLE_BACKOFF).await;
            }
        }
    }

    manager.shutdown().await.context("failed to close the session")?;
    info!("client stopped");
    Ok(())
}
