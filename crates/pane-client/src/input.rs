//! Gesture-to-protocol translation.
//!
//! Click, long press, and double click are forwarded as protocol tokens.
//! A triple click never reaches the server: it opens a local "exit app"
//! confirmation instead.

use tracing::{debug, info};

use pane_core::messages::ClientMessage;
use pane_core::transport::Transport;

use crate::device::{Gesture, GestureSource, Prompter};
use crate::transport::send_if_connected;

/// Question shown when the user triple-clicks.
pub const EXIT_PROMPT: &str = "Exit App";

/// What a gesture maps to before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Forward(ClientMessage),
    ConfirmExit,
    Ignore,
}

/// Result of one input tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// No gesture, or one that is not mapped.
    Idle,
    /// A token was written to the server.
    Forwarded(ClientMessage),
    /// The user declined to exit; a redraw was requested.
    ExitDeclined,
    /// The user confirmed exit; the stream has been closed.
    ExitConfirmed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputTranslator;

impl InputTranslator {
    pub fn new() -> Self {
        Self
    }

    pub fn translate(gesture: Gesture) -> Translation {
        match gesture {
            Gesture::Click => Translation::Forward(ClientMessage::Click),
            Gesture::LongPress => Translation::Forward(ClientMessage::LongClick),
            Gesture::DoubleClick => Translation::Forward(ClientMessage::DoubleClick),
            Gesture::TripleClick => Translation::ConfirmExit,
            Gesture::Other => Translation::Ignore,
        }
    }

    /// Handle at most one pending gesture.
    pub async fn tick<T: Transport>(
        &self,
        transport: &mut T,
        gestures: &mut dyn GestureSource,
        prompter: &mut dyn Prompter,
    ) -> InputOutcome {
        let Some(gesture) = gestures.next_gesture() else {
            return InputOutcome::Idle;
        };
        debug!(?gesture, "gesture");

        match Self::translate(gesture) {
            Translation::Forward(msg) => {
                send_if_connected(transport, &msg).await;
                InputOutcome::Forwarded(msg)
            }
            Translation::ConfirmExit => {
                if prompter.ask_ok(EXIT_PROMPT) {
                    if let Err(e) = transport.close().await {
                        debug!("close on exit failed: {}", e);
                    }
                    info!("user left the app");
                    InputOutcome::ExitConfirmed
                } else {
                    send_if_connected(transport, &ClientMessage::Rerender).await;
                    InputOutcome::ExitDeclined
                }
            }
            Translation::Ignore => InputOutcome::Idle,
        }
    }
}
