//! Server command dispatch.
//!
//! Each tick drains whatever the server has sent: bytes are fed into a
//! [`FrameDecoder`] and every complete frame is executed in order. Waiting
//! is bounded on both sides of a frame boundary, so a slow or stalled server
//! delays the tick by at most `frame_timeout` and the half-received frame
//! simply waits in the decoder for the next tick.

use std::time::Duration;

use tokio::time;
use tracing::{debug, trace, warn};

use pane_core::codec::FrameDecoder;
use pane_core::messages::{ClientMessage, Opcode, ServerCommand, ABSENT_VALUE};
use pane_core::transport::Transport;

use crate::device::{Display, Prompter};
use crate::storage::StorageKeyspace;
use crate::transport::send_if_connected;

const READ_CHUNK: usize = 4096;

/// Everything a command may touch while it executes.
pub struct DispatchContext<'a> {
    pub display: &'a mut dyn Display,
    pub prompter: &'a mut dyn Prompter,
    pub storage: &'a StorageKeyspace,
    /// Identity of the device user.
    pub user: &'a str,
    /// Identity of the connected application (its endpoint string).
    pub app: &'a str,
}

/// Decodes and executes server commands.
#[derive(Debug)]
pub struct ProtocolDispatcher {
    decoder: FrameDecoder,
    poll_interval: Duration,
    frame_timeout: Duration,
    read_buf: Vec<u8>,
}

impl ProtocolDispatcher {
    pub fn new(poll_interval: Duration, frame_timeout: Duration) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            poll_interval,
            frame_timeout,
            read_buf: vec![0u8; READ_CHUNK],
        }
    }

    /// Forget any partially received frame. Called on every new connection.
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    /// Bytes of a frame that has started arriving but is not complete yet.
    pub fn pending(&self) -> usize {
        self.decoder.pending()
    }

    /// Execute every frame the server has sent so far.
    ///
    /// Stops as soon as the stream closes or no more data arrives within
    /// the bounded wait. Returns the number of frames executed.
    pub async fn tick<T: Transport>(
        &mut self,
        transport: &mut T,
        ctx: &mut DispatchContext<'_>,
    ) -> usize {
        let mut executed = 0;

        loop {
            while transport.is_connected() {
                let Some(cmd) = self.decoder.next_frame() else {
                    break;
                };
                execute(cmd, transport, ctx).await;
                executed += 1;
            }

            if !transport.is_connected() {
                break;
            }

            let pending = self.decoder.pending();
            let wait = if pending > 0 {
                self.frame_timeout
            } else {
                self.poll_interval
            };

            match time::timeout(wait, transport.recv(&mut self.read_buf)).await {
                Err(_) => {
                    if pending > 0 {
                        debug!(pending, "frame incomplete, yielding");
                    }
                    break;
                }
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    trace!(bytes = n, "received");
                    self.decoder.extend(&self.read_buf[..n]);
                }
                Ok(Err(e)) => {
                    debug!("read failed: {}", e);
                    break;
                }
            }
        }

        executed
    }
}

/// Run one decoded command.
pub async fn execute<T: Transport>(
    cmd: ServerCommand,
    transport: &mut T,
    ctx: &mut DispatchContext<'_>,
) {
    trace!(class = ?cmd.opcode().map(Opcode::class), ?cmd, "execute");

    match cmd {
        // ── render ──────────────────────────────────────────────────
        ServerCommand::FillScreen { color } => ctx.display.fill_screen(color),
        ServerCommand::SetCursor { x, y } => ctx.display.set_cursor(x, y),
        ServerCommand::Write { text } => ctx.display.print(&text),
        ServerCommand::Println { text } => ctx.display.println(&text),
        ServerCommand::DrawPixel { x, y, color } => ctx.display.draw_pixel(x, y, color),
        ServerCommand::FillRect { x, y, w, h, color } => ctx.display.fill_rect(x, y, w, h, color),
        ServerCommand::SetTextColor { color } => ctx.display.set_text_color(color),
        ServerCommand::SetTextSize { size } => ctx.display.set_text_size(size),

        // ── storage ─────────────────────────────────────────────────
        ServerCommand::GetStorageKey { key } => {
            let value = ctx.storage.get(ctx.user, ctx.app, &key).unwrap_or_else(|e| {
                warn!(key = %key, "storage read failed: {}", e);
                ABSENT_VALUE.to_string()
            });
            send_if_connected(transport, &ClientMessage::StorageValue(value)).await;
        }
        ServerCommand::SetStorageKey { key, value } => {
            if let Err(e) = ctx.storage.set(ctx.user, ctx.app, &key, &value) {
                warn!(key = %key, "storage write failed: {}", e);
            }
        }

        // ── prompts ─────────────────────────────────────────────────
        ServerCommand::AskText { question, default } => {
            let value = ctx.prompter.ask_text(&question, &default);
            answer(transport, ClientMessage::TextValue(value)).await;
        }
        ServerCommand::AskOk { question } => {
            let yes = ctx.prompter.ask_ok(&question);
            answer(transport, ClientMessage::OkValue(yes)).await;
        }
        ServerCommand::AskSelect { options } => {
            let choice = ctx.prompter.select(&options);
            answer(transport, ClientMessage::SelectValue(choice)).await;
        }

        ServerCommand::Unknown { token } => {
            if token.trim().is_empty() {
                trace!("blank line between frames");
            } else {
                warn!(opcode = %token, "unknown opcode, skipping line");
            }
        }
    }
}

/// Send a prompt answer followed by a redraw request.
async fn answer<T: Transport>(transport: &mut T, msg: ClientMessage) {
    send_if_connected(transport, &msg).await;
    send_if_connected(transport, &ClientMessage::Rerender).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DrawOp, PromptReply, RecordingDisplay, ScriptedPrompter};
    use crate::transport::StreamTransport;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    struct Harness {
        _dir: TempDir,
        storage: StorageKeyspace,
        display: RecordingDisplay,
        prompter: ScriptedPrompter,
        dispatcher: ProtocolDispatcher,
        transport: StreamTransport<DuplexStream>,
        server: DuplexStream,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let (client, server) = tokio::io::duplex(64 * 1024);
            Self {
                storage: StorageKeyspace::new(dir.path()),
                _dir: dir,
                display: RecordingDisplay::default(),
                prompter: ScriptedPrompter::default(),
                dispatcher: ProtocolDispatcher::new(
                    Duration::from_millis(20),
                    Duration::from_millis(50),
                ),
                transport: StreamTransport::new(client, "duplex"),
                server,
            }
        }

        async fn serve(&mut self, wire: &str) {
            self.server.write_all(wire.as_bytes()).await.unwrap();
        }

        async fn tick(&mut self) -> usize {
            let mut display = self.display.clone();
            let mut prompter = self.prompter.clone();
            let mut ctx = DispatchContext {
                display: &mut display,
                prompter: &mut prompter,
                storage: &self.storage,
                user: "alice",
                app: "game.example:9000",
            };
            self.dispatcher.tick(&mut self.transport, &mut ctx).await
        }

        /// Close our side and collect everything the client wrote.
        async fn replies(mut self) -> String {
            self.transport.close().await.unwrap();
            let mut out = String::new();
            self.server.read_to_string(&mut out).await.unwrap();
            out
        }
    }

    #[tokio::test]
    async fn render_commands_reach_display() {
        let mut h = Harness::new();
        h.serve(concat!(
            "fillScreen\n31\n",
            "setCursor\n10\n20\n",
            "setTextColor\n65535\n",
            "setTextSize\n2\n",
            "write\nhello \n",
            "println\nworld\n",
            "drawPixel\n1\n2\n3\n",
            "fillRect\n0\n0\nwide\n8\n63488\n",
        ))
        .await;

        assert_eq!(h.tick().await, 8);
        assert_eq!(
            h.display.ops(),
            vec![
                DrawOp::FillScreen(31),
                DrawOp::SetCursor(10, 20),
                DrawOp::SetTextColor(65535),
                DrawOp::SetTextSize(2),
                DrawOp::Print("hello ".into()),
                DrawOp::Println("world".into()),
                DrawOp::DrawPixel(1, 2, 3),
                DrawOp::FillRect(0, 0, 0, 8, 63488),
            ]
        );
        // Render commands are never acknowledged.
        assert_eq!(h.replies().await, "");
    }

    #[tokio::test]
    async fn storage_round_trip() {
        let mut h = Harness::new();
        h.serve("get-storage-key\nscore\nset-storage-key\nscore\n1200\nget-storage-key\nscore\n")
            .await;

        assert_eq!(h.tick().await, 3);
        assert_eq!(h.storage.get("alice", "game.example:9000", "score").unwrap(), "1200");
        assert_eq!(
            h.replies().await,
            "return-storage-key\n-1\r\nreturn-storage-key\n1200\r\n"
        );
    }

    #[tokio::test]
    async fn empty_storage_value_is_distinct_from_absent() {
        let mut h = Harness::new();
        h.serve("set-storage-key\nk\n\nget-storage-key\nk\n").await;
        h.tick().await;
        assert_eq!(h.replies().await, "return-storage-key\n\r\n");
    }

    #[tokio::test]
    async fn prompts_answer_then_request_rerender() {
        let mut h = Harness::new();
        h.prompter.extend([
            PromptReply::Text("two\nlines".into()),
            PromptReply::Ok(true),
            PromptReply::Select(Some(1)),
            PromptReply::Select(None),
        ]);
        h.serve(concat!(
            "ask-text\nName?\nanon\n",
            "ask-ok\nSure?\n",
            "ask-select\nred\ngreen\n::OPTIONS_END::\n",
            "ask-select\n::OPTIONS_END::\n",
        ))
        .await;

        assert_eq!(h.tick().await, 4);
        assert_eq!(h.prompter.questions(), vec!["Name?", "Sure?"]);
        assert_eq!(
            h.prompter.selections(),
            vec![vec!["red".to_string(), "green".to_string()], vec![]]
        );
        assert_eq!(
            h.replies().await,
            concat!(
                "ask-text-value\ntwo\\nlines\r\nrerender\r\n",
                "ask-ok-value\nyes\r\nrerender\r\n",
                "ask-select-value\n1\r\nrerender\r\n",
                "ask-select-value\n-1\r\nrerender\r\n",
            )
        );
    }

    #[tokio::test]
    async fn partial_frame_yields_and_resumes() {
        let mut h = Harness::new();
        h.serve("println\nfirst\nfillRect\n1\n2\n").await;

        assert_eq!(h.tick().await, 1);
        assert_eq!(h.dispatcher.pending(), "fillRect\n1\n2\n".len());
        assert!(h.transport.is_connected());

        h.serve("3\n4\n5\n").await;
        assert_eq!(h.tick().await, 1);
        assert_eq!(h.dispatcher.pending(), 0);
        assert_eq!(h.display.ops().last(), Some(&DrawOp::FillRect(1, 2, 3, 4, 5)));
    }

    #[tokio::test]
    async fn unknown_opcode_skips_a_line() {
        let mut h = Harness::new();
        h.serve("drawCircle\n\nprintln\nstill here\n").await;
        assert_eq!(h.tick().await, 3);
        assert_eq!(h.display.text(), vec!["still here"]);
    }

    #[tokio::test]
    async fn idle_stream_returns_quickly() {
        let mut h = Harness::new();
        assert_eq!(h.tick().await, 0);
        assert!(h.transport.is_connected());
    }

    #[tokio::test]
    async fn stops_when_peer_disconnects() {
        let mut h = Harness::new();
        h.serve("println\nbye\n").await;
        h.server.shutdown().await.unwrap();

        assert_eq!(h.tick().await, 1);
        assert!(!h.transport.is_connected());
    }

    #[tokio::test]
    async fn reply_after_drop_is_discarded() {
        let mut h = Harness::new();
        h.serve("get-storage-key\nk\n").await;
        h.transport.close().await.unwrap();

        // Nothing is executed or written once the stream is gone.
        assert_eq!(h.tick().await, 0);
        let mut out = String::new();
        h.server.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "");
    }
}
