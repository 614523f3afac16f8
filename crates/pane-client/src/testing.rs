//! Scripted collaborators for driving the engine without hardware.
//!
//! Every fake is a cheap handle over shared state, so a test can move one
//! clone into [`Peripherals`] and keep another to inspect or feed it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::DuplexStream;

use pane_core::error::{PaneError, PaneResult};
use pane_core::transport::Connector;
use pane_core::Endpoint;

use crate::device::{Display, Gesture, GestureSource, LinkStatus, Peripherals, Prompter};
use crate::transport::StreamTransport;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One call made against a [`RecordingDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOp {
    FillScreen(u16),
    SetCursor(i32, i32),
    Print(String),
    Println(String),
    DrawPixel(i32, i32, u16),
    FillRect(i32, i32, i32, i32, u16),
    SetTextColor(u16),
    SetTextSize(u16),
}

/// Display that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    ops: Arc<Mutex<Vec<DrawOp>>>,
}

impl RecordingDisplay {
    pub fn ops(&self) -> Vec<DrawOp> {
        lock(&self.ops).clone()
    }

    /// Text passed to `print`/`println`, in order.
    pub fn text(&self) -> Vec<String> {
        lock(&self.ops)
            .iter()
            .filter_map(|op| match op {
                DrawOp::Print(t) | DrawOp::Println(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: DrawOp) {
        lock(&self.ops).push(op);
    }
}

impl Display for RecordingDisplay {
    fn fill_screen(&mut self, color: u16) {
        self.record(DrawOp::FillScreen(color));
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.record(DrawOp::SetCursor(x, y));
    }

    fn print(&mut self, text: &str) {
        self.record(DrawOp::Print(text.to_string()));
    }

    fn println(&mut self, text: &str) {
        self.record(DrawOp::Println(text.to_string()));
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: u16) {
        self.record(DrawOp::DrawPixel(x, y, color));
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u16) {
        self.record(DrawOp::FillRect(x, y, w, h, color));
    }

    fn set_text_color(&mut self, color: u16) {
        self.record(DrawOp::SetTextColor(color));
    }

    fn set_text_size(&mut self, size: u16) {
        self.record(DrawOp::SetTextSize(size));
    }
}

/// A canned answer for a [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptReply {
    Text(String),
    Ok(bool),
    Select(Option<usize>),
}

#[derive(Debug, Default)]
struct PromptScript {
    replies: VecDeque<PromptReply>,
    questions: Vec<String>,
    selections: Vec<Vec<String>>,
}

/// Prompter that answers from a script.
///
/// Panics when the script runs dry or the next reply has the wrong kind,
/// which surfaces an unexpected prompt as a test failure instead of a hang.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    script: Arc<Mutex<PromptScript>>,
}

impl ScriptedPrompter {
    pub fn new(replies: Vec<PromptReply>) -> Self {
        let prompter = Self::default();
        prompter.extend(replies);
        prompter
    }

    pub fn extend(&self, replies: impl IntoIterator<Item = PromptReply>) {
        lock(&self.script).replies.extend(replies);
    }

    /// Questions asked through `ask_text` and `ask_ok`.
    pub fn questions(&self) -> Vec<String> {
        lock(&self.script).questions.clone()
    }

    /// Option lists passed to `select`.
    pub fn selections(&self) -> Vec<Vec<String>> {
        lock(&self.script).selections.clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.script).replies.len()
    }

    fn next(&self) -> PromptReply {
        match lock(&self.script).replies.pop_front() {
            Some(reply) => reply,
            None => panic!("prompt script exhausted"),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask_text(&mut self, question: &str, _default: &str) -> String {
        lock(&self.script).questions.push(question.to_string());
        match self.next() {
            PromptReply::Text(text) => text,
            other => panic!("expected a text reply for '{question}', got {other:?}"),
        }
    }

    fn ask_ok(&mut self, question: &str) -> bool {
        lock(&self.script).questions.push(question.to_string());
        match self.next() {
            PromptReply::Ok(yes) => yes,
            other => panic!("expected an ok reply for '{question}', got {other:?}"),
        }
    }

    fn select(&mut self, options: &[String]) -> Option<usize> {
        lock(&self.script).selections.push(options.to_vec());
        match self.next() {
            PromptReply::Select(choice) => choice,
            other => panic!("expected a select reply, got {other:?}"),
        }
    }
}

/// Gesture source backed by a queue.
#[derive(Debug, Clone, Default)]
pub struct QueuedGestures {
    queue: Arc<Mutex<VecDeque<Gesture>>>,
}

impl QueuedGestures {
    pub fn push(&self, gesture: Gesture) {
        lock(&self.queue).push_back(gesture);
    }
}

impl From<Vec<Gesture>> for QueuedGestures {
    fn from(gestures: Vec<Gesture>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(gestures.into())),
        }
    }
}

impl GestureSource for QueuedGestures {
    fn next_gesture(&mut self) -> Option<Gesture> {
        lock(&self.queue).pop_front()
    }
}

/// Link status that can be flipped from the test.
#[derive(Debug, Clone)]
pub struct SwitchableLink {
    ready: Arc<AtomicBool>,
}

impl SwitchableLink {
    pub fn new(ready: bool) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(ready)),
        }
    }

    pub fn set(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl Default for SwitchableLink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LinkStatus for SwitchableLink {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct ConnectScript {
    outcomes: VecDeque<Option<DuplexStream>>,
    attempts: Vec<Endpoint>,
}

/// Connector that hands out in-memory pipes.
///
/// Each [`accept_next`](Self::accept_next) queues a successful connection
/// and returns the server end; [`refuse_next`](Self::refuse_next) queues a
/// failure. Unscripted attempts fail.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    script: Arc<Mutex<ConnectScript>>,
}

impl ScriptedConnector {
    pub fn accept_next(&self) -> DuplexStream {
        let (client, server) = tokio::io::duplex(64 * 1024);
        lock(&self.script).outcomes.push_back(Some(client));
        server
    }

    pub fn refuse_next(&self) {
        lock(&self.script).outcomes.push_back(None);
    }

    /// Every endpoint a connection was attempted to, in order.
    pub fn attempts(&self) -> Vec<Endpoint> {
        lock(&self.script).attempts.clone()
    }
}

impl Connector for ScriptedConnector {
    type Transport = StreamTransport<DuplexStream>;

    async fn connect(&self, endpoint: &Endpoint) -> PaneResult<Self::Transport> {
        let outcome = {
            let mut script = lock(&self.script);
            script.attempts.push(endpoint.clone());
            script.outcomes.pop_front().flatten()
        };

        outcome
            .map(|stream| StreamTransport::new(stream, endpoint.to_string()))
            .ok_or_else(|| PaneError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: "connection refused".into(),
            })
    }
}

/// Handles to the fakes inside a [`Peripherals`] built by [`fake_peripherals`].
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    pub display: RecordingDisplay,
    pub prompter: ScriptedPrompter,
    pub gestures: QueuedGestures,
    pub link: SwitchableLink,
}

/// Build peripherals from fresh fakes, returning handles to them.
pub fn fake_peripherals() -> (Peripherals, FakeDevice) {
    let device = FakeDevice::default();
    let peripherals = Peripherals {
        display: Box::new(device.display.clone()),
        prompter: Box::new(device.prompter.clone()),
        gestures: Box::new(device.gestures.clone()),
        link: Box::new(device.link.clone()),
    };
    (peripherals, device)
}
