//! Terminal-backed peripherals: the console stands in for the screen,
//! dialoguer for on-device prompts, and the keyboard for the button.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::QueueableCommand;
use dialoguer::{Confirm, Input, Select};
use tracing::{debug, trace, warn};

use pane_client::{Display, Gesture, GestureSource, LinkStatus, Peripherals, Prompter};

use crate::terminal::RawModeGuard;

/// Expand an RGB565 colour to 8 bits per channel.
pub fn rgb565_to_rgb(color: u16) -> (u8, u8, u8) {
    let r = (color >> 11) & 0x1f;
    let g = (color >> 5) & 0x3f;
    let b = color & 0x1f;
    (
        (r * 255 / 31) as u8,
        (g * 255 / 63) as u8,
        (b * 255 / 31) as u8,
    )
}

/// Prints text to stdout in the current text colour.
///
/// Pixel-level operations have no console equivalent and are only traced.
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    color: Option<u16>,
    mid_line: bool,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_text(&mut self, text: &str, newline: bool) {
        let mut out = io::stdout().lock();
        if let Some(color) = self.color {
            let (r, g, b) = rgb565_to_rgb(color);
            let _ = out.queue(SetForegroundColor(Color::Rgb { r, g, b }));
        }
        let _ = out.write_all(text.as_bytes());
        if self.color.is_some() {
            let _ = out.queue(ResetColor);
        }
        if newline {
            let _ = out.write_all(b"\n");
        }
        let _ = out.flush();
        self.mid_line = !newline && !text.ends_with('\n');
    }
}

impl Display for ConsoleDisplay {
    fn fill_screen(&mut self, color: u16) {
        trace!(color, "fill screen");
        if self.mid_line {
            self.write_text("", true);
        }
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        trace!(x, y, "cursor");
    }

    fn print(&mut self, text: &str) {
        self.write_text(text, false);
    }

    fn println(&mut self, text: &str) {
        self.write_text(text, true);
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: u16) {
        trace!(x, y, color, "pixel");
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u16) {
        trace!(x, y, w, h, color, "rect");
    }

    fn set_text_color(&mut self, color: u16) {
        self.color = Some(color);
    }

    fn set_text_size(&mut self, size: u16) {
        trace!(size, "text size");
    }
}

/// Interactive prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn ask_text(&mut self, question: &str, default: &str) -> String {
        Input::<String>::new()
            .with_prompt(question)
            .with_initial_text(default)
            .allow_empty(true)
            .interact_text()
            .unwrap_or_else(|e| {
                warn!("text prompt failed: {}", e);
                default.to_string()
            })
    }

    fn ask_ok(&mut self, question: &str) -> bool {
        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .unwrap_or_else(|e| {
                warn!("confirm prompt failed: {}", e);
                false
            })
    }

    fn select(&mut self, options: &[String]) -> Option<usize> {
        if options.is_empty() {
            return None;
        }
        Select::new()
            .items(options)
            .default(0)
            .interact_opt()
            .unwrap_or_else(|e| {
                warn!("select prompt failed: {}", e);
                None
            })
    }
}

/// What a key press means to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Gesture(Gesture),
    Quit,
}

/// Map a key press. Ctrl+] quits, like the ssh escape.
pub fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char(']') => Some(KeyAction::Quit),
            _ => None,
        };
    }

    let gesture = match key.code {
        KeyCode::Char('c') | KeyCode::Enter => Gesture::Click,
        KeyCode::Char('l') => Gesture::LongPress,
        KeyCode::Char('d') => Gesture::DoubleClick,
        KeyCode::Char('t') => Gesture::TripleClick,
        _ => return None,
    };
    Some(KeyAction::Gesture(gesture))
}

/// Non-blocking keyboard reader.
///
/// Raw mode is held only while polling so dialoguer prompts and console
/// output see a cooked terminal.
#[derive(Debug)]
pub struct KeyboardGestures {
    quit: Arc<AtomicBool>,
}

impl KeyboardGestures {
    pub fn new(quit: Arc<AtomicBool>) -> Self {
        Self { quit }
    }
}

impl GestureSource for KeyboardGestures {
    fn next_gesture(&mut self) -> Option<Gesture> {
        let _guard = match RawModeGuard::enter() {
            Ok(guard) => guard,
            Err(e) => {
                debug!("{:#}", e);
                return None;
            }
        };

        while event::poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key_action(&key) {
                Some(KeyAction::Gesture(gesture)) => return Some(gesture),
                Some(KeyAction::Quit) => {
                    debug!("quit requested");
                    self.quit.store(true, Ordering::SeqCst);
                    return None;
                }
                None => {}
            }
        }
        None
    }
}

/// The host network is assumed to be up.
#[derive(Debug, Default)]
pub struct HostLink;

impl LinkStatus for HostLink {
    fn is_ready(&self) -> bool {
        true
    }
}

/// Peripherals for an interactive terminal session. Ctrl+] sets `quit`.
pub fn terminal_peripherals(quit: Arc<AtomicBool>) -> Peripherals {
    Peripherals {
        display: Box::new(ConsoleDisplay::new()),
        prompter: Box::new(DialoguerPrompter),
        gestures: Box::new(KeyboardGestures::new(quit)),
        link: Box::new(HostLink),
    }
}
