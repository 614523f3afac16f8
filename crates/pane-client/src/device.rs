//! Device collaborators: display, modal prompts, gestures, and link status.
//!
//! The engine never touches hardware directly. Everything it draws, asks,
//! or senses goes through these traits, bundled in [`Peripherals`].

/// RGB565 colours used by the engine's own notices.
pub mod colors {
    pub const BLACK: u16 = 0x0000;
    pub const RED: u16 = 0xF800;
    pub const UI_BACKGROUND: u16 = 0x18E3;
    pub const UI_TEXT: u16 = 0xFFFF;
}

/// Raw drawing surface.
pub trait Display {
    fn fill_screen(&mut self, color: u16);
    fn set_cursor(&mut self, x: i32, y: i32);
    /// Print text at the cursor without a line break.
    fn print(&mut self, text: &str);
    fn println(&mut self, text: &str);
    fn draw_pixel(&mut self, x: i32, y: i32, color: u16);
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u16);
    fn set_text_color(&mut self, color: u16);
    fn set_text_size(&mut self, size: u16);

    /// Fill the screen and home the cursor.
    fn clear(&mut self, color: u16) {
        self.fill_screen(color);
        self.set_cursor(0, 0);
    }
}

/// Blocking modal prompts.
pub trait Prompter {
    /// Free-text entry, pre-filled with `default`.
    fn ask_text(&mut self, question: &str, default: &str) -> String;
    /// Yes/no confirmation.
    fn ask_ok(&mut self, question: &str) -> bool;
    /// Pick one of `options`. `None` means no selection was made.
    fn select(&mut self, options: &[String]) -> Option<usize>;
}

/// Discrete gestures from the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Click,
    LongPress,
    DoubleClick,
    TripleClick,
    /// Anything else the input layer reports (e.g. a release).
    Other,
}

/// Source of gesture events. Non-blocking.
pub trait GestureSource {
    fn next_gesture(&mut self) -> Option<Gesture>;
}

/// Whether the network link is up (e.g. radio associated).
pub trait LinkStatus {
    fn is_ready(&self) -> bool;
}

/// The collaborators owned by a session manager.
pub struct Peripherals {
    pub display: Box<dyn Display + Send>,
    pub prompter: Box<dyn Prompter + Send>,
    pub gestures: Box<dyn GestureSource + Send>,
    pub link: Box<dyn LinkStatus + Send>,
}

/// Full-screen status notice in the UI colours.
pub fn show_notice(display: &mut dyn Display, text: &str) {
    display.clear(colors::UI_BACKGROUND);
    display.set_text_size(2);
    display.set_text_color(colors::UI_TEXT);
    display.set_cursor(20, 20);
    display.println(text);
    display.set_cursor(0, 0);
}

/// Full-screen error in red on black.
pub fn show_error(display: &mut dyn Display, text: &str) {
    display.clear(colors::BLACK);
    display.set_text_color(colors::RED);
    display.println(text);
}
