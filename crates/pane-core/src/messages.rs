//! Protocol vocabulary for the pane line protocol.
//!
//! Server-to-client frames are an opcode line followed by a fixed,
//! opcode-specific number of operand lines. The opcode table below is the
//! single source of truth for tokens and arities; the frame decoder and the
//! dispatcher both consult it.

use crate::codec::{escape_newlines, lenient_int};

/// Port used when an endpoint omits `:port`.
pub const DEFAULT_PORT: u16 = 25279;

/// Literal line that terminates an `ask-select` option list.
pub const OPTIONS_END: &str = "::OPTIONS_END::";

/// Upper bound on options collected by a single `ask-select` frame.
pub const MAX_SELECT_OPTIONS: usize = 250;

/// Value returned for a storage key that has never been set.
pub const ABSENT_VALUE: &str = "-1";

/// Server opcodes understood by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    FillScreen,
    SetCursor,
    Write,
    Println,
    DrawPixel,
    FillRect,
    SetTextColor,
    SetTextSize,
    GetStorageKey,
    SetStorageKey,
    AskText,
    AskOk,
    AskSelect,
}

/// Coarse grouping of opcodes by the side effect they trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeClass {
    /// Forwarded to the display; no acknowledgment.
    Render,
    /// Delegated to the local keyspace.
    Storage,
    /// Blocks on a local modal prompt and answers with a typed value.
    Prompt,
}

/// How many operand lines follow an opcode line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many lines.
    Fixed(usize),
    /// Lines up to (and consuming) `sentinel`, but never more than `max`.
    UntilSentinel { sentinel: &'static str, max: usize },
}

/// One row of the opcode table.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeSpec {
    pub token: &'static str,
    pub opcode: Opcode,
    pub class: OpcodeClass,
    pub arity: Arity,
}

const fn row(token: &'static str, opcode: Opcode, class: OpcodeClass, arity: Arity) -> OpcodeSpec {
    OpcodeSpec {
        token,
        opcode,
        class,
        arity,
    }
}

/// The complete opcode table.
pub static OPCODE_TABLE: [OpcodeSpec; 13] = [
    row("fillScreen", Opcode::FillScreen, OpcodeClass::Render, Arity::Fixed(1)),
    row("setCursor", Opcode::SetCursor, OpcodeClass::Render, Arity::Fixed(2)),
    row("write", Opcode::Write, OpcodeClass::Render, Arity::Fixed(1)),
    row("println", Opcode::Println, OpcodeClass::Render, Arity::Fixed(1)),
    row("drawPixel", Opcode::DrawPixel, OpcodeClass::Render, Arity::Fixed(3)),
    row("fillRect", Opcode::FillRect, OpcodeClass::Render, Arity::Fixed(5)),
    row("setTextColor", Opcode::SetTextColor, OpcodeClass::Render, Arity::Fixed(1)),
    row("setTextSize", Opcode::SetTextSize, OpcodeClass::Render, Arity::Fixed(1)),
    row("get-storage-key", Opcode::GetStorageKey, OpcodeClass::Storage, Arity::Fixed(1)),
    row("set-storage-key", Opcode::SetStorageKey, OpcodeClass::Storage, Arity::Fixed(2)),
    row("ask-text", Opcode::AskText, OpcodeClass::Prompt, Arity::Fixed(2)),
    row("ask-ok", Opcode::AskOk, OpcodeClass::Prompt, Arity::Fixed(1)),
    row(
        "ask-select",
        Opcode::AskSelect,
        OpcodeClass::Prompt,
        Arity::UntilSentinel {
            sentinel: OPTIONS_END,
            max: MAX_SELECT_OPTIONS,
        },
    ),
];

impl Opcode {
    /// Look up an opcode by its wire token.
    pub fn from_token(token: &str) -> Option<Self> {
        OPCODE_TABLE
            .iter()
            .find(|spec| spec.token == token)
            .map(|spec| spec.opcode)
    }

    fn spec(self) -> &'static OpcodeSpec {
        // Every variant has exactly one row; the table test enforces it.
        OPCODE_TABLE
            .iter()
            .find(|spec| spec.opcode == self)
            .unwrap_or(&OPCODE_TABLE[0])
    }

    /// The wire token for this opcode.
    pub fn token(self) -> &'static str {
        self.spec().token
    }

    pub fn class(self) -> OpcodeClass {
        self.spec().class
    }

    pub fn arity(self) -> Arity {
        self.spec().arity
    }
}

/// A fully decoded server frame with typed operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCommand {
    FillScreen { color: u16 },
    SetCursor { x: i32, y: i32 },
    Write { text: String },
    Println { text: String },
    DrawPixel { x: i32, y: i32, color: u16 },
    FillRect { x: i32, y: i32, w: i32, h: i32, color: u16 },
    SetTextColor { color: u16 },
    SetTextSize { size: u16 },
    GetStorageKey { key: String },
    SetStorageKey { key: String, value: String },
    AskText { question: String, default: String },
    AskOk { question: String },
    AskSelect { options: Vec<String> },
    /// An opcode line not present in the table. Only the line itself is consumed.
    Unknown { token: String },
}

impl ServerCommand {
    /// Build a typed command from an opcode and its raw operand lines.
    ///
    /// Numeric operands are coerced leniently: anything that does not start
    /// with a number becomes 0. Missing operands read as empty strings.
    pub fn from_operands(opcode: Opcode, operands: Vec<String>) -> Self {
        let mut ops = operands.into_iter();

        match opcode {
            Opcode::FillScreen => Self::FillScreen { color: color(&text(&mut ops)) },
            Opcode::SetCursor => {
                let x = int(&text(&mut ops));
                let y = int(&text(&mut ops));
                Self::SetCursor { x, y }
            }
            Opcode::Write => Self::Write { text: text(&mut ops) },
            Opcode::Println => Self::Println { text: text(&mut ops) },
            Opcode::DrawPixel => {
                let x = int(&text(&mut ops));
                let y = int(&text(&mut ops));
                let color = color(&text(&mut ops));
                Self::DrawPixel { x, y, color }
            }
            Opcode::FillRect => {
                let x = int(&text(&mut ops));
                let y = int(&text(&mut ops));
                let w = int(&text(&mut ops));
                let h = int(&text(&mut ops));
                let color = color(&text(&mut ops));
                Self::FillRect { x, y, w, h, color }
            }
            Opcode::SetTextColor => Self::SetTextColor { color: color(&text(&mut ops)) },
            Opcode::SetTextSize => Self::SetTextSize { size: color(&text(&mut ops)) },
            Opcode::GetStorageKey => Self::GetStorageKey { key: text(&mut ops) },
            Opcode::SetStorageKey => {
                let key = text(&mut ops);
                let value = text(&mut ops);
                Self::SetStorageKey { key, value }
            }
            Opcode::AskText => {
                let question = text(&mut ops);
                let default = text(&mut ops);
                Self::AskText { question, default }
            }
            Opcode::AskOk => Self::AskOk { question: text(&mut ops) },
            Opcode::AskSelect => Self::AskSelect {
                options: ops.collect(),
            },
        }
    }

    /// The opcode this command was decoded from, if it was a known one.
    pub fn opcode(&self) -> Option<Opcode> {
        let op = match self {
            Self::FillScreen { .. } => Opcode::FillScreen,
            Self::SetCursor { .. } => Opcode::SetCursor,
            Self::Write { .. } => Opcode::Write,
            Self::Println { .. } => Opcode::Println,
            Self::DrawPixel { .. } => Opcode::DrawPixel,
            Self::FillRect { .. } => Opcode::FillRect,
            Self::SetTextColor { .. } => Opcode::SetTextColor,
            Self::SetTextSize { .. } => Opcode::SetTextSize,
            Self::GetStorageKey { .. } => Opcode::GetStorageKey,
            Self::SetStorageKey { .. } => Opcode::SetStorageKey,
            Self::AskText { .. } => Opcode::AskText,
            Self::AskOk { .. } => Opcode::AskOk,
            Self::AskSelect { .. } => Opcode::AskSelect,
            Self::Unknown { .. } => return None,
        };
        Some(op)
    }
}

fn text(ops: &mut impl Iterator<Item = String>) -> String {
    ops.next().unwrap_or_default()
}

fn int(raw: &str) -> i32 {
    lenient_int(raw) as i32
}

fn color(raw: &str) -> u16 {
    lenient_int(raw) as u16
}

/// Client-to-server messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Handshake sent right after the stream opens.
    Init,
    Click,
    LongClick,
    DoubleClick,
    /// Ask the server to redraw the screen.
    Rerender,
    /// Answer to `get-storage-key`.
    StorageValue(String),
    /// Answer to `ask-text`. Newlines are escaped on the wire.
    TextValue(String),
    /// Answer to `ask-ok`.
    OkValue(bool),
    /// Answer to `ask-select`; `None` is sent as `-1`.
    SelectValue(Option<usize>),
}

impl ClientMessage {
    /// The lines making up this message, without terminators.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Init => vec!["init".into()],
            Self::Click => vec!["click".into()],
            Self::LongClick => vec!["longclick".into()],
            Self::DoubleClick => vec!["dblclick".into()],
            Self::Rerender => vec!["rerender".into()],
            Self::StorageValue(value) => vec!["return-storage-key".into(), value.clone()],
            Self::TextValue(value) => vec!["ask-text-value".into(), escape_newlines(value)],
            Self::OkValue(yes) => vec![
                "ask-ok-value".into(),
                if *yes { "yes" } else { "no" }.into(),
            ],
            Self::SelectValue(choice) => vec![
                "ask-select-value".into(),
                choice.map_or_else(|| "-1".to_string(), |i| i.to_string()),
            ],
        }
    }
}
