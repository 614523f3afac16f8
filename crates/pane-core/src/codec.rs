//! Newline-delimited framing for the pane protocol.
//!
//! Server frames: an opcode line, then the operand lines declared by the
//! opcode table. Lines end at `\n`. There is no length prefix and no escaping.
//!
//! Client frames: the message lines joined by `\n`, terminated by `\r\n`.

use tracing::trace;

use crate::messages::{Arity, ClientMessage, Opcode, ServerCommand};

/// Terminator written after every outgoing message.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Encode a client message into its on-the-wire bytes.
pub fn encode_message(msg: &ClientMessage) -> Vec<u8> {
    let mut out = msg.lines().join("\n");
    out.push_str(LINE_TERMINATOR);
    out.into_bytes()
}

/// Replace literal newlines with the two-character sequence `\n`.
pub fn escape_newlines(value: &str) -> String {
    value.replace('\n', "\\n")
}

/// Parse an integer the way C's `atol` does.
///
/// Leading whitespace is skipped, an optional sign is accepted, and the
/// longest run of decimal digits is used. No digits yields 0. Values past
/// the `i64` range saturate.
pub fn lenient_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(d)
        } else {
            value.saturating_add(d)
        };
    }
    value
}

/// Streaming frame decoder: accumulates bytes and yields complete commands.
///
/// A frame is only produced once its opcode line and every operand line
/// have arrived, so a half-received frame stays buffered across reads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Append raw bytes without decoding.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Feed bytes into the decoder and return all complete commands.
    pub fn feed(&mut self, data: &[u8]) -> Vec<ServerCommand> {
        self.extend(data);
        let mut commands = Vec::new();
        while let Some(cmd) = self.next_frame() {
            commands.push(cmd);
        }
        commands
    }

    /// Pop the next complete frame, leaving partial input untouched.
    pub fn next_frame(&mut self) -> Option<ServerCommand> {
        let mut lines = LineCursor::new(&self.buffer);

        let head = lines.next_line()?;
        let token = head.strip_suffix('\r').unwrap_or(head.as_str()).to_string();

        let cmd = match Opcode::from_token(&token) {
            None => ServerCommand::Unknown { token },
            Some(opcode) => {
                let operands = match opcode.arity() {
                    Arity::Fixed(n) => {
                        let mut operands = Vec::with_capacity(n);
                        for _ in 0..n {
                            operands.push(lines.next_line()?);
                        }
                        operands
                    }
                    Arity::UntilSentinel { sentinel, max } => {
                        let mut operands = Vec::new();
                        while operands.len() < max {
                            let line = lines.next_line()?;
                            if line == sentinel {
                                break;
                            }
                            operands.push(line);
                        }
                        operands
                    }
                };
                ServerCommand::from_operands(opcode, operands)
            }
        };

        let consumed = lines.offset;
        self.buffer.drain(..consumed);
        trace!(consumed, pending = self.buffer.len(), "decoded frame");
        Some(cmd)
    }

    /// Reset internal buffer.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Number of bytes remaining in the internal buffer.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Walks complete `\n`-terminated lines of a byte buffer.
struct LineCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> LineCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// The next complete line without its `\n`, or `None` if it has not fully arrived.
    fn next_line(&mut self) -> Option<String> {
        let rest = &self.data[self.offset..];
        let end = rest.iter().position(|&b| b == b'\n')?;
        let line = String::from_utf8_lossy(&rest[..end]).into_owned();
        self.offset += end + 1;
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Arity, MAX_SELECT_OPTIONS, OPCODE_TABLE, OPTIONS_END};

    #[test]
    fn lenient_ints() {
        assert_eq!(lenient_int("42"), 42);
        assert_eq!(lenient_int("  -17"), -17);
        assert_eq!(lenient_int("+8"), 8);
        assert_eq!(lenient_int("12abc"), 12);
        assert_eq!(lenient_int("abc"), 0);
        assert_eq!(lenient_int(""), 0);
        assert_eq!(lenient_int("-"), 0);
        assert_eq!(lenient_int("99\r"), 99);
        assert_eq!(lenient_int("99999999999999999999999"), i64::MAX);
    }

    #[test]
    fn encodes_with_crlf_terminator() {
        assert_eq!(encode_message(&ClientMessage::Init), b"init\r\n");
        assert_eq!(
            encode_message(&ClientMessage::StorageValue("-1".into())),
            b"return-storage-key\n-1\r\n"
        );
        assert_eq!(
            encode_message(&ClientMessage::TextValue("line1\nline2".into())),
            b"ask-text-value\nline1\\nline2\r\n"
        );
    }

    #[test]
    fn fixed_arity_consumes_exact_operands() {
        let mut decoder = FrameDecoder::new();
        let cmds = decoder.feed(b"setCursor\n\n\nwrite\n\nfillRect\n1\n2\n3\n4\n5\n");
        assert_eq!(
            cmds,
            vec![
                ServerCommand::SetCursor { x: 0, y: 0 },
                ServerCommand::Write { text: String::new() },
                ServerCommand::FillRect {
                    x: 1,
                    y: 2,
                    w: 3,
                    h: 4,
                    color: 5
                },
            ]
        );
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn every_opcode_takes_its_operands_even_when_empty() {
        for row in &OPCODE_TABLE {
            let mut wire = format!("{}\n", row.token);
            match row.arity {
                Arity::Fixed(n) => wire.push_str(&"\n".repeat(n)),
                Arity::UntilSentinel { sentinel, .. } => wire.push_str(&format!("\n\n{sentinel}\n")),
            }
            wire.push_str("println\nsentinel\n");

            let mut decoder = FrameDecoder::new();
            let cmds = decoder.feed(wire.as_bytes());
            assert_eq!(cmds.len(), 2, "{}: {cmds:?}", row.token);
            assert_eq!(cmds[0].opcode(), Some(row.opcode), "{}", row.token);
            assert_eq!(
                cmds[1],
                ServerCommand::Println {
                    text: "sentinel".into()
                },
                "{}",
                row.token
            );
            assert_eq!(decoder.pending(), 0, "{}", row.token);
        }
    }

    #[test]
    fn operands_that_look_like_opcodes_are_data() {
        let mut decoder = FrameDecoder::new();
        let cmds = decoder.feed(b"set-storage-key\nwrite\nprintln\nprintln\nhi\n");
        assert_eq!(
            cmds,
            vec![
                ServerCommand::SetStorageKey {
                    key: "write".into(),
                    value: "println".into()
                },
                ServerCommand::Println { text: "hi".into() },
            ]
        );
    }

    #[test]
    fn partial_frame_stays_buffered() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"drawPixel\n3\n").is_empty());
        assert_eq!(decoder.pending(), "drawPixel\n3\n".len());

        assert!(decoder.feed(b"4\n65").is_empty());
        let cmds = decoder.feed(b"535\n");
        assert_eq!(
            cmds,
            vec![ServerCommand::DrawPixel {
                x: 3,
                y: 4,
                color: 65535
            }]
        );
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn opcode_line_tolerates_carriage_return() {
        let mut decoder = FrameDecoder::new();
        let cmds = decoder.feed(b"println\r\nhello\r\n");
        assert_eq!(
            cmds,
            vec![ServerCommand::Println {
                text: "hello\r".into()
            }]
        );
    }

    #[test]
    fn ask_select_stops_at_sentinel() {
        let mut decoder = FrameDecoder::new();
        let cmds = decoder.feed(b"ask-select\nred\n\nblue\n::OPTIONS_END::\nwrite\nx\n");
        assert_eq!(
            cmds,
            vec![
                ServerCommand::AskSelect {
                    options: vec!["red".into(), String::new(), "blue".into()]
                },
                ServerCommand::Write { text: "x".into() },
            ]
        );
    }

    #[test]
    fn ask_select_waits_for_sentinel() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"ask-select\na\nb\n").is_empty());
        let cmds = decoder.feed(format!("{OPTIONS_END}\n").as_bytes());
        assert_eq!(
            cmds,
            vec![ServerCommand::AskSelect {
                options: vec!["a".into(), "b".into()]
            }]
        );
    }

    #[test]
    fn ask_select_caps_option_count() {
        let mut wire = String::from("ask-select\n");
        for i in 0..MAX_SELECT_OPTIONS + 1 {
            wire.push_str(&format!("opt{i}\n"));
        }
        wire.push_str(OPTIONS_END);
        wire.push('\n');

        let mut decoder = FrameDecoder::new();
        let cmds = decoder.feed(wire.as_bytes());
        match &cmds[0] {
            ServerCommand::AskSelect { options } => {
                assert_eq!(options.len(), MAX_SELECT_OPTIONS);
                assert_eq!(options[249], "opt249");
            }
            other => panic!("expected ask-select, got {other:?}"),
        }
        // The overflow option and the sentinel fall out as unknown opcodes.
        assert_eq!(
            cmds[1..],
            [
                ServerCommand::Unknown {
                    token: "opt250".into()
                },
                ServerCommand::Unknown {
                    token: OPTIONS_END.into()
                },
            ]
        );
    }

    #[test]
    fn unknown_opcode_skips_one_line() {
        let mut decoder = FrameDecoder::new();
        let cmds = decoder.feed(b"drawCircle\nsetTextSize\n3\n");
        assert_eq!(
            cmds,
            vec![
                ServerCommand::Unknown {
                    token: "drawCircle".into()
                },
                ServerCommand::SetTextSize { size: 3 },
            ]
        );
    }

    #[test]
    fn reset_discards_partial_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(b"fillScreen\n");
        assert_eq!(decoder.next_frame(), None);
        decoder.reset();
        assert_eq!(decoder.pending(), 0);
        assert_eq!(
            decoder.feed(b"fillScreen\n31\n"),
            vec![ServerCommand::FillScreen { color: 31 }]
        );
    }
}
