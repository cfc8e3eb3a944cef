//! Keyboard input events and escape-sequence decoding.

use std::collections::HashMap;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyEvent {
    pub const fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
        }
    }

    pub const fn ctrl(key: Key) -> Self {
        Self {
            key,
            ctrl: true,
            alt: false,
        }
    }

    pub const fn alt(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            alt: true,
        }
    }

    /// Printable character typed without modifiers.
    pub fn text(&self) -> Option<char> {
        match self.key {
            Key::Char(ch) if !self.ctrl && !self.alt => Some(ch),
            _ => None,
        }
    }

    pub fn is_ctrl(&self, ch: char) -> bool {
        self.ctrl && !self.alt && self.key == Key::Char(ch)
    }

    pub fn is_alt(&self, ch: char) -> bool {
        self.alt && !self.ctrl && self.key == Key::Char(ch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Paste(String),
    /// Ctrl-C, or SIGINT while the terminal is in cooked mode.
    Interrupt,
    Resize { columns: u16, rows: u16 },
    /// A complete escape sequence nothing recognizes.
    Unknown(String),
}

impl InputEvent {
    pub fn key(key: Key) -> Self {
        Self::Key(KeyEvent::plain(key))
    }
}

static ESCAPE_KEYS: Lazy<HashMap<&'static str, KeyEvent>> = Lazy::new(|| {
    use Key::*;

    let mut map = HashMap::new();
    let plain = [
        ("\x1b[A", Up),
        ("\x1b[B", Down),
        ("\x1b[C", Right),
        ("\x1b[D", Left),
        ("\x1bOA", Up),
        ("\x1bOB", Down),
        ("\x1bOC", Right),
        ("\x1bOD", Left),
        ("\x1b[H", Home),
        ("\x1bOH", Home),
        ("\x1b[1~", Home),
        ("\x1b[7~", Home),
        ("\x1b[F", End),
        ("\x1bOF", End),
        ("\x1b[4~", End),
        ("\x1b[8~", End),
        ("\x1b[3~", Delete),
        ("\x1b[5~", PageUp),
        ("\x1b[6~", PageDown),
        ("\x1b[Z", BackTab),
        ("\x1bOM", Enter),
    ];
    for (seq, key) in plain {
        map.insert(seq, KeyEvent::plain(key));
    }
    let modified = [
        ("\x1b[1;5A", KeyEvent::ctrl(Up)),
        ("\x1b[1;5B", KeyEvent::ctrl(Down)),
        ("\x1b[1;5C", KeyEvent::ctrl(Right)),
        ("\x1b[1;5D", KeyEvent::ctrl(Left)),
        ("\x1b[1;3A", KeyEvent::alt(Up)),
        ("\x1b[1;3B", KeyEvent::alt(Down)),
        ("\x1b[1;3C", KeyEvent::alt(Right)),
        ("\x1b[1;3D", KeyEvent::alt(Left)),
        ("\x1b[3;5~", KeyEvent::ctrl(Delete)),
        ("\x1b\x7f", KeyEvent::alt(Backspace)),
        ("\x1b\r", KeyEvent::alt(Enter)),
    ];
    for (seq, event) in modified {
        map.insert(seq, event);
    }
    map
});

/// Decodes one complete sequence as produced by the input decoder.
pub fn parse_sequence(seq: &str) -> InputEvent {
    if let Some(event) = ESCAPE_KEYS.get(seq) {
        return InputEvent::Key(*event);
    }

    let mut chars = seq.chars();
    let (Some(first), rest) = (chars.next(), chars.as_str()) else {
        return InputEvent::Unknown(String::new());
    };

    if first == '\x1b' {
        if rest.is_empty() {
            return InputEvent::key(Key::Escape);
        }
        let mut tail = rest.chars();
        if let (Some(ch), None) = (tail.next(), tail.next()) {
            return match parse_single(ch) {
                InputEvent::Key(event) => InputEvent::Key(KeyEvent { alt: true, ..event }),
                other => other,
            };
        }
        return InputEvent::Unknown(seq.to_string());
    }

    if rest.is_empty() {
        return parse_single(first);
    }
    InputEvent::Unknown(seq.to_string())
}

fn parse_single(ch: char) -> InputEvent {
    match ch {
        '\x03' => InputEvent::Interrupt,
        '\r' | '\n' => InputEvent::key(Key::Enter),
        '\t' => InputEvent::key(Key::Tab),
        '\x7f' | '\x08' => InputEvent::key(Key::Backspace),
        '\x1b' => InputEvent::key(Key::Escape),
        '\x00' => InputEvent::Key(KeyEvent::ctrl(Key::Char(' '))),
        '\x01'..='\x1a' => {
            let letter = char::from(b'a' + (ch as u8 - 1));
            InputEvent::Key(KeyEvent::ctrl(Key::Char(letter)))
        }
        ch if ch.is_control() => InputEvent::Unknown(ch.to_string()),
        ch => InputEvent::key(Key::Char(ch)),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_sequence, InputEvent, Key, KeyEvent};

    #[test]
    fn control_bytes() {
        assert_eq!(parse_sequence("\x03"), InputEvent::Interrupt);
        assert_eq!(parse_sequence("\r"), InputEvent::key(Key::Enter));
        assert_eq!(parse_sequence("\x7f"), InputEvent::key(Key::Backspace));
        assert_eq!(
            parse_sequence("\x17"),
            InputEvent::Key(KeyEvent::ctrl(Key::Char('w')))
        );
    }

    #[test]
    fn escape_sequences() {
        assert_eq!(parse_sequence("\x1b[A"), InputEvent::key(Key::Up));
        assert_eq!(parse_sequence("\x1bOD"), InputEvent::key(Key::Left));
        assert_eq!(parse_sequence("\x1b[3~"), InputEvent::key(Key::Delete));
        assert_eq!(
            parse_sequence("\x1b[1;5C"),
            InputEvent::Key(KeyEvent::ctrl(Key::Right))
        );
        assert_eq!(parse_sequence("\x1b"), InputEvent::key(Key::Escape));
    }

    #[test]
    fn alt_prefixed_characters() {
        assert_eq!(
            parse_sequence("\x1bb"),
            InputEvent::Key(KeyEvent::alt(Key::Char('b')))
        );
        assert!(matches!(parse_sequence("\x1bb"), InputEvent::Key(k) if k.is_alt('b')));
    }

    #[test]
    fn printable_and_unknown() {
        assert_eq!(parse_sequence("é"), InputEvent::key(Key::Char('é')));
        assert_eq!(
            parse_sequence("\x1b[99~"),
            InputEvent::Unknown("\x1b[99~".to_string())
        );
    }
}
