//! Turns raw stdin chunks into [`InputEvent`]s.
//!
//! Escape sequences can arrive split across reads. Incomplete tails stay
//! buffered until either the rest arrives or the flush deadline passes, at
//! which point they are emitted verbatim (a lone ESC becomes the Escape key).

use std::time::{Duration, Instant};

use crate::core::input::{parse_sequence, InputEvent};

const ESC: u8 = 0x1b;
const PASTE_START: &str = "\x1b[200~";
const PASTE_END: &str = "\x1b[201~";

#[derive(Debug, PartialEq, Eq)]
enum SequenceStatus {
    Complete,
    Incomplete,
}

#[derive(Debug)]
pub struct InputDecoder {
    buffer: String,
    timeout: Duration,
    paste: Option<String>,
    flush_deadline: Option<Instant>,
}

impl Default for InputDecoder {
    fn default() -> Self {
        Self::new(Duration::from_millis(10))
    }
}

impl InputDecoder {
    pub fn new(timeout: Duration) -> Self {
        Self {
            buffer: String::new(),
            timeout,
            paste: None,
            flush_deadline: None,
        }
    }

    pub fn process(&mut self, data: &[u8]) -> Vec<InputEvent> {
        self.flush_deadline = None;
        let text = String::from_utf8_lossy(data);
        let mut events = Vec::new();
        self.process_str(&text, &mut events);
        events
    }

    /// Emits buffered bytes once the deadline has passed.
    pub fn flush_due(&mut self, now: Instant) -> Vec<InputEvent> {
        match self.flush_deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => Vec::new(),
        }
    }

    pub fn flush(&mut self) -> Vec<InputEvent> {
        self.flush_deadline = None;
        if self.buffer.is_empty() {
            return Vec::new();
        }
        let pending = std::mem::take(&mut self.buffer);
        vec![parse_sequence(&pending)]
    }

    /// Poll timeout that respects a pending flush deadline.
    pub fn next_timeout_ms(&self, now: Instant, default_ms: i32) -> i32 {
        match self.flush_deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(now).as_millis();
                (remaining.min(i32::MAX as u128) as i32).min(default_ms).max(0)
            }
            None => default_ms,
        }
    }

    fn process_str(&mut self, data: &str, events: &mut Vec<InputEvent>) {
        if let Some(paste) = self.paste.as_mut() {
            paste.push_str(data);
            if let Some(end) = paste.find(PASTE_END) {
                let rest = paste[end + PASTE_END.len()..].to_string();
                paste.truncate(end);
                if let Some(content) = self.paste.take() {
                    events.push(InputEvent::Paste(content));
                }
                if !rest.is_empty() {
                    self.process_str(&rest, events);
                }
            }
            return;
        }

        self.buffer.push_str(data);
        if let Some(start) = self.buffer.find(PASTE_START) {
            let before = self.buffer[..start].to_string();
            let after = self.buffer[start + PASTE_START.len()..].to_string();
            self.buffer.clear();
            let (sequences, remainder) = split_sequences(&before);
            events.extend(sequences.iter().map(|seq| parse_sequence(seq)));
            if !remainder.is_empty() {
                events.push(parse_sequence(&remainder));
            }
            self.paste = Some(String::new());
            self.process_str(&after, events);
            return;
        }

        let (sequences, remainder) = split_sequences(&self.buffer);
        self.buffer = remainder;
        events.extend(sequences.iter().map(|seq| parse_sequence(seq)));
        if !self.buffer.is_empty() {
            self.flush_deadline = Some(Instant::now() + self.timeout);
        }
    }
}

/// Splits `buffer` into complete sequences plus an incomplete escape tail.
fn split_sequences(buffer: &str) -> (Vec<String>, String) {
    let mut sequences = Vec::new();
    let bytes = buffer.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] != ESC {
            let Some(ch) = buffer[pos..].chars().next() else {
                break;
            };
            sequences.push(ch.to_string());
            pos += ch.len_utf8();
            continue;
        }

        let mut end = pos + 1;
        loop {
            if end > bytes.len() {
                return (sequences, buffer[pos..].to_string());
            }
            if !buffer.is_char_boundary(end) {
                end += 1;
                continue;
            }
            if sequence_status(&buffer[pos..end]) == SequenceStatus::Complete {
                sequences.push(buffer[pos..end].to_string());
                pos = end;
                break;
            }
            end += 1;
        }
    }
    (sequences, String::new())
}

fn sequence_status(seq: &str) -> SequenceStatus {
    let bytes = seq.as_bytes();
    if bytes.len() < 2 {
        return SequenceStatus::Incomplete;
    }
    let terminated_string = |seq: &str| {
        if seq.ends_with('\x07') || seq.ends_with("\x1b\\") {
            SequenceStatus::Complete
        } else {
            SequenceStatus::Incomplete
        }
    };
    match bytes[1] {
        b'[' => {
            if bytes.len() < 3 {
                return SequenceStatus::Incomplete;
            }
            if (0x40..=0x7e).contains(&bytes[bytes.len() - 1]) {
                SequenceStatus::Complete
            } else {
                SequenceStatus::Incomplete
            }
        }
        b'O' => {
            if bytes.len() >= 3 {
                SequenceStatus::Complete
            } else {
                SequenceStatus::Incomplete
            }
        }
        b']' | b'P' | b'_' => terminated_string(seq),
        _ => SequenceStatus::Complete,
    }
}

#[cfg(test)]
mod tests {
    use super::InputDecoder;
    use crate::core::input::{InputEvent, Key, KeyEvent};
    use std::time::{Duration, Instant};

    #[test]
    fn splits_partial_sequences() {
        let mut decoder = InputDecoder::default();
        assert!(decoder.process(b"\x1b").is_empty());
        assert!(decoder.process(b"[").is_empty());
        assert_eq!(decoder.process(b"A"), vec![InputEvent::key(Key::Up)]);
    }

    #[test]
    fn lone_escape_flushes_after_timeout() {
        let mut decoder = InputDecoder::new(Duration::from_millis(10));
        assert!(decoder.process(b"\x1b").is_empty());
        assert!(decoder.flush_due(Instant::now()).is_empty());
        assert_eq!(
            decoder.flush_due(Instant::now() + Duration::from_millis(20)),
            vec![InputEvent::key(Key::Escape)]
        );
        assert!(decoder
            .flush_due(Instant::now() + Duration::from_millis(40))
            .is_empty());
    }

    #[test]
    fn mixed_chunk_preserves_order() {
        let mut decoder = InputDecoder::default();
        let events = decoder.process("a\x1b[Bé\x03".as_bytes());
        assert_eq!(
            events,
            vec![
                InputEvent::key(Key::Char('a')),
                InputEvent::key(Key::Down),
                InputEvent::key(Key::Char('é')),
                InputEvent::Interrupt,
            ]
        );
    }

    #[test]
    fn bracketed_paste_across_chunks() {
        let mut decoder = InputDecoder::default();
        let mut events = decoder.process(b"x\x1b[200~hel");
        events.extend(decoder.process(b"lo\nworld\x1b[201~\x1bb"));
        assert_eq!(
            events,
            vec![
                InputEvent::key(Key::Char('x')),
                InputEvent::Paste("hello\nworld".to_string()),
                InputEvent::Key(KeyEvent::alt(Key::Char('b'))),
            ]
        );
    }

    #[test]
    fn timeout_tracks_pending_deadline() {
        let mut decoder = InputDecoder::new(Duration::from_millis(25));
        let now = Instant::now();
        assert_eq!(decoder.next_timeout_ms(now, 77), 77);
        decoder.process(b"\x1b[");
        assert!(decoder.next_timeout_ms(now, 1000) <= 25);
    }
}
