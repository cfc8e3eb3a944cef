//! Escape-sequence scanning for already-painted strings.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    Csi,
    Osc,
    Ss3,
    /// DCS and APC strings; terminated like OSC.
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeSpan {
    pub len: usize,
    pub kind: EscapeKind,
}

/// Returns the escape sequence starting at byte offset `pos`, if a complete one is there.
pub fn escape_at(input: &str, pos: usize) -> Option<EscapeSpan> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&0x1b) {
        return None;
    }
    match *bytes.get(pos + 1)? {
        b'[' => {
            let end = bytes[pos + 2..]
                .iter()
                .position(|b| (0x40..=0x7e).contains(b))?;
            Some(EscapeSpan {
                len: end + 3,
                kind: EscapeKind::Csi,
            })
        }
        b']' => string_terminated(bytes, pos, EscapeKind::Osc),
        b'P' | b'_' => string_terminated(bytes, pos, EscapeKind::String),
        b'O' if pos + 2 < bytes.len() => Some(EscapeSpan {
            len: 3,
            kind: EscapeKind::Ss3,
        }),
        _ => None,
    }
}

fn string_terminated(bytes: &[u8], pos: usize, kind: EscapeKind) -> Option<EscapeSpan> {
    let mut idx = pos + 2;
    while idx < bytes.len() {
        if bytes[idx] == 0x07 {
            return Some(EscapeSpan {
                len: idx + 1 - pos,
                kind,
            });
        }
        if bytes[idx] == 0x1b && bytes.get(idx + 1) == Some(&b'\\') {
            return Some(EscapeSpan {
                len: idx + 2 - pos,
                kind,
            });
        }
        idx += 1;
    }
    None
}

/// Removes every complete escape sequence from `input`.
pub fn strip_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(span) = escape_at(input, idx) {
            idx += span.len;
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        out.push(ch);
        idx += ch.len_utf8();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{escape_at, strip_escapes, EscapeKind};

    #[test]
    fn csi_sequence_length_includes_final_byte() {
        let span = escape_at("\x1b[38;5;12mX", 0).expect("csi");
        assert_eq!(span.kind, EscapeKind::Csi);
        assert_eq!(span.len, 10);
    }

    #[test]
    fn osc_accepts_bell_and_st_terminators() {
        assert_eq!(escape_at("\x1b]8;;x\x07", 0).map(|s| s.len), Some(7));
        assert_eq!(escape_at("\x1b]8;;x\x1b\\", 0).map(|s| s.len), Some(8));
    }

    #[test]
    fn incomplete_sequences_are_not_escapes() {
        assert_eq!(escape_at("\x1b[12", 0), None);
        assert_eq!(escape_at("\x1b", 0), None);
    }

    #[test]
    fn strip_keeps_plain_text() {
        assert_eq!(strip_escapes("a\x1b[1mb\x1b[0mc"), "abc");
    }
}
