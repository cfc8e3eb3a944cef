//! Terminal column widths.
//!
//! Width is additive per codepoint: combining marks and zero-width characters
//! count 0, east-asian wide and fullwidth characters count 2, everything else
//! counts 1. Control characters count 1 because the painter replaces them with
//! a visible placeholder.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::escape_at;

pub fn char_width(ch: char) -> usize {
    if ch.is_control() {
        return 1;
    }
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn str_width(text: &str) -> usize {
    if text.is_ascii() {
        return text.len();
    }
    text.chars().map(char_width).sum()
}

/// Width of a grapheme cluster, consistent with [`str_width`].
pub fn grapheme_width(grapheme: &str) -> usize {
    str_width(grapheme)
}

/// Iterates grapheme clusters paired with their widths.
pub fn graphemes_with_width(text: &str) -> impl Iterator<Item = (&str, usize)> {
    text.graphemes(true).map(|g| (g, grapheme_width(g)))
}

/// Width of a string that may contain escape sequences.
pub fn visible_width(input: &str) -> usize {
    let mut width = 0;
    let mut idx = 0;
    while idx < input.len() {
        if let Some(span) = escape_at(input, idx) {
            idx += span.len;
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        width += char_width(ch);
        idx += ch.len_utf8();
    }
    width
}
