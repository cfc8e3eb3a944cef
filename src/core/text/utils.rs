//! Grapheme and word-boundary helpers for line editing.

use unicode_segmentation::UnicodeSegmentation;

pub fn grapheme_segments(text: &str) -> unicode_segmentation::Graphemes<'_> {
    UnicodeSegmentation::graphemes(text, true)
}

pub fn is_whitespace_char(ch: char) -> bool {
    ch.is_whitespace()
}

pub fn is_punctuation_char(ch: char) -> bool {
    ch.is_ascii_punctuation()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentClass {
    Space,
    Punct,
    Word,
}

fn classify(segment: &str) -> SegmentClass {
    if segment.chars().any(is_whitespace_char) {
        SegmentClass::Space
    } else if segment.chars().any(is_punctuation_char) {
        SegmentClass::Punct
    } else {
        SegmentClass::Word
    }
}

/// Byte offset of the start of the word before `cursor`.
///
/// Skips whitespace, then one run of either punctuation or word characters.
pub fn previous_word_boundary(text: &str, cursor: usize) -> usize {
    let mut pos = cursor.min(text.len());
    let mut graphemes = grapheme_segments(&text[..pos]).rev().peekable();

    while let Some(seg) = graphemes.next_if(|seg| classify(seg) == SegmentClass::Space) {
        pos -= seg.len();
    }
    if let Some(class) = graphemes.peek().map(|seg| classify(seg)) {
        while let Some(seg) = graphemes.next_if(|seg| classify(seg) == class) {
            pos -= seg.len();
        }
    }
    pos
}

/// Byte offset just past the word after `cursor`.
pub fn next_word_boundary(text: &str, cursor: usize) -> usize {
    let mut pos = cursor.min(text.len());
    let mut graphemes = grapheme_segments(&text[pos..]).peekable();

    while let Some(seg) = graphemes.next_if(|seg| classify(seg) == SegmentClass::Space) {
        pos += seg.len();
    }
    if let Some(class) = graphemes.peek().map(|seg| classify(seg)) {
        while let Some(seg) = graphemes.next_if(|seg| classify(seg) == class) {
            pos += seg.len();
        }
    }
    pos
}

/// Byte length of the grapheme ending at `cursor`, or 0 at the start.
pub fn previous_grapheme_len(text: &str, cursor: usize) -> usize {
    grapheme_segments(&text[..cursor.min(text.len())])
        .next_back()
        .map_or(0, str::len)
}

/// Byte length of the grapheme starting at `cursor`, or 0 at the end.
pub fn next_grapheme_len(text: &str, cursor: usize) -> usize {
    grapheme_segments(&text[cursor.min(text.len())..])
        .next()
        .map_or(0, str::len)
}
