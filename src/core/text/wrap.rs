//! Greedy word wrapping for [`RichText`].
//!
//! Words may cross span boundaries; each fragment keeps its own style on
//! whichever line it lands. Whitespace inside a line is kept as written unless
//! `preserve_spaces` is off and the run falls on a line break, in which case it
//! is dropped.

use super::rich::{RichText, StyledSpan};
use super::width::char_width;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapOptions {
    pub width: usize,
    pub preserve_spaces: bool,
    pub preserve_newlines: bool,
    pub trim_with_ellipsis: bool,
    pub ellipsis: String,
    pub indent: RichText,
    pub continuation_indent: RichText,
}

impl WrapOptions {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            preserve_spaces: false,
            preserve_newlines: true,
            trim_with_ellipsis: false,
            ellipsis: "…".to_string(),
            indent: RichText::new(),
            continuation_indent: RichText::new(),
        }
    }

    pub fn preserve_spaces(mut self, yes: bool) -> Self {
        self.preserve_spaces = yes;
        self
    }

    pub fn preserve_newlines(mut self, yes: bool) -> Self {
        self.preserve_newlines = yes;
        self
    }

    pub fn trim_with_ellipsis(mut self, yes: bool) -> Self {
        self.trim_with_ellipsis = yes;
        self
    }

    pub fn ellipsis(mut self, marker: impl Into<String>) -> Self {
        self.ellipsis = marker.into();
        self
    }

    /// Prefix for the first line; continuation lines use it too unless
    /// [`WrapOptions::continuation_indent`] is set afterwards.
    pub fn indent(mut self, indent: impl Into<RichText>) -> Self {
        self.indent = indent.into();
        self.continuation_indent = self.indent.clone();
        self
    }

    pub fn continuation_indent(mut self, indent: impl Into<RichText>) -> Self {
        self.continuation_indent = indent.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Space,
    Newline,
}

struct Token {
    kind: TokenKind,
    pieces: Vec<StyledSpan>,
    width: usize,
}

fn classify(ch: char) -> TokenKind {
    if ch == '\n' {
        TokenKind::Newline
    } else if ch.is_whitespace() {
        TokenKind::Space
    } else {
        TokenKind::Word
    }
}

/// Splits text into words, whitespace runs, and newlines; a word may hold
/// fragments from several spans.
fn tokenize(text: &RichText) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    for span in text.spans() {
        let mut run = String::new();
        let mut run_kind = None;
        let flush = |run: &mut String, kind: Option<TokenKind>, tokens: &mut Vec<Token>| {
            let Some(kind) = kind else {
                return;
            };
            if run.is_empty() {
                return;
            }
            let piece = span.with_text(std::mem::take(run));
            let width = piece.width();
            match tokens.last_mut() {
                Some(last) if last.kind == kind && kind != TokenKind::Newline => {
                    last.width += width;
                    last.pieces.push(piece);
                }
                _ => tokens.push(Token {
                    kind,
                    pieces: vec![piece],
                    width,
                }),
            }
        };
        for ch in span.text().chars() {
            let kind = classify(ch);
            if Some(kind) != run_kind || kind == TokenKind::Newline {
                flush(&mut run, run_kind, &mut tokens);
                run_kind = Some(kind);
            }
            run.push(ch);
        }
        flush(&mut run, run_kind, &mut tokens);
    }
    tokens
}

struct LineBuilder<'a> {
    options: &'a WrapOptions,
    lines: Vec<RichText>,
    current: RichText,
    current_width: usize,
    /// Set when the current line exists because of a soft break.
    continuation: bool,
    pending_space: Vec<StyledSpan>,
    pending_width: usize,
}

impl<'a> LineBuilder<'a> {
    fn new(options: &'a WrapOptions) -> Self {
        Self {
            options,
            lines: Vec::new(),
            current: RichText::new(),
            current_width: 0,
            continuation: false,
            pending_space: Vec::new(),
            pending_width: 0,
        }
    }

    fn indent(&self) -> &RichText {
        if self.lines.is_empty() {
            &self.options.indent
        } else {
            &self.options.continuation_indent
        }
    }

    fn available(&self) -> usize {
        self.options
            .width
            .saturating_sub(self.indent().width())
            .max(1)
    }

    fn room(&self) -> usize {
        self.available().saturating_sub(self.current_width)
    }

    fn is_line_empty(&self) -> bool {
        self.current_width == 0
    }

    fn end_line(&mut self, soft: bool) {
        let line = self.indent().clone().append(&std::mem::take(&mut self.current));
        self.lines.push(line);
        self.current_width = 0;
        self.continuation = soft;
        self.pending_space.clear();
        self.pending_width = 0;
    }

    fn push_piece(&mut self, piece: StyledSpan) {
        self.current_width += piece.width();
        self.current.push_span(piece);
    }

    /// Width the pending whitespace would occupy if the next word joins this line.
    fn effective_pending(&self) -> usize {
        if self.is_line_empty() && self.continuation {
            0
        } else {
            self.pending_width
        }
    }

    fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending_space);
        self.pending_width = 0;
        if self.is_line_empty() && self.continuation {
            return;
        }
        for piece in pending {
            self.push_piece(piece);
        }
    }

    fn space(&mut self, token: Token) {
        if self.options.preserve_spaces {
            self.breakable(token.pieces);
        } else {
            self.pending_width += token.width;
            self.pending_space.extend(token.pieces);
        }
    }

    fn word(&mut self, token: Token) {
        let pending = self.effective_pending();
        if self.current_width + pending + token.width <= self.available() {
            self.flush_pending();
            for piece in token.pieces {
                self.push_piece(piece);
            }
            return;
        }

        if token.width <= self.available() {
            if !self.is_line_empty() {
                self.end_line(true);
            }
            self.pending_space.clear();
            self.pending_width = 0;
            for piece in token.pieces {
                self.push_piece(piece);
            }
            return;
        }

        if self.options.trim_with_ellipsis {
            if !self.is_line_empty() {
                self.end_line(true);
            }
            self.pending_space.clear();
            self.pending_width = 0;
            let word = RichText::from_spans(token.pieces);
            let cut = word.truncate(self.available(), &self.options.ellipsis);
            for piece in cut.spans() {
                self.push_piece(piece.clone());
            }
            return;
        }

        if self.room() <= pending {
            if !self.is_line_empty() {
                self.end_line(true);
            }
            self.pending_space.clear();
            self.pending_width = 0;
        } else {
            self.flush_pending();
        }
        self.breakable(token.pieces);
    }

    /// Places text character by character, breaking lines wherever it overflows.
    fn breakable(&mut self, pieces: Vec<StyledSpan>) {
        for piece in pieces {
            let mut chunk = String::new();
            let mut chunk_width = 0;
            for ch in piece.text().chars() {
                let w = char_width(ch);
                if w > 0 && self.current_width + chunk_width + w > self.available() {
                    if !chunk.is_empty() {
                        self.push_piece(piece.with_text(std::mem::take(&mut chunk)));
                        chunk_width = 0;
                    }
                    if !self.is_line_empty() {
                        self.end_line(true);
                    }
                }
                chunk.push(ch);
                chunk_width += w;
            }
            if !chunk.is_empty() {
                self.push_piece(piece.with_text(chunk));
            }
        }
    }

    fn newline(&mut self) {
        self.end_line(false);
    }

    fn finish(mut self) -> Vec<RichText> {
        if self.pending_width > 0 && self.effective_pending() <= self.room() {
            self.flush_pending();
        }
        let has_content = !self.is_line_empty() || self.lines.is_empty() || !self.continuation;
        if has_content {
            self.end_line(false);
        }
        self.lines
    }
}

impl RichText {
    pub fn wrap(&self, options: &WrapOptions) -> Vec<RichText> {
        let mut builder = LineBuilder::new(options);
        for token in tokenize(self) {
            match token.kind {
                TokenKind::Newline if options.preserve_newlines => builder.newline(),
                TokenKind::Newline => builder.space(Token {
                    kind: TokenKind::Space,
                    width: 1,
                    pieces: token
                        .pieces
                        .iter()
                        .map(|piece| piece.with_text(" "))
                        .collect(),
                }),
                TokenKind::Space => builder.space(token),
                TokenKind::Word => builder.word(token),
            }
        }
        builder.finish()
    }

    /// Shorthand for the three common wrap knobs.
    pub fn wrap_to(
        &self,
        max_width: usize,
        preserve_spaces: bool,
        trim_with_ellipsis: bool,
    ) -> Vec<RichText> {
        self.wrap(
            &WrapOptions::new(max_width)
                .preserve_spaces(preserve_spaces)
                .trim_with_ellipsis(trim_with_ellipsis),
        )
    }
}

/// Width of the widest line.
pub fn max_line_width(lines: &[RichText]) -> usize {
    lines.iter().map(RichText::width).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::WrapOptions;
    use crate::core::style::{Color, Style};
    use crate::core::text::rich::RichText;
    use proptest::prelude::*;

    fn texts(lines: &[RichText]) -> Vec<String> {
        lines.iter().map(RichText::plain_text).collect()
    }

    #[test]
    fn packs_words_greedily() {
        let text = RichText::plain("the quick brown fox jumps");
        assert_eq!(
            texts(&text.wrap_to(10, false, false)),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn inner_whitespace_survives_but_breaks_drop_it() {
        let text = RichText::plain("a   b      c");
        assert_eq!(texts(&text.wrap_to(6, false, false)), vec!["a   b", "c"]);
    }

    #[test]
    fn preserved_spaces_are_carried_across_breaks() {
        let text = RichText::plain("ab    cd");
        assert_eq!(texts(&text.wrap_to(4, true, false)), vec!["ab  ", "  cd"]);
    }

    #[test]
    fn long_words_are_hard_split() {
        let text = RichText::plain("abcdefghij");
        assert_eq!(
            texts(&text.wrap_to(4, false, false)),
            vec!["abcd", "efgh", "ij"]
        );
    }

    #[test]
    fn long_words_fill_the_current_line_first() {
        let text = RichText::plain("ab cdefgh");
        assert_eq!(texts(&text.wrap_to(5, false, false)), vec!["ab cd", "efgh"]);
    }

    #[test]
    fn long_words_are_trimmed_with_ellipsis() {
        let text = RichText::plain("hi supercalifragilistic");
        let lines = text.wrap_to(8, false, true);
        assert_eq!(texts(&lines), vec!["hi", "superca…"]);
        assert!(lines.iter().all(|line| line.width() <= 8));
    }

    #[test]
    fn styles_survive_across_breaks() {
        let red = Style::new().fg(Color::Ansi(1));
        let text = RichText::plain("one ") + RichText::styled("two three", red);
        let lines = text.wrap_to(7, false, false);
        assert_eq!(texts(&lines), vec!["one two", "three"]);
        assert_eq!(lines[0].spans()[1].style(), red);
        assert_eq!(lines[1].spans()[0].style(), red);
    }

    #[test]
    fn words_spanning_styles_stay_together() {
        let red = Style::new().fg(Color::Ansi(1));
        let text = RichText::plain("aaaa bb") + RichText::styled("cc", red);
        let lines = text.wrap_to(5, false, false);
        assert_eq!(texts(&lines), vec!["aaaa", "bbcc"]);
        assert_eq!(lines[1].spans().len(), 2);
    }

    #[test]
    fn explicit_newlines_keep_leading_indentation() {
        let text = RichText::plain("list:\n  - item");
        assert_eq!(
            texts(&text.wrap_to(20, false, false)),
            vec!["list:", "  - item"]
        );
    }

    #[test]
    fn newlines_become_spaces_when_not_preserved() {
        let text = RichText::plain("a\nb");
        let lines = text.wrap(&WrapOptions::new(10).preserve_newlines(false));
        assert_eq!(texts(&lines), vec!["a b"]);
    }

    #[test]
    fn indents_are_applied_per_line() {
        let text = RichText::plain("alpha beta gamma");
        let options = WrapOptions::new(8).indent("* ").continuation_indent("  ");
        assert_eq!(
            texts(&text.wrap(&options)),
            vec!["* alpha", "  beta", "  gamma"]
        );
    }

    #[test]
    fn wide_characters_wrap_by_columns() {
        let text = RichText::plain("日本語テキスト");
        let lines = text.wrap_to(5, false, false);
        assert_eq!(texts(&lines), vec!["日本", "語テ", "キス", "ト"]);
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        let lines = RichText::new().wrap_to(10, false, false);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_empty());
    }

    proptest! {
        #[test]
        fn lines_never_exceed_width(
            words in proptest::collection::vec("[a-z日]{1,12}", 0..12),
            width in 2usize..16,
            trim in any::<bool>(),
        ) {
            let text = RichText::plain(words.join(" "));
            let lines = text.wrap_to(width, false, trim);
            for line in &lines {
                prop_assert!(line.width() <= width, "{:?} exceeds {}", line.plain_text(), width);
            }
        }

        #[test]
        fn lines_break_only_when_the_next_word_does_not_fit(
            words in proptest::collection::vec("[a-z]{1,10}", 1..12),
            width in 1usize..16,
        ) {
            let text = RichText::plain(words.join(" "));
            let lines = text.wrap_to(width, false, false);
            let mut early_breaks = 0;
            for pair in lines.windows(2) {
                let used = pair[0].width();
                if used == width {
                    continue;
                }
                early_breaks += 1;
                let next = pair[1].plain_text();
                let next_word = next.split(' ').next().unwrap_or("").chars().count();
                prop_assert!(
                    used + 1 + next_word > width,
                    "{:?} broke before {:?} at width {}",
                    pair[0].plain_text(),
                    next,
                    width
                );
            }
            // Every line but the early-broken ones and the last is full.
            prop_assert!(lines.len() <= text.width().div_ceil(width) + early_breaks);
        }

        #[test]
        fn wrapping_loses_no_visible_characters(
            words in proptest::collection::vec("[a-z]{1,10}", 1..12),
            width in 1usize..16,
        ) {
            let text = RichText::plain(words.join(" "));
            let joined: String = text
                .wrap_to(width, false, false)
                .iter()
                .map(|line| line.plain_text().replace(' ', ""))
                .collect();
            prop_assert_eq!(joined, words.concat());
        }
    }
}
