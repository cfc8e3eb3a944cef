//! Styled text values.

use std::ops::Add;
use std::sync::Arc;

use crate::core::style::Style;

use super::width::{char_width, str_width};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    text: String,
    style: Style,
    link: Option<Arc<str>>,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
            link: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Hyperlink target, painted as OSC 8 where supported.
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn width(&self) -> usize {
        str_width(&self.text)
    }

    fn same_attrs(&self, other: &StyledSpan) -> bool {
        self.style == other.style && self.link == other.link
    }

    pub(crate) fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: self.style,
            link: self.link.clone(),
        }
    }
}

/// An ordered sequence of styled spans.
///
/// Adjacent spans with identical style are coalesced; spans with different
/// styles never are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    spans: Vec<StyledSpan>,
}

impl RichText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, Style::new())
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Self::new().push(text, style)
    }

    pub fn link(text: impl Into<String>, style: Style, url: impl Into<Arc<str>>) -> Self {
        let mut out = Self::new();
        out.push_span(StyledSpan {
            text: text.into(),
            style,
            link: Some(url.into()),
        });
        out
    }

    pub fn from_spans<I: IntoIterator<Item = StyledSpan>>(spans: I) -> Self {
        let mut out = Self::new();
        for span in spans {
            out.push_span(span);
        }
        out
    }

    /// Appends styled text.
    pub fn push(mut self, text: impl Into<String>, style: Style) -> Self {
        self.push_span(StyledSpan::new(text, style));
        self
    }

    pub(crate) fn push_span(&mut self, span: StyledSpan) {
        if span.text.is_empty() {
            return;
        }
        if let Some(last) = self.spans.last_mut() {
            if last.same_attrs(&span) {
                last.text.push_str(&span.text);
                return;
            }
        }
        self.spans.push(span);
    }

    pub fn append(mut self, other: &RichText) -> Self {
        for span in &other.spans {
            self.push_span(span.clone());
        }
        self
    }

    pub fn concat<'a, I: IntoIterator<Item = &'a RichText>>(parts: I) -> Self {
        parts
            .into_iter()
            .fold(Self::new(), |acc, part| acc.append(part))
    }

    pub fn spans(&self) -> &[StyledSpan] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn width(&self) -> usize {
        self.spans.iter().map(StyledSpan::width).sum()
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    /// Returns a copy whose spans are merged over `base`; span fields still win.
    pub fn with_base_style(&self, base: Style) -> Self {
        Self::from_spans(self.spans.iter().map(|span| StyledSpan {
            text: span.text.clone(),
            style: base.merge(&span.style),
            link: span.link.clone(),
        }))
    }

    /// Splits on `\n`, keeping styles.
    pub fn lines(&self) -> Vec<RichText> {
        let mut lines = vec![RichText::new()];
        for span in &self.spans {
            let mut parts = span.text.split('\n');
            if let Some(first) = parts.next() {
                if let Some(line) = lines.last_mut() {
                    line.push_span(span.with_text(first));
                }
            }
            for part in parts {
                let mut line = RichText::new();
                line.push_span(span.with_text(part));
                lines.push(line);
            }
        }
        lines
    }

    /// Columns `[start, end)`.
    ///
    /// A wide character straddling either boundary is dropped rather than split;
    /// zero-width characters travel with the character they follow.
    pub fn slice_columns(&self, start: usize, end: usize) -> Self {
        let mut out = Self::new();
        if start >= end {
            return out;
        }
        let mut col = 0;
        let mut last_included = false;
        for span in &self.spans {
            let mut kept = String::new();
            for ch in span.text.chars() {
                let w = char_width(ch);
                let include = if w == 0 {
                    last_included
                } else {
                    col >= start && col + w <= end
                };
                if include {
                    kept.push(ch);
                }
                if w > 0 {
                    last_included = include;
                }
                col += w;
            }
            out.push_span(span.with_text(kept));
            if col > end {
                break;
            }
        }
        out
    }

    /// Cuts to at most `max_width` columns, ending with `ellipsis` when something was cut.
    pub fn truncate(&self, max_width: usize, ellipsis: &str) -> Self {
        if self.width() <= max_width {
            return self.clone();
        }
        let ellipsis_width = str_width(ellipsis);
        if ellipsis_width > max_width {
            return self.slice_columns(0, max_width);
        }
        let mut out = self.slice_columns(0, max_width - ellipsis_width);
        let marker_style = out
            .spans
            .last()
            .or_else(|| self.spans.first())
            .map(|span| span.with_text(ellipsis));
        if let Some(marker) = marker_style {
            out.push_span(marker);
        }
        out
    }

    /// Pads with plain spaces up to `width` columns.
    pub fn pad_to(&self, width: usize) -> Self {
        let current = self.width();
        if current >= width {
            return self.clone();
        }
        self.clone().push(" ".repeat(width - current), Style::new())
    }
}

impl From<&str> for RichText {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for RichText {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

impl Add for RichText {
    type Output = RichText;

    fn add(self, rhs: RichText) -> RichText {
        self.append(&rhs)
    }
}

impl Add<&RichText> for RichText {
    type Output = RichText;

    fn add(self, rhs: &RichText) -> RichText {
        self.append(rhs)
    }
}
