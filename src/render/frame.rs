//! Render-layer frame type.

use crate::core::cursor::CursorPos;
use crate::core::text::rich::RichText;

/// Lines a widget tree produced for one redraw, plus where the cursor should rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<RichText>,
    cursor: Option<CursorPos>,
}

impl Frame {
    pub fn new(lines: Vec<RichText>) -> Self {
        Self {
            lines,
            cursor: None,
        }
    }

    pub fn with_cursor(mut self, cursor: Option<CursorPos>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn lines(&self) -> &[RichText] {
        &self.lines
    }

    pub fn cursor(&self) -> Option<CursorPos> {
        self.cursor
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Keeps the bottom `rows` lines, moving the cursor along.
    ///
    /// A cursor that falls outside the kept lines is dropped.
    pub fn clip_to_height(mut self, rows: usize) -> Self {
        let excess = self.lines.len().saturating_sub(rows);
        if excess == 0 {
            return self;
        }
        self.lines.drain(..excess);
        self.cursor = self.cursor.and_then(|pos| {
            pos.row.checked_sub(excess).map(|row| CursorPos::new(row, pos.col))
        });
        self
    }
}

impl From<Vec<RichText>> for Frame {
    fn from(lines: Vec<RichText>) -> Self {
        Self::new(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use crate::core::cursor::CursorPos;
    use crate::core::text::rich::RichText;

    #[test]
    fn clipping_keeps_the_bottom_and_shifts_cursor() {
        let frame = Frame::new(vec!["a".into(), "b".into(), "c".into()])
            .with_cursor(Some(CursorPos::new(2, 1)));
        let clipped = frame.clip_to_height(2);
        assert_eq!(
            clipped.lines().iter().map(RichText::plain_text).collect::<Vec<_>>(),
            vec!["b", "c"]
        );
        assert_eq!(clipped.cursor(), Some(CursorPos::new(1, 1)));

        let frame = Frame::new(vec!["a".into(), "b".into()])
            .with_cursor(Some(CursorPos::new(0, 0)));
        assert_eq!(frame.clip_to_height(1).cursor(), None);
    }
}
