/// Cursor position relative to the top-left cell of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorPos {
    pub row: usize,
    pub col: usize,
}

impl CursorPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Same position inside a frame that has `rows` extra lines above.
    pub const fn shifted_down(self, rows: usize) -> Self {
        Self {
            row: self.row + rows,
            col: self.col,
        }
    }
}
