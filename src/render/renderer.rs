//! Diff renderer for an inline screen region.
//!
//! The region starts on the row the cursor occupied when the first frame was
//! drawn and grows downward. Only rows whose painted bytes changed are
//! rewritten; everything is relative cursor movement so scrollback above the
//! region is never touched.

use crate::core::cursor::CursorPos;
use crate::core::output::TerminalCmd;

const CLEAR_LINE: &str = "\x1b[2K";
const CLEAR_BELOW: &str = "\x1b[J";

#[derive(Debug)]
pub struct DiffRenderer {
    previous_lines: Vec<String>,
    previous_width: usize,
    previous_cursor: Option<CursorPos>,
    /// Rows below the region top that exist on screen and can be reached with CUD.
    rows_on_screen: usize,
    cursor_row: usize,
    force_full_redraw_next: bool,
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self {
            previous_lines: Vec::new(),
            previous_width: 0,
            previous_cursor: None,
            rows_on_screen: 1,
            cursor_row: 0,
            force_full_redraw_next: false,
        }
    }
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_full_redraw_next(&mut self) {
        self.force_full_redraw_next = true;
    }

    pub fn previous_lines(&self) -> &[String] {
        &self.previous_lines
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    /// Commands that turn the previous frame into `lines`.
    ///
    /// Identical input produces no commands at all.
    pub fn render(
        &mut self,
        lines: Vec<String>,
        width: usize,
        cursor: Option<CursorPos>,
    ) -> Vec<TerminalCmd> {
        let width_changed = width != self.previous_width && !self.previous_lines.is_empty();
        let full = self.force_full_redraw_next || width_changed;
        self.force_full_redraw_next = false;
        self.previous_width = width;

        if !full && lines == self.previous_lines && cursor == self.previous_cursor {
            return Vec::new();
        }

        let mut buf = String::new();
        if full {
            self.move_to(&mut buf, 0);
            buf.push('\r');
            buf.push_str(CLEAR_BELOW);
            self.previous_lines.clear();
        }

        for (row, line) in lines.iter().enumerate() {
            if self.previous_lines.get(row) == Some(line) {
                continue;
            }
            self.move_to(&mut buf, row);
            buf.push('\r');
            buf.push_str(CLEAR_LINE);
            buf.push_str(line);
        }

        if lines.len() < self.previous_lines.len() {
            self.move_to(&mut buf, lines.len());
            buf.push('\r');
            buf.push_str(CLEAR_BELOW);
        }

        let mut cmds = vec![TerminalCmd::SyncStart, TerminalCmd::HideCursor];
        match cursor {
            Some(pos) => {
                let row = pos.row.min(lines.len().saturating_sub(1));
                self.move_to(&mut buf, row);
                buf.push_str(&format!("\x1b[{}G", pos.col + 1));
                cmds.push(TerminalCmd::Bytes(buf));
                cmds.push(TerminalCmd::ShowCursor);
            }
            None => {
                self.move_to(&mut buf, lines.len().saturating_sub(1));
                cmds.push(TerminalCmd::Bytes(buf));
            }
        }
        cmds.push(TerminalCmd::SyncEnd);

        self.previous_lines = lines;
        self.previous_cursor = cursor;
        cmds
    }

    /// Erases the region and parks the cursor at its top-left cell.
    ///
    /// The next [`render`](Self::render) redraws every line.
    pub fn clear(&mut self) -> Vec<TerminalCmd> {
        if self.previous_lines.is_empty() {
            return Vec::new();
        }
        let mut buf = String::new();
        self.move_to(&mut buf, 0);
        buf.push('\r');
        buf.push_str(CLEAR_BELOW);
        self.reset();
        vec![TerminalCmd::Bytes(buf)]
    }

    /// Leaves the last frame on screen and moves below it.
    pub fn finish(&mut self) -> Vec<TerminalCmd> {
        let mut cmds = Vec::new();
        if !self.previous_lines.is_empty() {
            let mut buf = String::new();
            self.move_to(&mut buf, self.previous_lines.len() - 1);
            buf.push_str("\r\n");
            cmds.push(TerminalCmd::Bytes(buf));
        }
        cmds.push(TerminalCmd::ShowCursor);
        self.reset();
        cmds
    }

    fn reset(&mut self) {
        self.previous_lines.clear();
        self.previous_cursor = None;
        self.rows_on_screen = 1;
        self.cursor_row = 0;
    }

    fn move_to(&mut self, buf: &mut String, row: usize) {
        if row < self.cursor_row {
            buf.push_str(&format!("\x1b[{}A", self.cursor_row - row));
        } else if row > self.cursor_row {
            let reachable = row.min(self.rows_on_screen - 1);
            if reachable > self.cursor_row {
                buf.push_str(&format!("\x1b[{}B", reachable - self.cursor_row));
            }
            for _ in reachable.max(self.cursor_row)..row {
                buf.push_str("\r\n");
            }
            self.rows_on_screen = self.rows_on_screen.max(row + 1);
        }
        self.cursor_row = row;
    }
}

#[cfg(test)]
mod tests {
    use super::DiffRenderer;
    use crate::core::cursor::CursorPos;
    use crate::core::output::{cmds_to_string, SYNC_END, SYNC_START};

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn framed(body: &str) -> String {
        format!("{SYNC_START}\x1b[?25l{body}{SYNC_END}")
    }

    #[test]
    fn first_frame_writes_every_line() {
        let mut renderer = DiffRenderer::new();
        let out = cmds_to_string(&renderer.render(lines(&["a", "b", "c"]), 80, None));
        assert_eq!(
            out,
            framed("\r\x1b[2Ka\r\n\r\x1b[2Kb\r\n\r\x1b[2Kc")
        );
        assert_eq!(renderer.cursor_row(), 2);
    }

    #[test]
    fn identical_frame_emits_nothing() {
        let mut renderer = DiffRenderer::new();
        renderer.render(lines(&["a", "b"]), 80, None);
        assert!(renderer.render(lines(&["a", "b"]), 80, None).is_empty());
    }

    #[test]
    fn only_changed_rows_are_rewritten() {
        let mut renderer = DiffRenderer::new();
        renderer.render(lines(&["a", "b", "c"]), 80, None);
        let out = cmds_to_string(&renderer.render(lines(&["a", "B", "c"]), 80, None));
        assert_eq!(out, framed("\x1b[1A\r\x1b[2KB\x1b[1B"));
    }

    #[test]
    fn shrinking_clears_trailing_rows() {
        let mut renderer = DiffRenderer::new();
        renderer.render(lines(&["a", "b", "c"]), 80, None);
        let out = cmds_to_string(&renderer.render(lines(&["a"]), 80, None));
        assert_eq!(out, framed("\x1b[1A\r\x1b[J\x1b[1A"));
        assert_eq!(renderer.cursor_row(), 0);
    }

    #[test]
    fn growing_after_shrink_reuses_existing_rows() {
        let mut renderer = DiffRenderer::new();
        renderer.render(lines(&["a", "b"]), 80, None);
        renderer.render(lines(&["a"]), 80, None);
        let out = cmds_to_string(&renderer.render(lines(&["a", "b", "c"]), 80, None));
        assert_eq!(out, framed("\x1b[1B\r\x1b[2Kb\r\n\r\x1b[2Kc"));
    }

    #[test]
    fn width_change_forces_full_redraw() {
        let mut renderer = DiffRenderer::new();
        renderer.render(lines(&["a", "b"]), 80, None);
        let out = cmds_to_string(&renderer.render(lines(&["a", "b"]), 40, None));
        assert_eq!(
            out,
            framed("\x1b[1A\r\x1b[J\r\x1b[2Ka\x1b[1B\r\x1b[2Kb")
        );
    }

    #[test]
    fn cursor_is_positioned_and_shown() {
        let mut renderer = DiffRenderer::new();
        let out = cmds_to_string(&renderer.render(
            lines(&["name: bob", "hint"]),
            80,
            Some(CursorPos::new(0, 9)),
        ));
        assert_eq!(
            out,
            format!(
                "{SYNC_START}\x1b[?25l\r\x1b[2Kname: bob\r\n\r\x1b[2Khint\x1b[1A\x1b[10G\x1b[?25h{SYNC_END}"
            )
        );

        let moved = cmds_to_string(&renderer.render(
            lines(&["name: bob", "hint"]),
            80,
            Some(CursorPos::new(0, 8)),
        ));
        assert_eq!(
            moved,
            format!("{SYNC_START}\x1b[?25l\x1b[9G\x1b[?25h{SYNC_END}")
        );
    }

    #[test]
    fn clear_then_finish() {
        let mut renderer = DiffRenderer::new();
        renderer.render(lines(&["a", "b"]), 80, None);
        assert_eq!(cmds_to_string(&renderer.clear()), "\x1b[1A\r\x1b[J");
        assert!(renderer.previous_lines().is_empty());

        renderer.render(lines(&["x", "y"]), 80, None);
        assert_eq!(cmds_to_string(&renderer.finish()), "\r\n\x1b[?25h");
        assert_eq!(renderer.cursor_row(), 0);
    }
}
