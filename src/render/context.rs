//! The render context: the single writer for one output stream.

use std::io;
use std::sync::Arc;

use crate::core::capabilities::TerminalCapabilities;
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::terminal::Terminal;
use crate::core::text::rich::RichText;
use crate::core::theme::Theme;
use crate::error::RenderError;

use super::frame::Frame;
use super::painter::{paint, paint_line};
use super::renderer::DiffRenderer;

/// Owns the terminal, the live frame and the cursor model.
///
/// Every byte that reaches the terminal goes through [`OutputGate`]. After the
/// first failed write the context reports [`RenderError::Write`] once and then
/// drops all further output.
pub struct RenderContext<T: Terminal> {
    terminal: T,
    caps: TerminalCapabilities,
    theme: Arc<Theme>,
    gate: OutputGate,
    renderer: DiffRenderer,
    last_frame: Option<Frame>,
    /// Column of the cursor after the last `paint`; only meaningful outside a live frame.
    column: usize,
    raw: bool,
    write_failed: bool,
    pending_fatal: Option<io::Error>,
}

impl<T: Terminal> RenderContext<T> {
    pub fn new(terminal: T, caps: TerminalCapabilities, theme: Arc<Theme>) -> Self {
        Self {
            terminal,
            caps,
            theme,
            gate: OutputGate::new(),
            renderer: DiffRenderer::new(),
            last_frame: None,
            column: 0,
            raw: false,
            write_failed: false,
            pending_fatal: None,
        }
    }

    /// Context with the default theme for `caps`.
    pub fn with_default_theme(terminal: T, caps: TerminalCapabilities) -> Self {
        let theme = Arc::new(Theme::for_capabilities(&caps));
        Self::new(terminal, caps, theme)
    }

    pub fn capabilities(&self) -> &TerminalCapabilities {
        &self.caps
    }

    pub fn theme(&self) -> &Arc<Theme> {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: Arc<Theme>) {
        self.theme = theme;
        self.renderer.request_full_redraw_next();
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    pub fn into_terminal(self) -> T {
        self.terminal
    }

    pub fn width(&self) -> usize {
        usize::from(self.terminal.columns().max(1))
    }

    pub fn height(&self) -> usize {
        usize::from(self.terminal.rows().max(1))
    }

    /// Whether in-place redraw is possible on this stream.
    pub fn is_interactive(&self) -> bool {
        self.caps.is_tty && self.terminal.is_tty()
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn has_failed(&self) -> bool {
        self.write_failed
    }

    /// Writes styled text at the cursor.
    pub fn paint(&mut self, text: &RichText) -> Result<(), RenderError> {
        let lines = text.lines();
        if let Some(last) = lines.last() {
            self.column = if lines.len() > 1 {
                last.width()
            } else {
                self.column + last.width()
            };
        }
        self.gate.push(TerminalCmd::Bytes(paint(text, &self.caps)));
        self.flush()
    }

    /// Writes styled text followed by a line break.
    pub fn println(&mut self, text: &RichText) -> Result<(), RenderError> {
        let mut painted = paint(text, &self.caps);
        painted.push_str("\r\n");
        self.column = 0;
        self.gate.push(TerminalCmd::Bytes(painted));
        self.flush()
    }

    /// Replaces the live frame, rewriting only rows that changed.
    ///
    /// On a non-interactive stream the frame is only remembered; see [`finish`](Self::finish).
    pub fn redraw(&mut self, frame: Frame) -> Result<(), RenderError> {
        if !self.is_interactive() {
            self.last_frame = Some(frame);
            return self.surface_fatal();
        }
        let width = self.width();
        let frame = frame.clip_to_height(self.height());
        let painted = frame
            .lines()
            .iter()
            .map(|line| paint_line(&line.slice_columns(0, width), &self.caps))
            .collect();
        let cmds = self.renderer.render(painted, width, frame.cursor());
        self.gate.extend(cmds);
        self.last_frame = Some(frame);
        self.flush()
    }

    /// Forces the next [`redraw`](Self::redraw) to repaint every row.
    pub fn invalidate(&mut self) {
        self.renderer.request_full_redraw_next();
    }

    /// Repaints the last frame, e.g. after a resize.
    pub fn refresh(&mut self) -> Result<(), RenderError> {
        match self.last_frame.take() {
            Some(frame) => {
                self.renderer.request_full_redraw_next();
                self.redraw(frame)
            }
            None => self.flush(),
        }
    }

    /// Prints `text` above the live frame, which is then repainted below it.
    pub fn print_above(&mut self, text: &RichText) -> Result<(), RenderError> {
        if !self.is_interactive() {
            return self.println(text);
        }
        let cleared = self.renderer.clear();
        self.gate.extend(cleared);
        let mut painted = text
            .lines()
            .iter()
            .map(|line| paint_line(line, &self.caps))
            .collect::<Vec<_>>()
            .join("\r\n");
        painted.push_str("\r\n");
        self.gate.push(TerminalCmd::Bytes(painted));
        match self.last_frame.take() {
            Some(frame) => self.redraw(frame),
            None => self.flush(),
        }
    }

    /// Erases the live frame.
    pub fn clear_frame(&mut self) -> Result<(), RenderError> {
        self.last_frame = None;
        if self.is_interactive() {
            let cmds = self.renderer.clear();
            self.gate.extend(cmds);
        }
        self.flush()
    }

    /// Leaves the last frame on screen and moves the cursor below it.
    ///
    /// Non-interactive streams get the final frame as plain lines.
    pub fn finish(&mut self) -> Result<(), RenderError> {
        if self.is_interactive() {
            let cmds = self.renderer.finish();
            self.gate.extend(cmds);
            self.last_frame = None;
        } else if let Some(frame) = self.last_frame.take() {
            let mut out = String::new();
            for line in frame.lines() {
                out.push_str(&paint_line(line, &self.caps));
                out.push('\n');
            }
            self.gate.push(TerminalCmd::Bytes(out));
        }
        self.column = 0;
        self.flush()
    }

    /// Puts the terminal in raw mode and enables bracketed paste.
    pub fn enter_raw_mode(&mut self) -> Result<(), RenderError> {
        if self.raw || !self.is_interactive() {
            return Ok(());
        }
        self.terminal
            .enter_raw_mode()
            .map_err(RenderError::RawMode)?;
        self.raw = true;
        self.gate.push(TerminalCmd::BracketedPasteEnable);
        self.flush()
    }

    /// Restores cooked mode and shows the cursor.
    pub fn leave_raw_mode(&mut self) -> Result<(), RenderError> {
        if !self.raw {
            return Ok(());
        }
        self.gate.push(TerminalCmd::BracketedPasteDisable);
        self.gate.push(TerminalCmd::ShowCursor);
        let flushed = self.flush();
        self.terminal
            .leave_raw_mode()
            .map_err(RenderError::Restore)?;
        self.raw = false;
        flushed
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Hands the terminal to a foreground subprocess.
    ///
    /// The live frame is erased, raw mode is left and input handling pauses.
    /// Dropping the guard restores everything, including during unwinding; a
    /// failed restore is reported by the next call on this context.
    pub fn suspend(&mut self) -> Result<SuspendGuard<'_, T>, RenderError> {
        self.surface_fatal()?;
        let was_raw = self.raw;
        let frame = self.last_frame.clone();
        if self.is_interactive() {
            let cmds = self.renderer.clear();
            self.gate.extend(cmds);
        }
        self.gate.push(TerminalCmd::ShowCursor);
        // Output errors are already latched; only the mode switch matters here.
        let _ = self.flush();
        self.leave_raw_mode()?;
        tracing::debug!(was_raw, "terminal suspended");
        Ok(SuspendGuard {
            ctx: self,
            was_raw,
            frame,
            resumed: false,
        })
    }

    fn resume_from(&mut self, was_raw: bool, frame: Option<Frame>) -> Result<(), RenderError> {
        if was_raw {
            self.enter_raw_mode().map_err(|err| match err {
                RenderError::RawMode(source) => RenderError::Restore(source),
                other => other,
            })?;
        }
        tracing::debug!(was_raw, "terminal resumed");
        match frame {
            Some(frame) => {
                self.renderer.request_full_redraw_next();
                self.redraw(frame)
            }
            None => self.flush(),
        }
    }

    fn surface_fatal(&mut self) -> Result<(), RenderError> {
        match self.pending_fatal.take() {
            Some(err) => Err(RenderError::Restore(err)),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<(), RenderError> {
        self.surface_fatal()?;
        if self.write_failed {
            if !self.gate.is_empty() {
                tracing::trace!("dropping output after earlier write failure");
                self.gate.clear();
            }
            return Ok(());
        }
        match self.gate.flush(&mut self.terminal) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.write_failed = true;
                tracing::warn!(error = %err, "terminal write failed; suppressing further output");
                Err(RenderError::Write(err))
            }
        }
    }
}

/// Scoped hand-off of the terminal; see [`RenderContext::suspend`].
pub struct SuspendGuard<'a, T: Terminal> {
    ctx: &'a mut RenderContext<T>,
    was_raw: bool,
    frame: Option<Frame>,
    resumed: bool,
}

impl<T: Terminal> SuspendGuard<'_, T> {
    /// Restores the terminal now and reports failures directly.
    pub fn resume(mut self) -> Result<(), RenderError> {
        self.resumed = true;
        let frame = self.frame.take();
        self.ctx.resume_from(self.was_raw, frame)
    }

    /// The suspended context's terminal, e.g. to hand its size to a child.
    pub fn terminal(&self) -> &T {
        &self.ctx.terminal
    }

    #[cfg(test)]
    pub(crate) fn terminal_mut(&mut self) -> &mut T {
        &mut self.ctx.terminal
    }
}

impl<T: Terminal> Drop for SuspendGuard<'_, T> {
    fn drop(&mut self) {
        if self.resumed {
            return;
        }
        let frame = self.frame.take();
        match self.ctx.resume_from(self.was_raw, frame) {
            Ok(()) | Err(RenderError::Write(_)) => {}
            Err(RenderError::Restore(err)) | Err(RenderError::RawMode(err)) => {
                tracing::error!(error = %err, "failed to restore terminal after suspend");
                self.ctx.pending_fatal = Some(err);
            }
        }
    }
}
