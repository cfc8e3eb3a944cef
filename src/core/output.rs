//! Typed terminal output commands and the single output gate.
//!
//! Invariant: all terminal writes flow through `OutputGate::flush(..)`.

use std::io;

use crate::core::terminal::Terminal;

pub const SYNC_START: &str = "\x1b[?2026h";
pub const SYNC_END: &str = "\x1b[?2026l";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCmd {
    Bytes(String),
    BytesStatic(&'static str),
    HideCursor,
    ShowCursor,
    /// Synchronized output markers around a redraw.
    SyncStart,
    SyncEnd,
    BracketedPasteEnable,
    BracketedPasteDisable,
}

impl TerminalCmd {
    pub fn bytes(data: impl Into<String>) -> Self {
        Self::Bytes(data.into())
    }

    fn as_str(&self) -> &str {
        match self {
            Self::Bytes(data) => data,
            Self::BytesStatic(data) => data,
            Self::HideCursor => "\x1b[?25l",
            Self::ShowCursor => "\x1b[?25h",
            Self::SyncStart => SYNC_START,
            Self::SyncEnd => SYNC_END,
            Self::BracketedPasteEnable => "\x1b[?2004h",
            Self::BracketedPasteDisable => "\x1b[?2004l",
        }
    }
}

/// Renders commands to the bytes that would reach the terminal.
pub fn cmds_to_string(cmds: &[TerminalCmd]) -> String {
    cmds.iter().map(TerminalCmd::as_str).collect()
}

#[derive(Debug, Default)]
pub struct OutputGate {
    cmds: Vec<TerminalCmd>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: TerminalCmd) {
        self.cmds.push(cmd);
    }

    pub fn extend<I>(&mut self, cmds: I)
    where
        I: IntoIterator<Item = TerminalCmd>,
    {
        self.cmds.extend(cmds);
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Writes buffered commands to the terminal as one batch.
    ///
    /// The buffer is emptied even when the write fails.
    pub fn flush<T: Terminal + ?Sized>(&mut self, term: &mut T) -> io::Result<()> {
        if self.cmds.is_empty() {
            return Ok(());
        }
        let batch = cmds_to_string(&self.cmds);
        self.cmds.clear();
        term.write(&batch)?;
        term.flush()
    }
}
