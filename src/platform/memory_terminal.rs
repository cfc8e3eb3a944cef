//! In-memory terminal that records everything written to it.

use std::io;

use crate::core::terminal::Terminal;

#[derive(Debug, Clone)]
pub struct MemoryTerminal {
    output: String,
    columns: u16,
    rows: u16,
    tty: bool,
    raw: bool,
    writes: usize,
    fail_writes: bool,
    fail_restore: bool,
    mode_log: Vec<&'static str>,
}

impl MemoryTerminal {
    /// A tty of the given size.
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            output: String::new(),
            columns,
            rows,
            tty: true,
            raw: false,
            writes: 0,
            fail_writes: false,
            fail_restore: false,
            mode_log: Vec::new(),
        }
    }

    /// A pipe: no cursor control.
    pub fn pipe() -> Self {
        Self {
            tty: false,
            ..Self::new(80, 24)
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Sequence of `raw` / `cooked` transitions.
    pub fn mode_log(&self) -> &[&'static str] {
        &self.mode_log
    }

    /// Every later write fails with `BrokenPipe`.
    pub fn fail_writes(&mut self) {
        self.fail_writes = true;
    }

    /// Every later raw-mode transition fails.
    pub fn fail_restore(&mut self) {
        self.fail_restore = true;
    }

    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.columns = columns;
        self.rows = rows;
    }
}

impl Terminal for MemoryTerminal {
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        if self.fail_restore {
            return Err(io::Error::other("tcsetattr failed"));
        }
        self.raw = true;
        self.mode_log.push("raw");
        Ok(())
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        if self.fail_restore {
            return Err(io::Error::other("tcsetattr failed"));
        }
        self.raw = false;
        self.mode_log.push("cooked");
        Ok(())
    }

    fn write(&mut self, data: &str) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        self.writes += 1;
        self.output.push_str(data);
        Ok(())
    }

    fn columns(&self) -> u16 {
        self.columns
    }

    fn rows(&self) -> u16 {
        self.rows
    }

    fn is_tty(&self) -> bool {
        self.tty
    }
}
