//! Terminal trait.

use std::io;

/// The device a render context writes to.
///
/// Only [`crate::core::output::OutputGate::flush`] calls [`Terminal::write`].
pub trait Terminal {
    /// Switch to raw (non-canonical, no echo) input mode.
    fn enter_raw_mode(&mut self) -> io::Result<()>;

    /// Restore the mode that was active before [`Terminal::enter_raw_mode`].
    fn leave_raw_mode(&mut self) -> io::Result<()>;

    fn write(&mut self, data: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Terminal dimensions.
    fn columns(&self) -> u16;
    fn rows(&self) -> u16;

    /// Whether cursor movement and in-place redraw are possible.
    fn is_tty(&self) -> bool;
}

impl<T: Terminal + ?Sized> Terminal for Box<T> {
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        (**self).enter_raw_mode()
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        (**self).leave_raw_mode()
    }

    fn write(&mut self, data: &str) -> io::Result<()> {
        (**self).write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn columns(&self) -> u16 {
        (**self).columns()
    }

    fn rows(&self) -> u16 {
        (**self).rows()
    }

    fn is_tty(&self) -> bool {
        (**self).is_tty()
    }
}
