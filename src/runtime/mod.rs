//! Event loop and session wiring.

pub mod event_loop;
pub mod session;

pub use event_loop::{EventLoop, Outcome};
pub use session::{load_theme, Session};
