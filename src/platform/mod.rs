//! Platform terminal integrations.

pub mod input_decoder;
pub mod memory_terminal;
pub mod process_terminal;

pub use input_decoder::InputDecoder;
pub use memory_terminal::MemoryTerminal;
#[cfg(unix)]
pub use process_terminal::{
    install_signal_handlers, ProcessTerminal, RestoreHandle, SignalHookGuard,
};
pub use process_terminal::{install_panic_hook, PanicHookGuard};
