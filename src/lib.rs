//! Capability-aware styled terminal output, inline interactive widgets and a
//! portable shell completion protocol.
//!
//! Invariant: single output gate, only `core::output::OutputGate::flush(..)` writes to the
//! terminal.
//!
//! # Public API Overview
//! - Detect what the output stream supports with [`TerminalCapabilities`] and build a
//!   [`Theme`] for it.
//! - Compose [`RichText`] and paint it through a [`RenderContext`]; frames are redrawn by
//!   diffing against the previous one.
//! - Ask questions with the widgets ([`TextInput`], [`ChoiceList`], [`MultiSelect`],
//!   [`ProgressTask`]) inside a [`Session`].
//! - Describe a command line as a [`complete::CommandTree`], encode it with
//!   [`complete::encode_tree`] and answer completion requests with [`complete::complete`].

#![allow(
    clippy::derivable_impls,
    clippy::needless_range_loop,
    clippy::too_many_arguments,
    clippy::type_complexity,
    clippy::unnecessary_map_or
)]

pub mod app;
pub mod complete;
pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Environment snapshot and derived configuration.
pub use crate::config::{EnvConfig, EnvSnapshot};
/// Error types.
pub use crate::error::{CompletionError, RenderError, ThemeError};
/// Debug logging setup.
pub use crate::logging::{init_logging, LogTarget};

/// Terminal capability model.
pub use crate::core::capabilities::{ColorOverride, ColorTier, TerminalCapabilities};
/// Colors, attributes and styles.
pub use crate::core::style::{Attr, Color, Style};
/// Style tree with alias resolution.
pub use crate::core::theme::{Theme, ThemeEntry, ThemeSlot, ThemeWarning};
/// Styled text.
pub use crate::core::text::rich::{RichText, StyledSpan};
pub use crate::core::text::wrap::WrapOptions;
/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;

/// Widget contracts and input events.
pub use crate::core::component::{Action, Component, Interaction, Widget, WidgetState};
pub use crate::core::event::{Event, ProgressUpdate, TaskId};
pub use crate::core::input::{InputEvent, Key, KeyEvent};

/// Terminal interfaces and implementations.
pub use crate::core::terminal::Terminal;
pub use crate::platform::MemoryTerminal;
#[cfg(unix)]
pub use crate::platform::ProcessTerminal;

/// Rendering.
pub use crate::render::{paint, RenderContext, SuspendGuard};

/// Built-in widgets.
pub use crate::widgets::{
    Choice, ChoiceList, MultiSelect, Paragraph, ProgressHandle, ProgressTask, TextInput,
    VerticalLayout,
};

/// Event loop and session.
pub use crate::runtime::{EventLoop, Outcome, Session};

/// Command-line glue for hosted applications.
pub use crate::app::{command_tree, handle_builtin_flags, CustomRegistry, TerminalArgs};
