//! Error types shared across the crate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// First write failure on a context; later writes are dropped silently.
    #[error("terminal write failed: {0}")]
    Write(#[source] io::Error),

    #[error("failed to restore terminal mode: {0}")]
    Restore(#[source] io::Error),

    #[error("failed to enter raw mode: {0}")]
    RawMode(#[source] io::Error),
}

impl RenderError {
    /// Whether the session must stop because the user's terminal may be left broken.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Restore(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("line {line}: expected at least 5 tab-separated fields, found {found}")]
    MissingFields { line: usize, found: usize },

    #[error("invalid arity {0:?}")]
    InvalidArity(String),

    #[error("invalid number {value:?} for {what}")]
    InvalidNumber { what: &'static str, value: String },

    #[error("opcode {opcode:?} declares {size} operands but only {available} remain")]
    Truncated {
        opcode: String,
        size: usize,
        available: usize,
    },

    #[error("opcode stream ended while reading {0}")]
    UnexpectedEnd(&'static str),

    #[error("opcode {opcode:?} has malformed operands: {reason}")]
    MalformedOperands { opcode: String, reason: String },

    #[error("invalid escape sequence in field {0:?}")]
    InvalidEscape(String),

    #[error("custom completer {token:?} failed: {reason}")]
    Custom { token: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("failed to read theme file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse theme file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid color specification {0:?}")]
    InvalidColor(String),
}
