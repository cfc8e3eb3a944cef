//! Text helpers: escape scanning, column widths, styled text and wrapping.
//!
//! These are pure (value in, value out) and live under `core` so widgets can use them without
//! importing anything from the render layer.

pub mod ansi;
pub mod rich;
pub mod utils;
pub mod width;
pub mod wrap;
