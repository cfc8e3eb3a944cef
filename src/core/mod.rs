//! Core types shared by rendering, widgets and the runtime.

pub mod capabilities;
pub mod component;
pub mod cursor;
pub mod event;
pub mod input;
pub mod output;
pub mod style;
pub mod terminal;
pub mod text;
pub mod theme;
