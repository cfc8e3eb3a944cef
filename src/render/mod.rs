//! Rendering pipeline: painting, diffed redraw and the render context.

pub mod context;
pub mod frame;
pub mod painter;
pub mod renderer;

pub use context::{RenderContext, SuspendGuard};
pub use frame::Frame;
pub use painter::{paint, paint_line};
pub use renderer::DiffRenderer;
