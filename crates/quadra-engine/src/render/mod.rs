//! Rendering layer: context/target seams and the quad renderer.

mod ctx;
mod quad;

pub use ctx::{RenderCtx, RenderTarget};
pub use quad::{QuadRenderer, QuadVertex, CLEAR_COLOR, QUAD_VERTICES};
