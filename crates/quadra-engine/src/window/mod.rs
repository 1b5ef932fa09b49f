//! One-shot window runtime and the surface registry.

mod runtime;
mod surface;

pub use runtime::{Runtime, RuntimeConfig};
pub use surface::SurfaceTable;
