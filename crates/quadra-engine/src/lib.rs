//! Quadra engine crate.
//!
//! One-shot GPU bootstrap: resolve a surface, acquire a rendering context,
//! compile/link a fixed shader pair from a source catalog, upload a static
//! quad, and draw it once. Initialization is strictly linear; any step's
//! failure aborts the sequence with a typed [`error::InitError`].

pub mod device;
pub mod shader;
pub mod transform;
pub mod render;
pub mod controller;
pub mod window;

pub mod logging;
pub mod error;
