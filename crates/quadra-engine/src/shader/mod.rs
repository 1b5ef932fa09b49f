//! Shader handling: source catalog, front-end compilation, program linking.
//!
//! This module is responsible for:
//! - storing shader source records keyed by identifier
//! - determining the stage of a record from its type marker
//! - compiling each stage and surfacing diagnostic logs on failure
//! - linking a vertex/fragment pair and reflecting its interface

mod catalog;
mod compile;
mod link;

pub use catalog::{
    ShaderCatalog, ShaderSource, ShaderStage, SourceNode, FRAGMENT_MARKER, VERTEX_MARKER,
};
pub use compile::{compile, CompiledShader};
pub use link::{ShaderProgram, POSITION_ATTRIBUTE, TRANSFORMS_BLOCK};
