//! Initialization failure taxonomy.
//!
//! Every step of the bootstrap sequence reports failure through [`InitError`];
//! callers can distinguish failure categories by variant without inspecting
//! message text.

use std::fmt;

use crate::shader::ShaderStage;

/// Failure categories of the one-shot initialization sequence.
///
/// Variants map 1:1 to the steps of the sequence: surface resolution, context
/// acquisition, shader source lookup, stage dispatch, compile, link. Compile
/// and link failures carry the diagnostic log produced by the shader
/// front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// The surface identifier was empty or absent.
    MissingSurfaceId,

    /// No surface is registered under the given identifier.
    SurfaceNotFound { id: String },

    /// No rendering context could be obtained, via the primary or the
    /// fallback adapter.
    ContextAcquisition { reason: String },

    /// The shader source catalog has no element for the given identifier.
    ShaderSourceNotFound { id: String },

    /// The source element's type marker is not one of the two recognized
    /// stage markers.
    UnknownShaderType { id: String, marker: String },

    /// Shader compilation failed; `log` is the front-end diagnostic for the
    /// stage that failed.
    ShaderCompile { stage: ShaderStage, log: String },

    /// Program linking failed (missing entry point, wrong stage pairing,
    /// inter-stage interface mismatch, symbol lookup failure, or pipeline
    /// validation error).
    ProgramLink { log: String },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::MissingSurfaceId => {
                write!(f, "a surface identifier must be provided")
            }
            InitError::SurfaceNotFound { id } => {
                write!(f, "no surface registered under id {id:?}")
            }
            InitError::ContextAcquisition { reason } => {
                write!(f, "unable to acquire a rendering context: {reason}")
            }
            InitError::ShaderSourceNotFound { id } => {
                write!(f, "no shader source element with id {id:?}")
            }
            InitError::UnknownShaderType { id, marker } => {
                write!(f, "shader source {id:?} has unknown type marker {marker:?}")
            }
            InitError::ShaderCompile { stage, log } => {
                write!(f, "{stage} shader failed to compile:\n{log}")
            }
            InitError::ProgramLink { log } => {
                write!(f, "unable to link the shader program: {log}")
            }
        }
    }
}

impl std::error::Error for InitError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_stage() {
        let err = InitError::ShaderCompile {
            stage: ShaderStage::Vertex,
            log: "expected ';'".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("vertex"));
        assert!(text.contains("expected ';'"));
    }

    #[test]
    fn display_carries_the_offending_id() {
        let err = InitError::SurfaceNotFound { id: "glcanvas".to_string() };
        assert!(err.to_string().contains("glcanvas"));
    }
}
