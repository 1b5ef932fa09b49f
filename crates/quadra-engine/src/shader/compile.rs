use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::InitError;

use super::ShaderStage;

/// A shader that passed front-end compilation.
///
/// Keeps the parsed module for link-time interface checks and reflection, and
/// the original source so the GPU layer can hand it to the backend verbatim.
#[derive(Debug)]
pub struct CompiledShader {
    pub stage: ShaderStage,
    pub source: String,
    pub module: naga::Module,
}

/// Compiles one shader stage: parse, then full validation.
///
/// On failure the error carries the stage tag and the rendered diagnostic for
/// the source that actually failed.
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledShader, InitError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| InitError::ShaderCompile {
        stage,
        log: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| InitError::ShaderCompile {
            stage,
            log: e.emit_to_string(source),
        })?;

    Ok(CompiledShader {
        stage,
        source: source.to_string(),
        module,
    })
}
