use std::collections::BTreeMap;
use std::fmt;

use naga::{AddressSpace, Binding, Handle, Module, ScalarKind, Type, TypeInner, VectorSize};

use crate::error::InitError;

use super::{compile, CompiledShader, ShaderCatalog, ShaderStage};

/// Name of the per-vertex position attribute the program must declare.
pub const POSITION_ATTRIBUTE: &str = "position";

/// Name of the uniform block carrying the two transform matrices.
pub const TRANSFORMS_BLOCK: &str = "transforms";

/// A linked vertex/fragment pair plus its reflected interface.
///
/// Exactly one program is created per controller; once linked it is never
/// replaced. `position_location` is the enabled vertex attribute slot;
/// `transforms_group`/`transforms_binding` locate the uniform block.
#[derive(Debug)]
pub struct ShaderProgram {
    pub vertex: CompiledShader,
    pub fragment: CompiledShader,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub position_location: u32,
    pub transforms_group: u32,
    pub transforms_binding: u32,
}

impl ShaderProgram {
    /// Builds the program from two catalog records.
    ///
    /// Sequence: lookup → stage dispatch → compile (vertex first) → link.
    /// Each step's failure aborts the sequence; a compile failure means no
    /// link is ever attempted.
    pub fn link(
        catalog: &ShaderCatalog,
        vertex_id: &str,
        fragment_id: &str,
    ) -> Result<Self, InitError> {
        let vertex_el = catalog.lookup(vertex_id)?;
        let fragment_el = catalog.lookup(fragment_id)?;

        let vertex_stage = vertex_el.stage(vertex_id)?;
        let fragment_stage = fragment_el.stage(fragment_id)?;

        let vertex = compile(vertex_stage, &vertex_el.source_text())?;
        let fragment = compile(fragment_stage, &fragment_el.source_text())?;

        Self::link_compiled(vertex, fragment)
    }

    /// Links two compiled shaders into a program.
    ///
    /// Link checks, in order: stage pairing, entry-point presence, inter-stage
    /// varying compatibility, then interface reflection (position attribute
    /// and transforms block). Every failure is a [`InitError::ProgramLink`]
    /// whose log names the offending piece.
    pub fn link_compiled(
        vertex: CompiledShader,
        fragment: CompiledShader,
    ) -> Result<Self, InitError> {
        if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
            return Err(link_error(format!(
                "a program requires exactly one vertex and one fragment shader, got {} and {}",
                vertex.stage, fragment.stage
            )));
        }

        let vertex_entry = entry_point(&vertex.module, naga::ShaderStage::Vertex)
            .ok_or_else(|| link_error("vertex module exposes no vertex entry point"))?;
        let fragment_entry = entry_point(&fragment.module, naga::ShaderStage::Fragment)
            .ok_or_else(|| link_error("fragment module exposes no fragment entry point"))?;

        check_varyings(
            &vertex.module,
            vertex_entry,
            &fragment.module,
            fragment_entry,
        )?;

        let position_location =
            attribute_location(&vertex.module, vertex_entry, POSITION_ATTRIBUTE)?;
        let (transforms_group, transforms_binding) =
            uniform_binding(&vertex.module, TRANSFORMS_BLOCK)?;

        let vertex_entry = vertex_entry.name.clone();
        let fragment_entry = fragment_entry.name.clone();

        Ok(Self {
            vertex,
            fragment,
            vertex_entry,
            fragment_entry,
            position_location,
            transforms_group,
            transforms_binding,
        })
    }
}

fn link_error(log: impl Into<String>) -> InitError {
    InitError::ProgramLink { log: log.into() }
}

fn entry_point(module: &Module, stage: naga::ShaderStage) -> Option<&naga::EntryPoint> {
    module.entry_points.iter().find(|ep| ep.stage == stage)
}

/// Shape of a user varying, reduced to what inter-stage matching needs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Varying {
    Scalar(ScalarKind, u8),
    Vector(u8, ScalarKind, u8),
}

impl fmt::Display for Varying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Varying::Scalar(kind, width) => write!(f, "{kind:?}{}", u32::from(*width) * 8),
            Varying::Vector(len, kind, width) => {
                write!(f, "vec{len}<{kind:?}{}>", u32::from(*width) * 8)
            }
        }
    }
}

fn varying_of(module: &Module, ty: Handle<Type>) -> Option<Varying> {
    match module.types[ty].inner {
        TypeInner::Scalar(s) => Some(Varying::Scalar(s.kind, s.width)),
        TypeInner::Vector { size, scalar } => {
            Some(Varying::Vector(vector_len(size), scalar.kind, scalar.width))
        }
        _ => None,
    }
}

fn vector_len(size: VectorSize) -> u8 {
    match size {
        VectorSize::Bi => 2,
        VectorSize::Tri => 3,
        VectorSize::Quad => 4,
    }
}

/// Collects the location-bound outputs of an entry point.
///
/// Built-in outputs (e.g. the clip position) take no location and are skipped.
fn stage_outputs(module: &Module, ep: &naga::EntryPoint) -> BTreeMap<u32, Varying> {
    let mut out = BTreeMap::new();

    let Some(result) = &ep.function.result else {
        return out;
    };

    match &result.binding {
        Some(Binding::Location { location, .. }) => {
            if let Some(v) = varying_of(module, result.ty) {
                out.insert(*location, v);
            }
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[result.ty].inner {
                for member in members {
                    if let Some(Binding::Location { location, .. }) = &member.binding {
                        if let Some(v) = varying_of(module, member.ty) {
                            out.insert(*location, v);
                        }
                    }
                }
            }
        }
    }

    out
}

/// Collects the location-bound inputs of an entry point.
fn stage_inputs(module: &Module, ep: &naga::EntryPoint) -> BTreeMap<u32, Varying> {
    let mut input = BTreeMap::new();

    for arg in &ep.function.arguments {
        match &arg.binding {
            Some(Binding::Location { location, .. }) => {
                if let Some(v) = varying_of(module, arg.ty) {
                    input.insert(*location, v);
                }
            }
            Some(Binding::BuiltIn(_)) => {}
            None => {
                if let TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    for member in members {
                        if let Some(Binding::Location { location, .. }) = &member.binding {
                            if let Some(v) = varying_of(module, member.ty) {
                                input.insert(*location, v);
                            }
                        }
                    }
                }
            }
        }
    }

    input
}

/// Every varying the fragment stage consumes must be produced by the vertex
/// stage at the same location with the same type.
fn check_varyings(
    vs_module: &Module,
    vs_entry: &naga::EntryPoint,
    fs_module: &Module,
    fs_entry: &naga::EntryPoint,
) -> Result<(), InitError> {
    let produced = stage_outputs(vs_module, vs_entry);
    let consumed = stage_inputs(fs_module, fs_entry);

    for (location, want) in &consumed {
        match produced.get(location) {
            None => {
                return Err(link_error(format!(
                    "fragment stage reads location {location} ({want}) but the vertex stage \
                     writes nothing there"
                )));
            }
            Some(have) if have != want => {
                return Err(link_error(format!(
                    "varying type mismatch at location {location}: vertex writes {have}, \
                     fragment reads {want}"
                )));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Looks up a location-bound vertex input by name, searching both plain
/// arguments and struct-typed argument members.
fn attribute_location(
    module: &Module,
    ep: &naga::EntryPoint,
    name: &str,
) -> Result<u32, InitError> {
    for arg in &ep.function.arguments {
        if let Some(Binding::Location { location, .. }) = &arg.binding {
            if arg.name.as_deref() == Some(name) {
                return Ok(*location);
            }
            continue;
        }

        if arg.binding.is_none() {
            if let TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                for member in members {
                    if let Some(Binding::Location { location, .. }) = &member.binding {
                        if member.name.as_deref() == Some(name) {
                            return Ok(*location);
                        }
                    }
                }
            }
        }
    }

    Err(link_error(format!(
        "vertex entry point declares no attribute named {name:?}"
    )))
}

/// Looks up a uniform-space global by name and returns its (group, binding).
fn uniform_binding(module: &Module, name: &str) -> Result<(u32, u32), InitError> {
    for (_, var) in module.global_variables.iter() {
        if var.space == AddressSpace::Uniform && var.name.as_deref() == Some(name) {
            if let Some(res) = &var.binding {
                return Ok((res.group, res.binding));
            }
        }
    }

    Err(link_error(format!(
        "program declares no uniform block named {name:?}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{ShaderSource, FRAGMENT_MARKER, VERTEX_MARKER};

    const VS_OK: &str = r#"
        struct Transforms {
            projection: mat4x4<f32>,
            model_view: mat4x4<f32>,
        };

        @group(0) @binding(0) var<uniform> transforms: Transforms;

        @vertex
        fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
            return transforms.projection * transforms.model_view * vec4<f32>(position, 1.0);
        }
    "#;

    const FS_OK: &str = r#"
        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0, 1.0, 1.0, 1.0);
        }
    "#;

    fn catalog_with(vs: &str, fs: &str) -> ShaderCatalog {
        let mut catalog = ShaderCatalog::new();
        catalog.insert("shader_vs", ShaderSource::new(VERTEX_MARKER, vs));
        catalog.insert("shader_fs", ShaderSource::new(FRAGMENT_MARKER, fs));
        catalog
    }

    // ── the happy path ────────────────────────────────────────────────────

    #[test]
    fn valid_pair_links_and_reflects_interface() {
        let catalog = catalog_with(VS_OK, FS_OK);
        let program = ShaderProgram::link(&catalog, "shader_vs", "shader_fs").unwrap();

        assert_eq!(program.vertex_entry, "vs_main");
        assert_eq!(program.fragment_entry, "fs_main");
        assert_eq!(program.position_location, 0);
        assert_eq!((program.transforms_group, program.transforms_binding), (0, 0));
    }

    #[test]
    fn varyings_carried_between_stages_link() {
        let vs = r#"
            struct Transforms {
                projection: mat4x4<f32>,
                model_view: mat4x4<f32>,
            };

            @group(0) @binding(0) var<uniform> transforms: Transforms;

            struct VsOut {
                @builtin(position) clip: vec4<f32>,
                @location(0) tint: vec3<f32>,
            };

            @vertex
            fn vs_main(@location(0) position: vec3<f32>) -> VsOut {
                var out: VsOut;
                out.clip = transforms.projection * transforms.model_view
                    * vec4<f32>(position, 1.0);
                out.tint = position;
                return out;
            }
        "#;
        let fs = r#"
            @fragment
            fn fs_main(@location(0) tint: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(tint, 1.0);
            }
        "#;

        let catalog = catalog_with(vs, fs);
        assert!(ShaderProgram::link(&catalog, "shader_vs", "shader_fs").is_ok());
    }

    // ── lookup and dispatch failures ──────────────────────────────────────

    #[test]
    fn missing_source_element_fails_before_compiling() {
        let mut catalog = ShaderCatalog::new();
        catalog.insert("shader_fs", ShaderSource::new(FRAGMENT_MARKER, FS_OK));

        let err = ShaderProgram::link(&catalog, "shader_vs", "shader_fs").unwrap_err();
        assert!(matches!(err, InitError::ShaderSourceNotFound { id } if id == "shader_vs"));
    }

    #[test]
    fn unknown_marker_fails_before_compiling() {
        let mut catalog = catalog_with(VS_OK, FS_OK);
        catalog.insert("shader_vs", ShaderSource::new("x-shader/x-compute", VS_OK));

        let err = ShaderProgram::link(&catalog, "shader_vs", "shader_fs").unwrap_err();
        assert!(matches!(err, InitError::UnknownShaderType { .. }));
    }

    // ── compile failures ──────────────────────────────────────────────────

    #[test]
    fn vertex_compile_failure_reports_vertex_stage_and_skips_link() {
        // Both sources are broken; the vertex error must win and it must be a
        // compile error, proving linking was never attempted.
        let catalog = catalog_with("@vertex fn vs_main( {", "@fragment fn fs_main( {");

        let err = ShaderProgram::link(&catalog, "shader_vs", "shader_fs").unwrap_err();
        match err {
            InitError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("expected ShaderCompile, got {other:?}"),
        }
    }

    #[test]
    fn fragment_compile_failure_reports_fragment_stage() {
        let catalog = catalog_with(VS_OK, "@fragment fn fs_main( {");

        let err = ShaderProgram::link(&catalog, "shader_vs", "shader_fs").unwrap_err();
        match err {
            InitError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("expected ShaderCompile, got {other:?}"),
        }
    }

    // ── link failures ─────────────────────────────────────────────────────

    #[test]
    fn two_fragment_shaders_fail_stage_pairing() {
        let vertex = compile(ShaderStage::Fragment, FS_OK).unwrap();
        let fragment = compile(ShaderStage::Fragment, FS_OK).unwrap();

        let err = ShaderProgram::link_compiled(vertex, fragment).unwrap_err();
        match err {
            InitError::ProgramLink { log } => assert!(log.contains("exactly one vertex")),
            other => panic!("expected ProgramLink, got {other:?}"),
        }
    }

    #[test]
    fn missing_vertex_entry_point_fails_link() {
        // Compiles fine as a module, but exposes no @vertex entry.
        let vs = "fn helper() -> f32 { return 1.0; }";
        let catalog = catalog_with(vs, FS_OK);

        let err = ShaderProgram::link(&catalog, "shader_vs", "shader_fs").unwrap_err();
        match err {
            InitError::ProgramLink { log } => assert!(log.contains("vertex entry point")),
            other => panic!("expected ProgramLink, got {other:?}"),
        }
    }

    #[test]
    fn varying_type_mismatch_fails_link() {
        let vs = r#"
            struct VsOut {
                @builtin(position) clip: vec4<f32>,
                @location(0) tint: vec3<f32>,
            };

            @vertex
            fn vs_main(@location(0) position: vec3<f32>) -> VsOut {
                var out: VsOut;
                out.clip = vec4<f32>(position, 1.0);
                out.tint = position;
                return out;
            }
        "#;
        let fs = r#"
            @fragment
            fn fs_main(@location(0) tint: vec4<f32>) -> @location(0) vec4<f32> {
                return tint;
            }
        "#;

        let catalog = catalog_with(vs, fs);
        let err = ShaderProgram::link(&catalog, "shader_vs", "shader_fs").unwrap_err();
        match err {
            InitError::ProgramLink { log } => assert!(log.contains("location 0")),
            other => panic!("expected ProgramLink, got {other:?}"),
        }
    }

    #[test]
    fn unwritten_varying_fails_link() {
        let vs = r#"
            @vertex
            fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(position, 1.0);
            }
        "#;
        let fs = r#"
            @fragment
            fn fs_main(@location(0) tint: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(tint, 1.0);
            }
        "#;

        let catalog = catalog_with(vs, fs);
        let err = ShaderProgram::link(&catalog, "shader_vs", "shader_fs").unwrap_err();
        match err {
            InitError::ProgramLink { log } => assert!(log.contains("writes nothing")),
            other => panic!("expected ProgramLink, got {other:?}"),
        }
    }

    #[test]
    fn missing_position_attribute_fails_link() {
        let vs = r#"
            struct Transforms {
                projection: mat4x4<f32>,
                model_view: mat4x4<f32>,
            };

            @group(0) @binding(0) var<uniform> transforms: Transforms;

            @vertex
            fn vs_main(@location(0) corner: vec3<f32>) -> @builtin(position) vec4<f32> {
                return transforms.projection * vec4<f32>(corner, 1.0);
            }
        "#;

        let catalog = catalog_with(vs, FS_OK);
        let err = ShaderProgram::link(&catalog, "shader_vs", "shader_fs").unwrap_err();
        match err {
            InitError::ProgramLink { log } => assert!(log.contains(POSITION_ATTRIBUTE)),
            other => panic!("expected ProgramLink, got {other:?}"),
        }
    }

    #[test]
    fn missing_transforms_block_fails_link() {
        let vs = r#"
            @vertex
            fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(position, 1.0);
            }
        "#;

        let catalog = catalog_with(vs, FS_OK);
        let err = ShaderProgram::link(&catalog, "shader_vs", "shader_fs").unwrap_err();
        match err {
            InitError::ProgramLink { log } => assert!(log.contains(TRANSFORMS_BLOCK)),
            other => panic!("expected ProgramLink, got {other:?}"),
        }
    }

    #[test]
    fn attribute_in_struct_argument_is_found() {
        let vs = r#"
            struct Transforms {
                projection: mat4x4<f32>,
                model_view: mat4x4<f32>,
            };

            @group(0) @binding(0) var<uniform> transforms: Transforms;

            struct VsIn {
                @location(2) position: vec3<f32>,
            };

            @vertex
            fn vs_main(in: VsIn) -> @builtin(position) vec4<f32> {
                return transforms.projection * transforms.model_view
                    * vec4<f32>(in.position, 1.0);
            }
        "#;

        let catalog = catalog_with(vs, FS_OK);
        let program = ShaderProgram::link(&catalog, "shader_vs", "shader_fs").unwrap();
        assert_eq!(program.position_location, 2);
    }
}
