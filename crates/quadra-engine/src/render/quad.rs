use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::device::DEPTH_FORMAT;
use crate::error::InitError;
use crate::shader::ShaderProgram;
use crate::transform::TransformsUniform;

use super::{RenderCtx, RenderTarget};

/// Fixed clear color: opaque black.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// One quad vertex: a three-component position, Z = 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
}

/// The static quad: two triangles in the XY plane, drawn as a 4-vertex strip.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [1.0, 1.0, 0.0] },
    QuadVertex { position: [-1.0, 1.0, 0.0] },
    QuadVertex { position: [1.0, -1.0, 0.0] },
    QuadVertex { position: [-1.0, -1.0, 0.0] },
];

/// Renderer for the static quad.
///
/// Owns the one pipeline built from the linked program, the immutable vertex
/// buffer (uploaded exactly once), and the transform uniform buffer. None of
/// these are ever replaced after construction.
pub struct QuadRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    transforms_ubo: wgpu::Buffer,
}

impl QuadRenderer {
    /// Builds the pipeline and static buffers from a linked program.
    ///
    /// Backend pipeline validation runs under an error scope; a validation
    /// failure here is a link-stage failure and maps to
    /// [`InitError::ProgramLink`].
    pub fn new(ctx: &RenderCtx<'_>, program: &ShaderProgram) -> Result<Self, InitError> {
        // Only bind group 0 is used; the reflected block must live there.
        if program.transforms_group != 0 {
            return Err(InitError::ProgramLink {
                log: format!(
                    "transforms block must live in bind group 0, found group {}",
                    program.transforms_group
                ),
            });
        }

        let error_scope = ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vs_module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quadra vertex shader"),
            source: wgpu::ShaderSource::Wgsl(program.vertex.source.as_str().into()),
        });

        let fs_module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quadra fragment shader"),
            source: wgpu::ShaderSource::Wgsl(program.fragment.source.as_str().into()),
        });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("quadra transforms bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: program.transforms_binding,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: Some(transforms_min_binding_size()),
                        },
                        count: None,
                    }],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("quadra pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        // Attribute slot comes from reflection, so the layout is built by hand
        // instead of through vertex_attr_array!.
        let vertex_attrs = [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: program.position_location,
        }];

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("quadra quad pipeline"),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &vs_module,
                    entry_point: Some(&program.vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<QuadVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &vertex_attrs,
                    }],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &fs_module,
                    entry_point: Some(&program.fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                // Near things obscure far things.
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            });

        // Uploaded once, immutable thereafter.
        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("quadra quad vbo"),
                contents: bytemuck::cast_slice(&QUAD_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let transforms_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quadra transforms ubo"),
            size: std::mem::size_of::<TransformsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quadra transforms bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: program.transforms_binding,
                resource: transforms_ubo.as_entire_binding(),
            }],
        });

        if let Some(err) = pollster::block_on(error_scope.pop()) {
            return Err(InitError::ProgramLink {
                log: err.to_string(),
            });
        }

        Ok(Self {
            pipeline,
            bind_group,
            vertex_buffer,
            transforms_ubo,
        })
    }

    /// Draws the scene once into `target`.
    ///
    /// Clears color and depth, recomputes both matrices from the fixed
    /// constants and the current drawable size, uploads them, and issues a
    /// single 4-vertex triangle-strip draw.
    pub fn render(&self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let uniform =
            TransformsUniform::for_size(ctx.size.width as f32, ctx.size.height as f32);
        ctx.queue
            .write_buffer(&self.transforms_ubo, 0, bytemuck::bytes_of(&uniform));

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("quadra scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
    }
}

fn transforms_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<TransformsUniform>() as u64)
        .expect("TransformsUniform has non-zero size by construction")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_is_four_vertices_in_the_xy_plane() {
        assert_eq!(QUAD_VERTICES.len(), 4);
        for v in &QUAD_VERTICES {
            assert_eq!(v.position[2], 0.0);
        }
    }

    #[test]
    fn quad_vertex_order_forms_a_strip() {
        // (+,+), (-,+), (+,-), (-,-) — two triangles sharing the middle edge.
        assert_eq!(QUAD_VERTICES[0].position, [1.0, 1.0, 0.0]);
        assert_eq!(QUAD_VERTICES[1].position, [-1.0, 1.0, 0.0]);
        assert_eq!(QUAD_VERTICES[2].position, [1.0, -1.0, 0.0]);
        assert_eq!(QUAD_VERTICES[3].position, [-1.0, -1.0, 0.0]);
    }

    #[test]
    fn vertex_stride_is_three_floats() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 12);
    }
}
