//! The scene controller: the linear one-shot initialization sequence.
//!
//! `resolve surface → acquire context → link shaders → build buffers →
//! first draw`. Each step must succeed before the next runs; any failure is
//! terminal and no controller instance is produced. The outcome is recorded
//! once in a process-wide report slot for later inspection.

mod report;

pub use report::{report, ControllerReport};

use std::fmt;
use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::device::{Gpu, GpuInit};
use crate::error::InitError;
use crate::render::{QuadRenderer, RenderCtx, RenderTarget};
use crate::shader::{ShaderCatalog, ShaderProgram};
use crate::window::SurfaceTable;

/// Identifiers consumed by controller construction.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Surface the controller renders to.
    pub surface_id: String,
    /// Catalog id of the vertex shader source.
    pub vertex_source_id: String,
    /// Catalog id of the fragment shader source.
    pub fragment_source_id: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            surface_id: "main".to_string(),
            vertex_source_id: "shader_vs".to_string(),
            fragment_source_id: "shader_fs".to_string(),
        }
    }
}

/// Initialization phases, in order. There are no backward or retry
/// transitions; a failure at any step is terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Uninitialized,
    ContextAcquired,
    ShadersLinked,
    BuffersReady,
    Rendered,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Uninitialized => "uninitialized",
            Phase::ContextAcquired => "context acquired",
            Phase::ShadersLinked => "shaders linked",
            Phase::BuffersReady => "buffers ready",
            Phase::Rendered => "rendered",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Owns the acquired context, the one linked program, and the quad renderer.
///
/// Invariants: the context is acquired exactly once per controller lifetime,
/// exactly one program is ever created, and the vertex buffer is uploaded
/// exactly once.
pub struct SceneController {
    gpu: Gpu,
    program: ShaderProgram,
    quad: QuadRenderer,
    phase: Phase,
}

impl SceneController {
    /// The explicit factory: runs the whole initialization sequence and
    /// performs the initial draw.
    ///
    /// On success the controller has reached [`Phase::Rendered`]. Either way,
    /// the outcome is recorded in the process-wide report slot (first
    /// construction wins).
    pub fn create(
        surfaces: &SurfaceTable<Arc<Window>>,
        catalog: &ShaderCatalog,
        config: &ControllerConfig,
        gpu_init: GpuInit,
    ) -> Result<Self, InitError> {
        match Self::init(surfaces, catalog, config, gpu_init) {
            Ok(controller) => {
                report::record_success(&controller);
                Ok(controller)
            }
            Err(err) => {
                report::record_failure(&err);
                Err(err)
            }
        }
    }

    fn init(
        surfaces: &SurfaceTable<Arc<Window>>,
        catalog: &ShaderCatalog,
        config: &ControllerConfig,
        gpu_init: GpuInit,
    ) -> Result<Self, InitError> {
        let window = surfaces.resolve(&config.surface_id)?;

        let gpu = pollster::block_on(Gpu::acquire(Arc::clone(window), gpu_init))?;
        log::debug!("phase: {}", Phase::ContextAcquired);

        let program = ShaderProgram::link(
            catalog,
            &config.vertex_source_id,
            &config.fragment_source_id,
        )?;
        log::debug!("phase: {}", Phase::ShadersLinked);

        let quad = {
            let ctx = RenderCtx::new(
                gpu.device(),
                gpu.queue(),
                gpu.surface_format(),
                gpu.size(),
            );
            QuadRenderer::new(&ctx, &program)?
        };
        log::debug!("phase: {}", Phase::BuffersReady);

        let mut controller = Self {
            gpu,
            program,
            quad,
            phase: Phase::BuffersReady,
        };

        controller.draw_scene().map_err(|e| InitError::ContextAcquisition {
            reason: format!("failed to acquire the first frame: {e}"),
        })?;
        controller.phase = Phase::Rendered;
        log::debug!("phase: {}", Phase::Rendered);

        Ok(controller)
    }

    /// Draws the scene once. Deterministic; safe to re-run when the window
    /// system asks for a fresh presentation.
    pub fn draw_scene(&self) -> Result<(), wgpu::SurfaceError> {
        let mut frame = self.gpu.begin_frame()?;

        {
            let ctx = RenderCtx::new(
                self.gpu.device(),
                self.gpu.queue(),
                self.gpu.surface_format(),
                self.gpu.size(),
            );
            let mut target =
                RenderTarget::new(&mut frame.encoder, &frame.view, self.gpu.depth_view());
            self.quad.render(&ctx, &mut target);
        }

        self.gpu.submit(frame);
        Ok(())
    }

    /// Reconfigures the surface after a window resize.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    /// Phase reached by the initialization sequence.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The one linked program.
    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_ordered() {
        assert!(Phase::Uninitialized < Phase::ContextAcquired);
        assert!(Phase::ContextAcquired < Phase::ShadersLinked);
        assert!(Phase::ShadersLinked < Phase::BuffersReady);
        assert!(Phase::BuffersReady < Phase::Rendered);
    }

    #[test]
    fn default_config_uses_the_original_identifiers() {
        let config = ControllerConfig::default();
        assert_eq!(config.vertex_source_id, "shader_vs");
        assert_eq!(config.fragment_source_id, "shader_fs");
    }
}
