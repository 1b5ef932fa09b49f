use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::controller::{ControllerConfig, SceneController};
use crate::device::GpuInit;
use crate::error::InitError;
use crate::shader::ShaderCatalog;

use super::SurfaceTable;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Identifier under which the window is published in the surface table.
    pub surface_id: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "quadra".to_string(),
            initial_size: LogicalSize::new(640.0, 480.0),
            surface_id: "main".to_string(),
        }
    }
}

/// One-shot runtime: creates the single window, bootstraps the controller on
/// the first redraw, and then only services window housekeeping (resize,
/// re-present, close). There is no simulation loop and no input handling.
pub struct Runtime;

impl Runtime {
    /// Runs the event loop until the window closes or initialization fails.
    ///
    /// A controller construction failure is returned to the caller after the
    /// loop exits; the report slot carries the same outcome for inspection.
    pub fn run(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        catalog: ShaderCatalog,
        controller_config: ControllerConfig,
    ) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = BootState::new(config, gpu_init, catalog, controller_config);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        if let Some(err) = state.failure.take() {
            return Err(err).context("controller initialization failed");
        }

        Ok(())
    }
}

struct BootState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    catalog: ShaderCatalog,
    controller_config: ControllerConfig,

    surfaces: SurfaceTable<Arc<Window>>,
    window: Option<Arc<Window>>,
    controller: Option<SceneController>,
    failure: Option<InitError>,
}

impl BootState {
    fn new(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        catalog: ShaderCatalog,
        controller_config: ControllerConfig,
    ) -> Self {
        Self {
            config,
            gpu_init,
            catalog,
            controller_config,
            surfaces: SurfaceTable::new(),
            window: None,
            controller: None,
            failure: None,
        }
    }

    /// Constructs the controller, which performs the whole initialization
    /// sequence including the initial draw.
    fn bootstrap(&mut self, event_loop: &ActiveEventLoop) {
        match SceneController::create(
            &self.surfaces,
            &self.catalog,
            &self.controller_config,
            self.gpu_init.clone(),
        ) {
            Ok(controller) => {
                log::info!(
                    "controller initialized, phase: {}, attribute location: {}",
                    controller.phase(),
                    controller.program().position_location
                );
                self.controller = Some(controller);
            }
            Err(err) => {
                log::error!("controller initialization failed: {err}");
                self.failure = Some(err);
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for BootState {
    /// The "content ready" one-shot: create and publish the single window.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                self.failure = Some(InitError::ContextAcquisition {
                    reason: format!("failed to create window: {e}"),
                });
                event_loop.exit();
                return;
            }
        };

        self.surfaces
            .publish(self.config.surface_id.clone(), Arc::clone(&window));
        window.request_redraw();
        self.window = Some(window);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // One-shot: nothing schedules work, so wait for window events.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(new_size) => {
                if let Some(controller) = self.controller.as_mut() {
                    controller.resize(new_size);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                if self.failure.is_some() {
                    return;
                }

                if self.controller.is_none() {
                    self.bootstrap(event_loop);
                    return;
                }

                // Initialization already drew the scene; this only re-presents
                // it when the window system discards the previous frame.
                let Some(controller) = self.controller.as_mut() else {
                    return;
                };
                if let Err(err) = controller.draw_scene() {
                    match err {
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                            if let Some(window) = &self.window {
                                controller.resize(window.inner_size());
                            }
                        }
                        wgpu::SurfaceError::OutOfMemory => {
                            log::error!("surface out of memory");
                            event_loop.exit();
                        }
                        other => log::warn!("skipping frame: {other}"),
                    }
                }
            }

            _ => {}
        }
    }
}
