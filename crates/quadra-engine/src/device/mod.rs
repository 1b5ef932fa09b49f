//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue, with a fallback adapter
//!   when the preferred one is unavailable
//! - configuring the surface at full-window size and owning the depth buffer
//! - acquiring frames and providing encoders/views for rendering

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit, DEPTH_FORMAT};
