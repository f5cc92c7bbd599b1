//! wgpu render backend.
//!
//! Implements [`dreivy_render::GraphicsBackend`] on top of a wgpu surface:
//! one pipeline, one draw call per queued item, a fixed look-at camera.
//!
//! # Invariants
//! - Draws are recorded between `begin_frame` and `end_frame` and submitted
//!   in one command buffer at `end_frame`.
//! - A lost or outdated surface is reconfigured, never fatal.

mod backend;
mod camera;
mod shaders;

pub use backend::WgpuBackend;
pub use camera::Camera;
