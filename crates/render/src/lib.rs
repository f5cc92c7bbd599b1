//! Rendering adapter: turns world state into draw instructions.
//!
//! # Invariants
//! - The renderer never mutates world truth; the queue is derived from it.
//! - The queue is rebuilt from scratch every frame, in ascending entity order.
//! - At most one GPU mesh exists per CPU mesh handle.
//!
//! The backend is a trait so the same queue and cache drive wgpu on the
//! desktop and the recording [`HeadlessBackend`] in tests and CLI runs.

mod backend;
mod cache;
mod headless;
mod queue;

pub use backend::{BufferUsage, ClearColor, DrawStats, GraphicsBackend, RenderError};
pub use cache::{GpuMesh, GpuMeshCache, Vertex};
pub use headless::{DrawRecord, HeadlessBackend, HeadlessBuffer};
pub use queue::{RenderItem, RenderQueue, build_render_queue, world_matrix};

pub fn crate_info() -> &'static str {
    "dreivy-render v0.1.0"
}
