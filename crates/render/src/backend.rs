use crate::cache::{GpuMesh, GpuMeshCache};
use crate::queue::{RenderItem, RenderQueue};
use dreivy_assets::MeshTable;
use dreivy_common::MeshHandle;
use std::sync::Arc;

/// Errors raised by a graphics backend or the GPU mesh cache.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{0} is not in the CPU mesh table")]
    UnknownMesh(MeshHandle),
    #[error("GPU allocation failed: {0}")]
    GpuAllocationFailed(String),
    #[error("backend initialization failed: {0}")]
    BackendInit(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("draw submitted outside begin_frame/end_frame")]
    NoFrameInProgress,
    #[error("backend is not initialized")]
    NotInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
}

/// RGBA clear color, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl From<[f32; 4]> for ClearColor {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::from([0.1, 0.1, 0.15, 1.0])
    }
}

/// Counters for one queue submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draws: u32,
    pub uploads: u32,
    pub indices: u64,
}

/// Renderer-agnostic device interface.
///
/// One frame is `begin_frame`, any number of `draw_mesh` calls, then
/// `end_frame`. Buffer creation is the only allocation primitive the GPU
/// mesh cache needs.
pub trait GraphicsBackend {
    /// What the window hands over to create a presentable surface.
    type Surface;
    /// Device-resident buffer.
    type Buffer;

    fn init(&mut self, surface: Self::Surface, width: u32, height: u32) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32);

    fn begin_frame(&mut self, clear: ClearColor) -> Result<(), RenderError>;

    fn create_buffer(
        &mut self,
        usage: BufferUsage,
        label: &str,
        contents: &[u8],
    ) -> Result<Self::Buffer, RenderError>;

    fn draw_mesh(
        &mut self,
        mesh: &Arc<GpuMesh<Self::Buffer>>,
        item: &RenderItem,
    ) -> Result<(), RenderError>;

    /// Finish the frame and present it.
    fn end_frame(&mut self) -> Result<(), RenderError>;

    /// Release device resources. Safe to call more than once.
    fn shutdown(&mut self);

    /// Draw every queued item, resolving meshes through `cache`.
    ///
    /// Items are submitted one by one in queue order; there is no batching.
    fn draw(
        &mut self,
        queue: &RenderQueue,
        cache: &mut GpuMeshCache<Self::Buffer>,
        meshes: &MeshTable,
    ) -> Result<DrawStats, RenderError>
    where
        Self: Sized,
    {
        let mut stats = DrawStats::default();
        for item in queue.items() {
            let uploads_before = cache.upload_count();
            let mesh = cache.resolve(item.mesh, meshes, self)?;
            stats.uploads += (cache.upload_count() - uploads_before) as u32;
            self.draw_mesh(&mesh, item)?;
            stats.draws += 1;
            stats.indices += u64::from(mesh.index_count);
        }
        Ok(stats)
    }
}
