use crate::backend::{BufferUsage, ClearColor, GraphicsBackend, RenderError};
use crate::cache::GpuMesh;
use crate::queue::RenderItem;
use dreivy_common::{Entity, MeshHandle};
use glam::Mat4;
use std::fmt::Write as _;
use std::sync::Arc;

/// Buffer "allocated" by [`HeadlessBackend`]: just an id and a byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessBuffer {
    pub id: u64,
    pub usage: BufferUsage,
    pub len: usize,
}

/// One recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRecord {
    pub entity: Entity,
    pub mesh: MeshHandle,
    pub world: Mat4,
    pub index_count: u32,
}

/// Backend that records what it is asked to do instead of touching a GPU.
///
/// Useful for CLI output, logging and for testing the frame loop: it counts
/// buffer creations and keeps the draws of the last completed frame. It can be
/// configured to fail initialization or allocation.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    initialized: bool,
    fail_init: bool,
    fail_allocations: bool,
    width: u32,
    height: u32,
    buffers_created: u64,
    frames_completed: u64,
    resizes: Vec<(u32, u32)>,
    shutdowns: u32,
    frame: Option<Vec<DrawRecord>>,
    last_clear: Option<ClearColor>,
    last_frame: Vec<DrawRecord>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `init` fail.
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Make every `create_buffer` fail.
    pub fn failing_allocations(mut self) -> Self {
        self.fail_allocations = true;
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn buffers_created(&self) -> u64 {
        self.buffers_created
    }

    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    pub fn resizes(&self) -> &[(u32, u32)] {
        &self.resizes
    }

    pub fn shutdown_count(&self) -> u32 {
        self.shutdowns
    }

    pub fn last_clear(&self) -> Option<ClearColor> {
        self.last_clear
    }

    pub fn last_frame_draws(&self) -> &[DrawRecord] {
        &self.last_frame
    }

    /// Human-readable dump of the last completed frame.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}) ===",
            self.frames_completed, self.width, self.height
        );
        let _ = writeln!(
            out,
            "Draws: {}  Buffers: {}",
            self.last_frame.len(),
            self.buffers_created
        );
        for draw in &self.last_frame {
            let p = draw.world.w_axis;
            let _ = writeln!(
                out,
                "  [{}] {} indices={} pos=({:.2}, {:.2}, {:.2})",
                draw.entity, draw.mesh, draw.index_count, p.x, p.y, p.z
            );
        }
        out
    }
}

impl GraphicsBackend for HeadlessBackend {
    type Surface = ();
    type Buffer = HeadlessBuffer;

    fn init(&mut self, _surface: (), width: u32, height: u32) -> Result<(), RenderError> {
        if self.fail_init {
            return Err(RenderError::BackendInit("headless init disabled".into()));
        }
        self.initialized = true;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.resizes.push((width, height));
    }

    fn begin_frame(&mut self, clear: ClearColor) -> Result<(), RenderError> {
        if !self.initialized {
            return Err(RenderError::NotInitialized);
        }
        self.last_clear = Some(clear);
        self.frame = Some(Vec::new());
        Ok(())
    }

    fn create_buffer(
        &mut self,
        usage: BufferUsage,
        label: &str,
        contents: &[u8],
    ) -> Result<HeadlessBuffer, RenderError> {
        if !self.initialized {
            return Err(RenderError::NotInitialized);
        }
        if self.fail_allocations {
            return Err(RenderError::GpuAllocationFailed(format!(
                "{label}: allocation disabled"
            )));
        }
        self.buffers_created += 1;
        Ok(HeadlessBuffer {
            id: self.buffers_created,
            usage,
            len: contents.len(),
        })
    }

    fn draw_mesh(
        &mut self,
        mesh: &Arc<GpuMesh<HeadlessBuffer>>,
        item: &RenderItem,
    ) -> Result<(), RenderError> {
        let frame = self.frame.as_mut().ok_or(RenderError::NoFrameInProgress)?;
        frame.push(DrawRecord {
            entity: item.entity,
            mesh: item.mesh,
            world: item.world,
            index_count: mesh.index_count,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        let draws = self.frame.take().ok_or(RenderError::NoFrameInProgress)?;
        self.last_frame = draws;
        self.frames_completed += 1;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.initialized = false;
        self.frame = None;
        self.shutdowns += 1;
    }
}
