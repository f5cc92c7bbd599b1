use crate::backend::{BufferUsage, GraphicsBackend, RenderError};
use bytemuck::{Pod, Zeroable};
use dreivy_assets::{MeshData, MeshTable};
use dreivy_common::MeshHandle;
use std::collections::HashMap;
use std::sync::Arc;

/// Vertex layout uploaded for every mesh.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

/// Device-resident copy of one CPU mesh. Owned by [`GpuMeshCache`].
#[derive(Debug)]
pub struct GpuMesh<B> {
    pub source: MeshHandle,
    pub vertex_buffer: B,
    pub index_buffer: B,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// Lazily uploaded GPU meshes, keyed by the CPU handle they came from.
///
/// Because CPU geometry never changes under a handle, an entry is never
/// refreshed and lives until [`clear`](Self::clear) at device teardown.
#[derive(Debug)]
pub struct GpuMeshCache<B> {
    meshes: HashMap<MeshHandle, Arc<GpuMesh<B>>>,
    uploads: u64,
}

impl<B> Default for GpuMeshCache<B> {
    fn default() -> Self {
        Self {
            meshes: HashMap::new(),
            uploads: 0,
        }
    }
}

impl<B> GpuMeshCache<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve-or-create: return the cached GPU mesh for `handle`, uploading
    /// it through `backend` on first use.
    ///
    /// Callers are expected to pass handles that came from `table`; an unknown
    /// handle is an upstream bug and yields [`RenderError::UnknownMesh`]. On
    /// allocation failure nothing is cached.
    pub fn resolve<G>(
        &mut self,
        handle: MeshHandle,
        table: &MeshTable,
        backend: &mut G,
    ) -> Result<Arc<GpuMesh<B>>, RenderError>
    where
        G: GraphicsBackend<Buffer = B>,
    {
        if let Some(mesh) = self.meshes.get(&handle) {
            return Ok(Arc::clone(mesh));
        }

        let cpu = table.get(handle).map_err(|e| {
            tracing::error!("cannot upload: {e}");
            RenderError::UnknownMesh(handle)
        })?;
        let mesh = Arc::new(upload(handle, cpu, backend)?);
        self.meshes.insert(handle, Arc::clone(&mesh));
        self.uploads += 1;
        tracing::debug!(
            %handle,
            vertices = mesh.vertex_count,
            indices = mesh.index_count,
            "mesh uploaded"
        );
        Ok(mesh)
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&Arc<GpuMesh<B>>> {
        self.meshes.get(&handle)
    }

    pub fn contains(&self, handle: MeshHandle) -> bool {
        self.meshes.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Total uploads performed since creation.
    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    /// Drop every cached mesh. Used at device teardown.
    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}

fn upload<G: GraphicsBackend>(
    handle: MeshHandle,
    cpu: &MeshData,
    backend: &mut G,
) -> Result<GpuMesh<G::Buffer>, RenderError> {
    let vertices: Vec<Vertex> = cpu
        .positions
        .iter()
        .map(|p| Vertex {
            position: p.to_array(),
        })
        .collect();

    let vertex_buffer = backend.create_buffer(
        BufferUsage::Vertex,
        &format!("mesh_{}_vertices", handle.0),
        bytemuck::cast_slice(&vertices),
    )?;
    let index_buffer = backend.create_buffer(
        BufferUsage::Index,
        &format!("mesh_{}_indices", handle.0),
        bytemuck::cast_slice(&cpu.indices),
    )?;

    Ok(GpuMesh {
        source: handle,
        vertex_buffer,
        index_buffer,
        vertex_count: vertices.len() as u32,
        index_count: cpu.indices.len() as u32,
    })
}
