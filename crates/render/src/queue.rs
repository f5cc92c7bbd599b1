use dreivy_assets::MeshTable;
use dreivy_common::{Entity, MeshHandle, Transform};
use dreivy_ecs::{Mesh, World};
use glam::{EulerRot, Mat4, Quat};

/// One draw instruction. Built fresh each frame, never kept across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderItem {
    pub world: Mat4,
    pub mesh: MeshHandle,
    pub entity: Entity,
}

/// Ordered draw instructions for the current frame.
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    items: Vec<RenderItem>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, item: RenderItem) {
        self.items.push(item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Clear and refill from current world state. See [`build_render_queue`].
    pub fn rebuild(&mut self, world: &World, meshes: &MeshTable) -> usize {
        build_render_queue(world, meshes, self)
    }
}

/// World matrix for a transform: scale first, then rotation, then translation.
///
/// Rotation applies roll (z), then pitch (x), then yaw (y). glam matrices are
/// column-major and act on column vectors, so this is `T * R * S`.
pub fn world_matrix(transform: &Transform) -> Mat4 {
    let r = transform.rotation;
    let rotation = Quat::from_euler(EulerRot::YXZ, r.y, r.x, r.z);
    Mat4::from_scale_rotation_translation(transform.scale, rotation, transform.position)
}

/// Rebuild `queue` from every entity carrying both a `Transform` and a `Mesh`.
///
/// Visits ids `1..=world.entity_count()` so the most recently created entity
/// is included. Entities lacking either component, or whose handle is invalid
/// or unknown to `meshes`, are skipped. Returns the number of items queued.
pub fn build_render_queue(world: &World, meshes: &MeshTable, queue: &mut RenderQueue) -> usize {
    let _span = tracing::trace_span!("build_render_queue").entered();
    queue.clear();

    for entity in world.entities() {
        let (Some(transform), Some(mesh)) = (
            world.try_get_component::<Transform>(entity),
            world.try_get_component::<Mesh>(entity),
        ) else {
            continue;
        };
        if !mesh.handle.is_valid() {
            continue;
        }
        if !meshes.contains(mesh.handle) {
            tracing::debug!(%entity, handle = %mesh.handle, "skipping unknown mesh handle");
            continue;
        }
        queue.submit(RenderItem {
            world: world_matrix(transform),
            mesh: mesh.handle,
            entity,
        });
    }

    queue.len()
}
