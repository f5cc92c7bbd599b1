use crate::clock::FrameClock;
use crate::input::InputState;
use dreivy_assets::{AssetError, MeshData, MeshTable};
use dreivy_common::{Entity, MeshHandle};
use dreivy_ecs::{EcsError, World};

/// What init and frame callbacks may touch.
///
/// Borrowed from the engine for the duration of one callback pass.
pub struct Context<'a> {
    pub(crate) world: &'a mut World,
    pub(crate) meshes: &'a mut MeshTable,
    pub(crate) clock: &'a FrameClock,
    pub(crate) input: &'a InputState,
    pub(crate) stop_requested: &'a mut bool,
}

impl Context<'_> {
    pub fn world(&self) -> &World {
        self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }

    pub fn create_entity(&mut self) -> Entity {
        self.world.create_entity()
    }

    pub fn add_component<K: 'static>(&mut self, entity: Entity, value: K) -> Option<K> {
        self.world.add_component(entity, value)
    }

    pub fn has_component<K: 'static>(&self, entity: Entity) -> bool {
        self.world.has_component::<K>(entity)
    }

    pub fn try_get_component<K: 'static>(&self, entity: Entity) -> Option<&K> {
        self.world.try_get_component(entity)
    }

    pub fn try_get_component_mut<K: 'static>(&mut self, entity: Entity) -> Option<&mut K> {
        self.world.try_get_component_mut(entity)
    }

    pub fn get_component<K: 'static>(&self, entity: Entity) -> Result<&K, EcsError> {
        self.world.get_component(entity)
    }

    pub fn get_component_mut<K: 'static>(&mut self, entity: Entity) -> Result<&mut K, EcsError> {
        self.world.get_component_mut(entity)
    }

    /// Store geometry in the CPU mesh table.
    pub fn add_mesh(&mut self, data: MeshData) -> MeshHandle {
        self.meshes.add(data)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Result<&MeshData, AssetError> {
        self.meshes.get(handle)
    }

    /// Seconds since the previous frame (zero on the first).
    pub fn delta_time(&self) -> f32 {
        self.clock.delta()
    }

    /// Seconds since the first frame.
    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    pub fn frame_index(&self) -> u64 {
        self.clock.frame()
    }

    pub fn input(&self) -> &InputState {
        self.input
    }

    /// Ask the frame loop to stop. Observed before the next frame starts.
    pub fn request_stop(&mut self) {
        *self.stop_requested = true;
    }
}
