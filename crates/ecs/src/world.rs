use crate::{ComponentStore, EcsError};
use dreivy_common::Entity;
use std::any::type_name;

/// Entity allocation plus the component store of one world.
///
/// There is no entity registry beyond the id counter: an entity "exists" when
/// some component references it. Entity destruction is not supported, so ids
/// `1..=entity_count()` cover every entity that was ever created.
#[derive(Debug, Default)]
pub struct World {
    last_entity: u32,
    components: ComponentStore,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new id. No component is attached.
    ///
    /// # Panics
    /// Panics if the `u32` id space is exhausted, since ids are never reused.
    pub fn create_entity(&mut self) -> Entity {
        self.last_entity = self
            .last_entity
            .checked_add(1)
            .unwrap_or_else(|| panic!("entity id space exhausted"));
        let entity = Entity(self.last_entity);
        tracing::trace!(%entity, "entity created");
        entity
    }

    /// Highest id issued so far (`0` before the first creation).
    pub fn entity_count(&self) -> u32 {
        self.last_entity
    }

    /// Every issued id, ascending, last-issued included.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + use<> {
        (1..=self.last_entity).map(Entity)
    }

    /// Insert or overwrite the `K` component of `entity`.
    ///
    /// No check is made that `entity` was issued by this world.
    pub fn add_component<K: 'static>(&mut self, entity: Entity, value: K) -> Option<K> {
        self.components.insert(entity, value)
    }

    pub fn remove_component<K: 'static>(&mut self, entity: Entity) -> Option<K> {
        self.components.remove(entity)
    }

    pub fn has_component<K: 'static>(&self, entity: Entity) -> bool {
        self.components.contains::<K>(entity)
    }

    pub fn try_get_component<K: 'static>(&self, entity: Entity) -> Option<&K> {
        self.components.get(entity)
    }

    pub fn try_get_component_mut<K: 'static>(&mut self, entity: Entity) -> Option<&mut K> {
        self.components.get_mut(entity)
    }

    /// Like [`try_get_component`](Self::try_get_component), but a missing pair
    /// is a caller bug reported as [`EcsError::MissingComponent`].
    pub fn get_component<K: 'static>(&self, entity: Entity) -> Result<&K, EcsError> {
        self.components
            .get(entity)
            .ok_or_else(|| missing::<K>(entity))
    }

    pub fn get_component_mut<K: 'static>(&mut self, entity: Entity) -> Result<&mut K, EcsError> {
        self.components
            .get_mut(entity)
            .ok_or_else(|| missing::<K>(entity))
    }

    /// Read-only access to the underlying store.
    pub fn components(&self) -> &ComponentStore {
        &self.components
    }
}

fn missing<K>(entity: Entity) -> EcsError {
    EcsError::MissingComponent {
        entity,
        kind: type_name::<K>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mesh, Name};
    use dreivy_common::{MeshHandle, Transform};
    use glam::Vec3;

    #[test]
    fn world_starts_empty() {
        let w = World::new();
        assert_eq!(w.entity_count(), 0);
        assert_eq!(w.entities().count(), 0);
    }

    #[test]
    fn ids_strictly_increase_and_skip_zero() {
        let mut w = World::new();
        let mut prev = Entity::INVALID;
        for _ in 0..100 {
            let e = w.create_entity();
            assert!(e.is_valid());
            assert!(e > prev);
            prev = e;
        }
        assert_eq!(w.entity_count(), 100);
    }

    #[test]
    fn create_entity_attaches_nothing() {
        let mut w = World::new();
        let e = w.create_entity();
        assert!(!w.has_component::<Transform>(e));
        assert!(!w.has_component::<Mesh>(e));
        assert_eq!(w.components().kind_count(), 0);
    }

    #[test]
    fn entities_include_last_issued() {
        let mut w = World::new();
        let _a = w.create_entity();
        let b = w.create_entity();
        assert_eq!(w.entities().last(), Some(b));
    }

    #[test]
    fn try_get_returns_last_written_value() {
        let mut w = World::new();
        let entities: Vec<Entity> = (0..8).map(|_| w.create_entity()).collect();

        // Interleave writes across entities and kinds, tracking what was last written.
        let mut expected = vec![None; entities.len()];
        for step in 0..40u32 {
            let idx = (step as usize * 5) % entities.len();
            let t = Transform::from_position(Vec3::splat(step as f32));
            w.add_component(entities[idx], t);
            expected[idx] = Some(t);
            if step % 3 == 0 {
                w.add_component(entities[idx], Mesh::new(MeshHandle(step)));
            }
        }

        for (e, want) in entities.iter().zip(&expected) {
            assert_eq!(w.try_get_component::<Transform>(*e).copied(), *want);
            assert!(w.try_get_component::<Name>(*e).is_none());
        }
    }

    #[test]
    fn get_component_missing_is_error() {
        let mut w = World::new();
        let e = w.create_entity();
        let err = w.get_component::<Mesh>(e).unwrap_err();
        assert!(matches!(err, EcsError::MissingComponent { entity, .. } if entity == e));
        assert!(err.to_string().contains("Mesh"));
    }

    #[test]
    fn get_component_mut_edits_in_place() {
        let mut w = World::new();
        let e = w.create_entity();
        w.add_component(e, Transform::default());
        w.get_component_mut::<Transform>(e).unwrap().scale = Vec3::splat(2.0);
        assert_eq!(w.get_component::<Transform>(e).unwrap().scale, Vec3::splat(2.0));
    }

    #[test]
    fn add_component_for_unissued_entity_is_accepted() {
        let mut w = World::new();
        w.add_component(Entity(42), Name::from("orphan"));
        assert!(w.has_component::<Name>(Entity(42)));
        assert_eq!(w.entity_count(), 0);
    }

    #[test]
    fn remove_component_leaves_other_kinds() {
        let mut w = World::new();
        let e = w.create_entity();
        w.add_component(e, Transform::default());
        w.add_component(e, Mesh::default());
        assert!(w.remove_component::<Mesh>(e).is_some());
        assert!(w.has_component::<Transform>(e));
        assert!(!w.has_component::<Mesh>(e));
    }
}
