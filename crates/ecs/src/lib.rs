//! Minimal ECS-style component model.
//!
//! Each component kind has its own storage keyed by [`Entity`], held inside
//! an owned [`ComponentStore`]. There is no process-wide state: two worlds
//! never share component data.
//!
//! # Invariants
//! - At most one value per (entity, kind) pair; adding again overwrites.
//! - Presence of a kind for an entity is independent of every other kind.
//! - Iteration over one kind is in ascending entity order (BTreeMap).

mod components;
mod world;

pub use components::{Mesh, Name};
pub use dreivy_common::{Entity, MeshHandle, Transform};
pub use world::World;

use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Errors from component access.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EcsError {
    #[error("{entity} has no {kind} component")]
    MissingComponent { entity: Entity, kind: &'static str },
}

/// Type-erased view of one kind's storage.
trait ErasedStorage {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn kind_name(&self) -> &'static str;
    fn len(&self) -> usize;
}

struct Storage<K> {
    entries: BTreeMap<Entity, K>,
}

impl<K: 'static> ErasedStorage for Storage<K> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind_name(&self) -> &'static str {
        type_name::<K>()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Component storage for every kind registered in one world.
///
/// A kind's storage is created on first insert.
#[derive(Default)]
pub struct ComponentStore {
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn storage<K: 'static>(&self) -> Option<&Storage<K>> {
        self.storages
            .get(&TypeId::of::<K>())
            .and_then(|s| s.as_any().downcast_ref::<Storage<K>>())
    }

    fn storage_mut<K: 'static>(&mut self) -> Option<&mut Storage<K>> {
        self.storages
            .get_mut(&TypeId::of::<K>())
            .and_then(|s| s.as_any_mut().downcast_mut::<Storage<K>>())
    }

    /// Insert or overwrite the `K` component of `entity`. Returns the previous value.
    pub fn insert<K: 'static>(&mut self, entity: Entity, value: K) -> Option<K> {
        if let Some(storage) = self.storage_mut::<K>() {
            return storage.entries.insert(entity, value);
        }
        let mut entries = BTreeMap::new();
        entries.insert(entity, value);
        self.storages
            .insert(TypeId::of::<K>(), Box::new(Storage { entries }));
        None
    }

    pub fn remove<K: 'static>(&mut self, entity: Entity) -> Option<K> {
        self.storage_mut::<K>()
            .and_then(|s| s.entries.remove(&entity))
    }

    pub fn contains<K: 'static>(&self, entity: Entity) -> bool {
        self.storage::<K>()
            .is_some_and(|s| s.entries.contains_key(&entity))
    }

    pub fn get<K: 'static>(&self, entity: Entity) -> Option<&K> {
        self.storage::<K>().and_then(|s| s.entries.get(&entity))
    }

    pub fn get_mut<K: 'static>(&mut self, entity: Entity) -> Option<&mut K> {
        self.storage_mut::<K>()
            .and_then(|s| s.entries.get_mut(&entity))
    }

    /// All `K` components in ascending entity order.
    pub fn iter<K: 'static>(&self) -> impl Iterator<Item = (Entity, &K)> {
        self.storage::<K>()
            .into_iter()
            .flat_map(|s| s.entries.iter().map(|(e, k)| (*e, k)))
    }

    /// Number of entities carrying a `K` component.
    pub fn len<K: 'static>(&self) -> usize {
        self.storage::<K>().map_or(0, |s| s.entries.len())
    }

    /// Number of component kinds that have ever been inserted.
    pub fn kind_count(&self) -> usize {
        self.storages.len()
    }
}

impl fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for storage in self.storages.values() {
            map.entry(&storage.kind_name(), &storage.len());
        }
        map.finish()
    }
}

pub fn crate_info() -> &'static str {
    "dreivy-ecs v0.1.0"
}
