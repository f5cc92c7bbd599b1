//! CPU-side mesh table.
//!
//! Geometry is appended once and addressed by a 1-based [`MeshHandle`]. The
//! renderer and GPU cache consume meshes by handle, never by value.
//!
//! # Invariants
//! - Handle `n` is issued for the `n`-th insertion; handles never change meaning.
//! - Stored geometry is immutable. New geometry means a new handle.

pub mod primitives;

pub use dreivy_common::MeshHandle;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Indexed triangle-list geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Check that every index references an existing vertex.
    pub fn validate(&self) -> Result<(), AssetError> {
        let vertex_count = self.positions.len();
        match self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            Some(&index) => Err(AssetError::IndexOutOfRange {
                index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }
}

/// Errors from mesh table operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("no mesh stored under {0}")]
    InvalidHandle(MeshHandle),
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Append-only table of CPU meshes.
#[derive(Debug, Clone, Default)]
pub struct MeshTable {
    meshes: Vec<MeshData>,
}

impl MeshTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` and return its handle (`previous_count + 1`).
    pub fn add(&mut self, data: MeshData) -> MeshHandle {
        if let Err(e) = data.validate() {
            tracing::warn!("storing malformed mesh: {e}");
        }
        self.meshes.push(data);
        let handle = MeshHandle(self.meshes.len() as u32);
        tracing::debug!(%handle, "mesh added");
        handle
    }

    /// Look up a handle. `INVALID` and out-of-range handles are not found.
    pub fn get(&self, handle: MeshHandle) -> Result<&MeshData, AssetError> {
        let index = (handle.0 as usize)
            .checked_sub(1)
            .ok_or(AssetError::InvalidHandle(handle))?;
        self.meshes
            .get(index)
            .ok_or(AssetError::InvalidHandle(handle))
    }

    pub fn contains(&self, handle: MeshHandle) -> bool {
        self.get(handle).is_ok()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Every stored mesh with its handle, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (MeshHandle, &MeshData)> {
        self.meshes
            .iter()
            .enumerate()
            .map(|(i, m)| (MeshHandle(i as u32 + 1), m))
    }
}

pub fn crate_info() -> &'static str {
    "dreivy-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2])
    }

    #[test]
    fn handles_are_one_based_and_sequential() {
        let mut table = MeshTable::new();
        assert_eq!(table.add(triangle()), MeshHandle(1));
        assert_eq!(table.add(primitives::unit_cube()), MeshHandle(2));
        assert_eq!(table.add(triangle()), MeshHandle(3));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn get_resolves_exactly_issued_range() {
        let mut table = MeshTable::new();
        let n = 5;
        for _ in 0..n {
            table.add(triangle());
        }
        for h in 1..=n {
            assert!(table.get(MeshHandle(h)).is_ok());
        }
        assert_eq!(
            table.get(MeshHandle::INVALID),
            Err(AssetError::InvalidHandle(MeshHandle::INVALID))
        );
        assert_eq!(
            table.get(MeshHandle(n + 1)),
            Err(AssetError::InvalidHandle(MeshHandle(n + 1)))
        );
    }

    #[test]
    fn empty_table_finds_nothing() {
        let table = MeshTable::new();
        assert!(table.is_empty());
        assert!(!table.contains(MeshHandle(1)));
    }

    #[test]
    fn stored_geometry_is_returned_unchanged() {
        let mut table = MeshTable::new();
        let h = table.add(primitives::test_box());
        assert_eq!(table.get(h).unwrap(), &primitives::test_box());
    }

    #[test]
    fn iter_pairs_handles_with_meshes() {
        let mut table = MeshTable::new();
        table.add(triangle());
        table.add(primitives::unit_cube());
        let handles: Vec<MeshHandle> = table.iter().map(|(h, _)| h).collect();
        assert_eq!(handles, vec![MeshHandle(1), MeshHandle(2)]);
    }

    #[test]
    fn validate_rejects_dangling_index() {
        let mesh = MeshData::new(vec![Vec3::ZERO, Vec3::X], vec![0, 1, 2]);
        assert_eq!(
            mesh.validate(),
            Err(AssetError::IndexOutOfRange {
                index: 2,
                vertex_count: 2
            })
        );
    }
}
