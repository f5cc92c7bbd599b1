use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a game object. Carries no data of its own.
///
/// Ids are issued by the ECS world from a monotonically increasing counter
/// starting at 1 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u32);

impl Entity {
    /// Reserved id; never returned by entity creation.
    pub const INVALID: Entity = Entity(0);

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// 1-based slot in the CPU mesh table.
///
/// Geometry behind a handle never changes once issued, so anything keyed by a
/// handle (the GPU cache in particular) may assume same handle, same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

impl MeshHandle {
    pub const INVALID: MeshHandle = MeshHandle(0);

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for MeshHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for MeshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MeshHandle({})", self.0)
    }
}

/// Spatial transform: position, Euler rotation, scale.
///
/// `rotation` holds radians: `x` is pitch, `y` is yaw, `z` is roll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sentinels_are_zero() {
        assert_eq!(Entity::INVALID.0, 0);
        assert!(!Entity::INVALID.is_valid());
        assert!(Entity(1).is_valid());
        assert_eq!(MeshHandle::default(), MeshHandle::INVALID);
        assert!(!MeshHandle::INVALID.is_valid());
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn display_formats() {
        assert_eq!(Entity(7).to_string(), "Entity(7)");
        assert_eq!(MeshHandle(3).to_string(), "MeshHandle(3)");
    }
}
