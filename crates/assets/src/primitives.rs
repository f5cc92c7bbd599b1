use crate::MeshData;
use glam::Vec3;

/// Box of size 1 x 3 x 1 (X, Y, Z) centered on the origin.
pub fn test_box() -> MeshData {
    cuboid(Vec3::new(0.5, 1.5, 0.5))
}

/// Axis-aligned unit cube centered on the origin.
pub fn unit_cube() -> MeshData {
    cuboid(Vec3::splat(0.5))
}

/// Eight-corner cuboid with the given half extents.
pub fn cuboid(half: Vec3) -> MeshData {
    let (x, y, z) = (half.x, half.y, half.z);
    let positions = vec![
        Vec3::new(-x, -y, -z),
        Vec3::new(-x, y, -z),
        Vec3::new(x, y, -z),
        Vec3::new(x, -y, -z),
        Vec3::new(-x, -y, z),
        Vec3::new(-x, y, z),
        Vec3::new(x, y, z),
        Vec3::new(x, -y, z),
    ];
    #[rustfmt::skip]
    let indices = vec![
        0,1,2, 0,2,3,  // -Z
        4,6,5, 4,7,6,  // +Z
        4,5,1, 4,1,0,  // -X
        3,2,6, 3,6,7,  // +X
        1,5,6, 1,6,2,  // +Y
        4,0,3, 4,3,7,  // -Y
    ];
    MeshData { positions, indices }
}
