//! Read-only voxel world queries consumed by the runoff pipeline.
//!
//! The core never mutates world state; everything it needs from the host is
//! behind the [`VoxelQuery`] trait so evaluation can run against the real
//! world or a test fixture.

use bevy::math::{bounding::Aabb3d, IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// How close a collision-box edge must sit to the unit-cube boundary to
/// count as flush with a face.
pub const FACE_EDGE_TOLERANCE: f32 = 0.05;

/// The four horizontal block faces a drip can originate from.
///
/// North is -Z, south is +Z, west is -X, east is +X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    North,
    South,
    West,
    East,
}

impl Face {
    pub const HORIZONTALS: [Face; 4] = [Face::North, Face::South, Face::West, Face::East];

    pub fn normal(&self) -> IVec3 {
        match self {
            Face::North => IVec3::new(0, 0, -1),
            Face::South => IVec3::new(0, 0, 1),
            Face::West => IVec3::new(-1, 0, 0),
            Face::East => IVec3::new(1, 0, 0),
        }
    }

    pub fn normal_f(&self) -> Vec3 {
        self.normal().as_vec3()
    }

    /// True for faces on the north-south axis. Their top edge runs along X,
    /// which is where lateral jitter gets applied.
    pub fn is_axis_ns(&self) -> bool {
        matches!(self, Face::North | Face::South)
    }
}

/// Coarse material category of a block, as far as runoff cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockMaterial {
    Air,
    /// Grass, flowers, leaves: drips pass through them freely.
    Plant,
    Liquid,
    Solid,
}

impl BlockMaterial {
    /// Whether a drip can occupy or fall through this block.
    pub fn is_open(&self) -> bool {
        matches!(self, BlockMaterial::Air | BlockMaterial::Plant)
    }
}

/// Read-only geometry and lighting queries against the voxel world.
pub trait VoxelQuery {
    fn material(&self, pos: IVec3) -> BlockMaterial;

    /// Whether the block presents a fully solid surface on the given face.
    fn side_solid(&self, pos: IVec3, face: Face) -> bool;

    /// Whether the block presents a fully solid top surface.
    fn top_solid(&self, pos: IVec3) -> bool;

    /// Sub-voxel collision boxes in `[0,1]³` local coordinates.
    fn collision_boxes(&self, pos: IVec3) -> Vec<Aabb3d>;

    /// Ambient sunlight level at the position (0 = fully shadowed).
    fn sunlight_level(&self, pos: IVec3) -> u8;

    /// Height of the highest rain-blocking surface in the given column.
    fn rain_exposure_height(&self, x: i32, z: i32) -> i32;
}

/// Whether any collision box presents an edge flush with the given face of
/// the unit cube. Partial blocks (stairs, slabs) only shed drips off faces
/// where such an edge exists.
pub fn has_face_edge(boxes: &[Aabb3d], face: Face) -> bool {
    boxes.iter().any(|b| match face {
        Face::North => b.min.z <= FACE_EDGE_TOLERANCE,
        Face::South => b.max.z >= 1.0 - FACE_EDGE_TOLERANCE,
        Face::West => b.min.x <= FACE_EDGE_TOLERANCE,
        Face::East => b.max.x >= 1.0 - FACE_EDGE_TOLERANCE,
    })
}
