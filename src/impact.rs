//! Downward column scan and fall-time prediction for a drip origin.

use crate::world::{BlockMaterial, VoxelQuery};
use bevy::math::IVec3;

/// How many voxels below the origin the scan inspects before giving up.
pub const MAX_SCAN_DEPTH: i32 = 24;

/// Fall distances at or below this are too close to be visually meaningful.
pub const MIN_FALL_DISTANCE: f64 = 0.05;

/// A drip lands slightly below a liquid surface and exactly on a solid top.
const LIQUID_SURFACE_OFFSET: f64 = 0.9;
const SOLID_SURFACE_OFFSET: f64 = 1.0;

/// Where and when a falling drip lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    /// World-space height of the supporting surface.
    pub impact_y: f64,
    /// Constant-acceleration free-fall time from origin to surface.
    pub fall_seconds: f32,
    /// Whole-millisecond scheduling delay, at least 1 so the scheduler
    /// accepts it.
    pub delay_ms: u32,
}

/// Scans the voxel column under `(x, y, z)` for the first supporting surface
/// (solid top face or liquid) and converts the vertical drop into a fall
/// duration. Returns `None` when nothing supports the drip within range or
/// the fall would be point-blank; both are normal outcomes, not errors.
pub fn solve(
    world: &impl VoxelQuery,
    x: f64,
    y: f64,
    z: f64,
    gravity_const: f32,
    gravity_effect: f32,
) -> Option<Impact> {
    let start_y = y.floor() as i32;
    let min_y = (start_y - MAX_SCAN_DEPTH).max(0);
    let (bx, bz) = (x.floor() as i32, z.floor() as i32);

    let mut impact_y = None;
    for yy in (min_y..=start_y).rev() {
        let pos = IVec3::new(bx, yy, bz);
        match world.material(pos) {
            BlockMaterial::Air => continue,
            BlockMaterial::Liquid => {
                impact_y = Some(yy as f64 + LIQUID_SURFACE_OFFSET);
                break;
            }
            _ => {
                // Plants and partial blocks without a solid top let the
                // drip pass through.
                if world.top_solid(pos) {
                    impact_y = Some(yy as f64 + SOLID_SURFACE_OFFSET);
                    break;
                }
            }
        }
    }

    let impact_y = impact_y?;
    let distance = y - impact_y;
    if distance <= MIN_FALL_DISTANCE {
        return None;
    }

    let g = (gravity_const.max(0.01) * gravity_effect.max(0.01)) as f64;
    let fall_seconds = (2.0 * distance / g).sqrt();
    let delay_ms = ((fall_seconds * 1000.0).round() as u32).max(1);

    Some(Impact {
        impact_y,
        fall_seconds: fall_seconds as f32,
        delay_ms,
    })
}
