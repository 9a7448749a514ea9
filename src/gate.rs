//! Per-voxel-tick eligibility pipeline.
//!
//! Stages short-circuit in order: rain level, deterministic sampling
//! frequency, distance cull, outdoor exposure, then per-face neighbor and
//! edge checks. The gate only decides which faces *may* drip; probability
//! rolls and the spawn budget live in the emitter's tick loop.

use crate::settings::RunoffSettings;
use crate::world::{has_face_edge, Face, VoxelQuery};
use bevy::math::{DVec3, IVec3};

/// Below this rain intensity nothing drips.
pub const RAIN_GATE_THRESHOLD: f32 = 0.05;

/// Sampling ticks per second fed into the frequency hash.
const FREQUENCY_TICK_RATE: f32 = 30.0;

/// Bob Jenkins one-at-a-time hash over three coordinates.
///
/// Deterministic across runs and platforms, which is what lets the
/// frequency gate throttle voxels without per-voxel timers.
pub fn oaat_hash(x: i32, y: i32, z: i32) -> u32 {
    let mut h: u32 = 0;
    for v in [x, y, z] {
        for byte in v.to_le_bytes() {
            h = h.wrapping_add(byte as u32);
            h = h.wrapping_add(h << 10);
            h ^= h >> 6;
        }
    }
    h = h.wrapping_add(h << 3);
    h ^= h >> 11;
    h.wrapping_add(h << 15)
}

/// Deterministic RNG seed for one voxel-tick evaluation.
pub fn tick_seed(pos: IVec3, seconds_ticking: f32) -> u64 {
    let tick = (seconds_ticking * FREQUENCY_TICK_RATE) as i32;
    ((oaat_hash(pos.x, pos.y, pos.z) as u64) << 32) | oaat_hash(tick, pos.z, pos.x) as u64
}

/// Low-frequency sampling gate: a voxel is evaluated only when its
/// position/time hash lands on the modulo.
pub fn passes_frequency_gate(pos: IVec3, seconds_ticking: f32, modulo: u32) -> bool {
    let tick = (seconds_ticking * FREQUENCY_TICK_RATE) as i32;
    oaat_hash(pos.x, pos.y, pos.z.wrapping_add(tick)) % modulo.max(1) == 0
}

/// Runs all gate stages for one voxel and returns the faces that may drip
/// this tick. Empty when any whole-voxel stage rejects.
pub fn evaluate(
    world: &impl VoxelQuery,
    pos: IVec3,
    seconds_ticking: f32,
    rain_level: f32,
    settings: &RunoffSettings,
    viewpoint: DVec3,
) -> Vec<Face> {
    if rain_level < RAIN_GATE_THRESHOLD {
        return Vec::new();
    }

    if !passes_frequency_gate(pos, seconds_ticking, settings.effective_tick_gate_modulo()) {
        return Vec::new();
    }

    if viewpoint.distance_squared(pos.as_dvec3()) > settings.max_distance_sq() {
        return Vec::new();
    }

    // Outdoor gating: the voxel must be rain-exposed and sunlit.
    if world.rain_exposure_height(pos.x, pos.z) > pos.y + 1 {
        return Vec::new();
    }
    if world.sunlight_level(pos) == 0 {
        return Vec::new();
    }

    Face::HORIZONTALS
        .into_iter()
        .filter(|face| face_eligible(world, pos, *face))
        .collect()
}

/// Face-level checks: open neighbor, rain-exposed neighbor column, no ledge
/// directly beneath the neighbor, and a physical edge to drip from.
fn face_eligible(world: &impl VoxelQuery, pos: IVec3, face: Face) -> bool {
    let neighbor = pos + face.normal();

    // Drips need open space (air or plants) to fall into.
    if !world.material(neighbor).is_open() {
        return false;
    }

    // Indoor leak guard: the neighbor column itself must see rain.
    if world.rain_exposure_height(neighbor.x, neighbor.z) > neighbor.y {
        return false;
    }

    // A solid top directly beneath the neighbor would absorb the drip.
    if world.top_solid(neighbor - IVec3::Y) {
        return false;
    }

    // Partial blocks only shed drips off faces with a flush collision edge.
    if !world.side_solid(pos, face) && !has_face_edge(&world.collision_boxes(pos), face) {
        return false;
    }

    true
}
