//! Wall-trail emission beneath a wall-face drip origin.

use crate::effects::{EffectSink, SpawnRequest};
use crate::settings::RunoffSettings;
use crate::template::TemplateBundle;
use crate::world::{has_face_edge, BlockMaterial, Face, VoxelQuery};
use bevy::math::{DVec3, IVec3, Vec3};
use rand::Rng;

/// Slow outward/downward creep so the streak reads as running water.
const TRAIL_OUT_SPEED: f32 = 0.004;
const TRAIL_DOWN_SPEED: f32 = -0.035;

/// Walks up to `trail_segments` points down the wall from the drip origin,
/// emitting one trail particle per valid segment. The first segment that
/// fails the wall-surface check ends the walk, so streaks never float past
/// ledges, corners, or window gaps. All segments share `life_seconds` so
/// the streak disappears in sync with its drop.
pub fn build(
    world: &impl VoxelQuery,
    sink: &impl EffectSink,
    templates: &TemplateBundle,
    settings: &RunoffSettings,
    rng: &mut impl Rng,
    x: f64,
    y: f64,
    z: f64,
    face: Face,
    life_seconds: f32,
) -> u32 {
    let segments = settings.trail_segments.max(0);
    if segments == 0 {
        return 0;
    }

    let normal = face.normal_f();
    let mut emitted = 0;

    for i in 0..segments {
        let t = if segments <= 1 {
            0.0
        } else {
            i as f64 / (segments - 1) as f64
        };
        let yy = y - t * settings.trail_length as f64;

        if !valid_wall_surface(world, settings, x, yy, z, face) {
            break;
        }

        let side = (rng.gen::<f64>() - 0.5) * (settings.trail_side_jitter as f64 * 2.0);
        let (mut xx, mut zz) = (x, z);
        if face.is_axis_ns() {
            xx += side;
        } else {
            zz += side;
        }

        let mut request = SpawnRequest::from_template(&templates.trail, DVec3::new(xx, yy, zz));
        request.life_seconds = life_seconds;
        request.min_velocity = Vec3::new(
            normal.x * TRAIL_OUT_SPEED,
            TRAIL_DOWN_SPEED,
            normal.z * TRAIL_OUT_SPEED,
        );
        sink.spawn_now(request);
        emitted += 1;
    }

    emitted
}

/// Probes slightly into the wall behind the point and requires actual wall
/// there: a non-open, non-liquid block with open space in front and either
/// a fully solid face or a flush collision-box edge.
fn valid_wall_surface(
    world: &impl VoxelQuery,
    settings: &RunoffSettings,
    x: f64,
    y: f64,
    z: f64,
    face: Face,
) -> bool {
    let normal = face.normal_f();
    let probe = settings.wall_surface_probe_in as f64;
    let px = x - normal.x as f64 * probe;
    let pz = z - normal.z as f64 * probe;

    let behind = IVec3::new(px.floor() as i32, y.floor() as i32, pz.floor() as i32);
    let material = world.material(behind);
    if material.is_open() || material == BlockMaterial::Liquid {
        return false;
    }

    let front = behind + face.normal();
    if !world.material(front).is_open() {
        return false;
    }

    if world.side_solid(behind, face) {
        return true;
    }
    has_face_edge(&world.collision_boxes(behind), face)
}
