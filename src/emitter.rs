//! Drip orchestration: face/top-edge geometry, drop emission, splash
//! scheduling, and the per-voxel-tick loop that applies probability rolls
//! under a spawn budget.

use crate::effects::{EffectSink, SpawnRequest};
use crate::gate;
use crate::impact;
use crate::settings::{clamp01, RunoffSettings};
use crate::template::{TemplateBundle, TemplateCache};
use crate::trail;
use crate::world::{Face, VoxelQuery};
use bevy::math::{DVec3, IVec3, Vec3};
use bevy_log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Top-edge drips spawn just under the block's upper lip.
const TOP_EDGE_Y: f64 = 0.98;

/// Outward velocity nudge so the drop falls clear of the face.
const TOP_EDGE_NUDGE: f32 = 0.02;
const WALL_FACE_NUDGE: f32 = 0.01;

/// Lateral jitter along the face edge line, in blocks.
const EDGE_JITTER: f64 = 0.4;

/// Everything one voxel-tick evaluation needs besides the world itself.
/// Built once per tick by the composing system and shared across voxels,
/// so no evaluation ever reads global mutable state.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub settings: &'a RunoffSettings,
    /// Settings version, for template-cache invalidation.
    pub version: u64,
    /// Current rain intensity in `[0, 1]`.
    pub rain_level: f32,
    /// Seconds this voxel has been ticking; drives the frequency gate.
    pub seconds_ticking: f32,
    /// Acting viewpoint for the distance cull.
    pub viewpoint: DVec3,
}

/// Evaluates one voxel for this tick: gates, per-face probability rolls,
/// drip attempts, and the spawn budget. Returns how many drips were
/// actually emitted.
///
/// Safe to call concurrently for different voxels; the only shared state is
/// the template cache, which publishes atomically.
pub fn run_voxel_tick(
    world: &impl VoxelQuery,
    sink: &impl EffectSink,
    cache: &TemplateCache,
    ctx: &TickContext,
    pos: IVec3,
) -> u32 {
    let templates = cache.ensure_built(ctx.settings, ctx.version);

    let faces = gate::evaluate(
        world,
        pos,
        ctx.seconds_ticking,
        ctx.rain_level,
        ctx.settings,
        ctx.viewpoint,
    );
    if faces.is_empty() {
        return 0;
    }

    // Per voxel+tick stream: reproducible in tests, contention-free in
    // parallel evaluation.
    let mut rng = StdRng::seed_from_u64(gate::tick_seed(pos, ctx.seconds_ticking));

    let budget = ctx.settings.spawn_budget();
    let mut attempts = 0;
    let mut emitted = 0;

    'faces: for face in faces {
        // Independent rolls: one wall-face attempt, one top-edge attempt.
        for top_edge in [false, true] {
            let chance = if top_edge {
                ctx.settings.edge_chance()
            } else {
                ctx.settings.face_chance()
            };
            if rng.gen::<f64>() <= chance {
                if attempt(world, sink, &templates, ctx.settings, &mut rng, pos, face, top_edge) {
                    emitted += 1;
                }
                attempts += 1;
                if attempts >= budget {
                    break 'faces;
                }
            }
        }
    }

    if emitted > 0 {
        debug!("runoff: emitted {emitted} drip(s) at {pos}");
    }
    emitted
}

/// One drip attempt against a specific face. Emits the drop immediately,
/// hands wall-face drips to the trail builder, and schedules the splash for
/// the predicted impact time. Returns false (emitting nothing) when the
/// impact solver finds no supporting surface; that is a normal outcome.
#[allow(clippy::too_many_arguments)]
pub fn attempt(
    world: &impl VoxelQuery,
    sink: &impl EffectSink,
    templates: &TemplateBundle,
    settings: &RunoffSettings,
    rng: &mut impl Rng,
    pos: IVec3,
    face: Face,
    top_edge: bool,
) -> bool {
    let clearance = settings.face_clearance.max(0.0) as f64;
    let normal = face.normal_f();

    // Face-plane position, pushed outward by the clearance.
    let mut x = pos.x as f64 + 0.5;
    let mut z = pos.z as f64 + 0.5;
    match face {
        Face::East => x = pos.x as f64 + 1.0 + clearance,
        Face::West => x = pos.x as f64 - clearance,
        Face::South => z = pos.z as f64 + 1.0 + clearance,
        Face::North => z = pos.z as f64 - clearance,
    }

    // Extra outward push only for top-edge drips, to clear the block below.
    if top_edge {
        let extra = settings.top_edge_extra_out as f64;
        x += normal.x as f64 * extra;
        z += normal.z as f64 * extra;
    }

    let y = if top_edge {
        pos.y as f64 + TOP_EDGE_Y
    } else {
        // Skewed toward the upper band so streaks start high.
        let t = 0.25 + 0.75 * rng.gen::<f64>();
        let min = clamp01(settings.wall_min_y) as f64;
        let max = clamp01(settings.wall_max_y) as f64;
        pos.y as f64 + min + (max - min) * t
    };

    // Jitter along the face edge line.
    let jitter = rng.gen::<f64>() * (EDGE_JITTER * 2.0) - EDGE_JITTER;
    if face.is_axis_ns() {
        x += jitter;
    } else {
        z += jitter;
    }

    let Some(impact) = impact::solve(
        world,
        x,
        y,
        z,
        settings.gravity_const,
        templates.drop.gravity_effect,
    ) else {
        return false;
    };

    let nudge = if top_edge { TOP_EDGE_NUDGE } else { WALL_FACE_NUDGE };
    let mut drop = SpawnRequest::from_template(&templates.drop, DVec3::new(x, y, z));
    drop.min_velocity = normal * nudge;
    drop.add_velocity = Vec3::ZERO;
    // The drop's own lifetime expires essentially at impact.
    drop.life_seconds = impact.fall_seconds + settings.life_padding_seconds.max(0.0);
    let life_seconds = drop.life_seconds;
    sink.spawn_now(drop);

    if !top_edge {
        trail::build(
            world,
            sink,
            templates,
            settings,
            rng,
            x,
            y,
            z,
            face,
            life_seconds,
        );
    }

    let splash = SpawnRequest::from_template(&templates.splash, DVec3::new(x, impact.impact_y, z));
    sink.spawn_deferred(splash, impact.delay_ms);

    true
}
