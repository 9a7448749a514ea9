//! Settings-derived particle templates with version-keyed invalidation.
//!
//! Templates are rebuilt only when the settings version changes, never on
//! wall-clock time. The rebuilt bundle is published atomically behind an
//! `Arc`, so concurrent readers observe either the old or the new complete
//! bundle, never a partial one.

use crate::effects::{pack_rgba, MotionFlags, ParticleTemplate};
use crate::settings::RunoffSettings;
use bevy_ecs::resource::Resource;
use bevy::math::Vec3;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Splash velocity envelope, from the template the splash resolves against.
const SPLASH_MIN_VELOCITY: Vec3 = Vec3::new(-0.5, 0.5, -0.5);
const SPLASH_ADD_VELOCITY: Vec3 = Vec3::new(0.5, 0.8, 0.5);

/// Drop life placeholder; the emitter overwrites it per spawn.
const DROP_PLACEHOLDER_LIFE: f32 = 1.5;
const SPLASH_LIFE: f32 = 0.1;
const SPLASH_GRAVITY_EFFECT: f32 = 1.5;
const TRAIL_LIFE: f32 = 0.25;
const TRAIL_GRAVITY_EFFECT: f32 = 0.15;

const MIN_PARTICLE_SIZE: f32 = 0.01;
const MIN_GRAVITY_EFFECT: f32 = 0.01;

/// The three templates the pipeline draws from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateBundle {
    pub drop: ParticleTemplate,
    pub splash: ParticleTemplate,
    pub trail: ParticleTemplate,
}

impl TemplateBundle {
    /// Derives all three templates from a settings snapshot. Pure and
    /// idempotent: the same settings always produce the same bundle.
    pub fn build(s: &RunoffSettings) -> Self {
        let drop = ParticleTemplate {
            min_quantity: 1,
            add_quantity: 0,
            color: pack_rgba(s.drop_alpha, s.color_r, s.color_g, s.color_b),
            min_velocity: Vec3::ZERO,
            add_velocity: Vec3::ZERO,
            life_seconds: DROP_PLACEHOLDER_LIFE,
            gravity_effect: s.drop_gravity_effect.max(MIN_GRAVITY_EFFECT),
            min_size: s.drop_size.max(MIN_PARTICLE_SIZE),
            max_size: s.drop_size.max(MIN_PARTICLE_SIZE),
            flags: MotionFlags {
                wind_affected: true,
                terrain_collision: true,
                self_propelled: true,
                background: true,
            },
        };

        let splash = ParticleTemplate {
            min_quantity: s.splash_min_qty.max(0) as u32,
            add_quantity: s.splash_add_qty.max(0) as u32,
            color: pack_rgba(s.splash_alpha, s.color_r, s.color_g, s.color_b),
            min_velocity: SPLASH_MIN_VELOCITY,
            add_velocity: SPLASH_ADD_VELOCITY,
            life_seconds: SPLASH_LIFE,
            gravity_effect: SPLASH_GRAVITY_EFFECT,
            min_size: s.splash_min_size.max(MIN_PARTICLE_SIZE),
            max_size: s.splash_max_size.max(MIN_PARTICLE_SIZE),
            // Foreground: the splash is world-visible and synchronous.
            flags: MotionFlags::default(),
        };

        // No terrain collision so the streak can render embedded in the wall.
        let trail = ParticleTemplate {
            min_quantity: 1,
            add_quantity: 0,
            color: pack_rgba(s.trail_alpha, s.color_r, s.color_g, s.color_b),
            min_velocity: Vec3::ZERO,
            add_velocity: Vec3::ZERO,
            life_seconds: TRAIL_LIFE,
            gravity_effect: TRAIL_GRAVITY_EFFECT,
            min_size: s.trail_min_size.max(MIN_PARTICLE_SIZE),
            max_size: s.trail_max_size.max(MIN_PARTICLE_SIZE),
            flags: MotionFlags {
                wind_affected: true,
                terrain_collision: false,
                self_propelled: true,
                background: true,
            },
        };

        TemplateBundle { drop, splash, trail }
    }
}

/// Lazily rebuilt template bundle, keyed by settings version.
///
/// Safe to call from many concurrent evaluation contexts: at most one
/// rebuild happens per version transition; callers racing a rebuild block
/// briefly on the write lock and then observe the published bundle.
#[derive(Resource, Debug, Default)]
pub struct TemplateCache {
    state: RwLock<Option<(u64, Arc<TemplateBundle>)>>,
    rebuilds: AtomicU64,
}

impl TemplateCache {
    pub fn new() -> Self {
        TemplateCache::default()
    }

    /// Returns the bundle for `version`, rebuilding from `settings` only if
    /// the cached version differs. A cache hit allocates nothing.
    pub fn ensure_built(&self, settings: &RunoffSettings, version: u64) -> Arc<TemplateBundle> {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((built_version, bundle)) = state.as_ref() {
                if *built_version == version {
                    return bundle.clone();
                }
            }
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have rebuilt while we waited for the lock.
        if let Some((built_version, bundle)) = state.as_ref() {
            if *built_version == version {
                return bundle.clone();
            }
        }

        let bundle = Arc::new(TemplateBundle::build(settings));
        *state = Some((version, bundle.clone()));
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
        bundle
    }

    /// Number of rebuilds performed so far; observable for tests.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_version_rebuilds_once() {
        let cache = TemplateCache::new();
        let settings = RunoffSettings::default();

        let first = cache.ensure_built(&settings, 0);
        let second = cache.ensure_built(&settings, 0);

        assert_eq!(cache.rebuild_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn concurrent_callers_rebuild_once_per_version() {
        let cache = Arc::new(TemplateCache::new());
        let settings = RunoffSettings::default();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let settings = settings.clone();
                std::thread::spawn(move || cache.ensure_built(&settings, 3))
            })
            .collect();

        let bundles: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(cache.rebuild_count(), 1);
        // Every caller observes the same published bundle.
        for bundle in &bundles[1..] {
            assert!(Arc::ptr_eq(&bundles[0], bundle));
        }
    }

    #[test]
    fn version_change_triggers_rebuild() {
        let cache = TemplateCache::new();
        let settings = RunoffSettings::default();

        cache.ensure_built(&settings, 0);
        let changed = RunoffSettings {
            drop_size: 0.5,
            ..RunoffSettings::default()
        };
        let bundle = cache.ensure_built(&changed, 1);

        assert_eq!(cache.rebuild_count(), 2);
        assert_eq!(bundle.drop.min_size, 0.5);
    }

    #[test]
    fn splash_quantities_never_go_negative() {
        let settings = RunoffSettings {
            splash_min_qty: -4,
            splash_add_qty: -1,
            ..RunoffSettings::default()
        };
        let bundle = TemplateBundle::build(&settings);
        assert_eq!(bundle.splash.min_quantity, 0);
        assert_eq!(bundle.splash.add_quantity, 0);
    }

    #[test]
    fn alphas_are_independent_over_shared_rgb() {
        let bundle = TemplateBundle::build(&RunoffSettings::default());
        // Same RGB, different alphas.
        assert_eq!(bundle.drop.color & 0x00FF_FFFF, bundle.splash.color & 0x00FF_FFFF);
        assert_eq!(bundle.drop.color & 0x00FF_FFFF, bundle.trail.color & 0x00FF_FFFF);
        assert_eq!(bundle.drop.color >> 24, 255);
        assert_eq!(bundle.splash.color >> 24, 235);
    }

    #[test]
    fn trail_does_not_collide_with_terrain() {
        let bundle = TemplateBundle::build(&RunoffSettings::default());
        assert!(!bundle.trail.flags.terrain_collision);
        assert!(bundle.trail.flags.background);
        assert!(bundle.drop.flags.terrain_collision);
        assert!(!bundle.splash.flags.background);
    }

    #[test]
    fn degenerate_sizes_are_floored() {
        let settings = RunoffSettings {
            drop_size: 0.0,
            trail_min_size: -1.0,
            ..RunoffSettings::default()
        };
        let bundle = TemplateBundle::build(&settings);
        assert_eq!(bundle.drop.min_size, MIN_PARTICLE_SIZE);
        assert_eq!(bundle.trail.min_size, MIN_PARTICLE_SIZE);
    }
}
