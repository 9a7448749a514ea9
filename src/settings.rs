//! Runoff tunables and their atomically replaceable store.
//!
//! Settings are an immutable snapshot: the loader replaces the whole thing
//! and bumps a version counter. Consumers never trust raw values; every
//! accessor clamps or defaults out-of-range fields.

use bevy_ecs::resource::Resource;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Fallback sampling modulo used when the configured value is non-positive.
pub const DEFAULT_TICK_GATE_MODULO: u32 = 7;

/// Every tunable of the runoff effect, loaded from a RON file.
///
/// All fields carry serde defaults so a settings file from an older build
/// deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunoffSettings {
    // Spawn frequency / density
    pub tick_gate_modulo: i32,
    pub max_spawns_per_block_tick: i32,
    /// Chance of a wall-face drip attempt per eligible face.
    pub face_spawn_chance: f32,
    /// Chance of a top-edge drip attempt per eligible face.
    /// Older settings files wrote this as `chance_top_edge`.
    #[serde(alias = "chance_top_edge")]
    pub edge_spawn_chance: f32,

    // Distance cull
    pub max_distance: f32,

    // Wall spawn band (0..1 block height)
    pub wall_min_y: f32,
    pub wall_max_y: f32,

    // Drip placement
    pub drop_size: f32,
    /// How far outside the face plane the drip center is placed.
    pub face_clearance: f32,
    /// Extra outward push for top-edge drips to clear the block below.
    pub top_edge_extra_out: f32,

    // Colors (shared RGB, independent alphas)
    pub color_r: i32,
    pub color_g: i32,
    pub color_b: i32,
    pub drop_alpha: i32,
    pub splash_alpha: i32,
    pub trail_alpha: i32,

    // Physics / timing
    pub gravity_const: f32,
    pub drop_gravity_effect: f32,
    pub life_padding_seconds: f32,

    // Wall streaks
    pub trail_segments: i32,
    pub trail_length: f32,
    pub trail_side_jitter: f32,
    pub wall_surface_probe_in: f32,
    pub trail_min_size: f32,
    pub trail_max_size: f32,

    // Splash
    pub splash_min_qty: i32,
    pub splash_add_qty: i32,
    pub splash_min_size: f32,
    pub splash_max_size: f32,
}

impl Default for RunoffSettings {
    fn default() -> Self {
        RunoffSettings {
            tick_gate_modulo: 10,
            max_spawns_per_block_tick: 2,
            face_spawn_chance: 0.55,
            edge_spawn_chance: 0.55,
            max_distance: 32.0,
            wall_min_y: 0.15,
            wall_max_y: 0.95,
            drop_size: 0.30,
            face_clearance: 0.0005,
            top_edge_extra_out: 0.02,
            color_r: 106,
            color_g: 195,
            color_b: 207,
            drop_alpha: 255,
            splash_alpha: 235,
            trail_alpha: 235,
            gravity_const: 9.81,
            drop_gravity_effect: 0.8,
            life_padding_seconds: 0.01,
            trail_segments: 10,
            trail_length: 0.85,
            trail_side_jitter: 0.03,
            wall_surface_probe_in: 0.22,
            trail_min_size: 0.12,
            trail_max_size: 0.18,
            splash_min_qty: 3,
            splash_add_qty: 3,
            splash_min_size: 0.25,
            splash_max_size: 0.40,
        }
    }
}

impl RunoffSettings {
    /// Sampling modulo with the documented fallback for non-positive values.
    pub fn effective_tick_gate_modulo(&self) -> u32 {
        if self.tick_gate_modulo <= 0 {
            DEFAULT_TICK_GATE_MODULO
        } else {
            self.tick_gate_modulo as u32
        }
    }

    /// Per-voxel-tick spawn budget, at least 1.
    pub fn spawn_budget(&self) -> u32 {
        self.max_spawns_per_block_tick.max(1) as u32
    }

    pub fn face_chance(&self) -> f64 {
        clamp01(self.face_spawn_chance) as f64
    }

    pub fn edge_chance(&self) -> f64 {
        clamp01(self.edge_spawn_chance) as f64
    }

    /// Squared cull distance; the raw distance is floored at one block.
    pub fn max_distance_sq(&self) -> f64 {
        let d = self.max_distance.max(1.0) as f64;
        d * d
    }
}

pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// One consistent `(settings, version)` pair.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    pub settings: RunoffSettings,
    pub version: u64,
}

/// Holds the active settings snapshot; replaced wholesale by the loader.
///
/// Readers always observe a consistent pair: the snapshot is published as a
/// single `Arc` swap, and the version increments by exactly 1 per
/// replacement.
#[derive(Resource, Debug)]
pub struct SettingsStore {
    inner: RwLock<Arc<SettingsSnapshot>>,
}

impl SettingsStore {
    pub fn new(settings: RunoffSettings) -> Self {
        SettingsStore {
            inner: RwLock::new(Arc::new(SettingsSnapshot {
                settings,
                version: 0,
            })),
        }
    }

    pub fn current(&self) -> Arc<SettingsSnapshot> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs a new snapshot and returns the new version.
    pub fn replace(&self, settings: RunoffSettings) -> u64 {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let version = guard.version + 1;
        *guard = Arc::new(SettingsSnapshot { settings, version });
        version
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        SettingsStore::new(RunoffSettings::default())
    }
}
