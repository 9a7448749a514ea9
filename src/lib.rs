//! Rain-driven runoff drips for voxel worlds.
//!
//! Once per simulation tick and per eligible voxel, this crate decides
//! whether a runoff effect (a falling drop, an optional wall trail, and a
//! delayed splash) should be emitted, and computes its exact spatial and
//! temporal parameters. It only consumes read-only world queries
//! ([`VoxelQuery`]) and an emission surface ([`EffectSink`]); world storage
//! and the particle engine belong to the host.
//!
//! Typical wiring: the host owns a [`SettingsStore`] and a
//! [`TemplateCache`], builds one [`TickContext`] per tick from the current
//! settings snapshot, and calls [`run_voxel_tick`] for each candidate voxel
//! (concurrently, if it likes).

pub mod effects;
pub mod emitter;
pub mod gate;
pub mod impact;
pub mod loader;
pub mod settings;
pub mod template;
pub mod trail;
pub mod world;

#[cfg(test)]
pub(crate) mod fixtures;

pub use effects::{EffectSink, MotionFlags, ParticleTemplate, SpawnRequest};
pub use emitter::{run_voxel_tick, TickContext};
pub use impact::Impact;
pub use settings::{RunoffSettings, SettingsSnapshot, SettingsStore};
pub use template::{TemplateBundle, TemplateCache};
pub use world::{BlockMaterial, Face, VoxelQuery};
