//! Particle templates, spawn requests, and the emission surface.

use bevy::math::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Packs (alpha, r, g, b) into a single `0xAARRGGBB` color, clamping each
/// component to `0..=255`.
pub fn pack_rgba(a: i32, r: i32, g: i32, b: i32) -> u32 {
    let c = |v: i32| v.clamp(0, 255) as u32;
    (c(a) << 24) | (c(r) << 16) | (c(g) << 8) | c(b)
}

/// How the particle engine should move a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotionFlags {
    pub wind_affected: bool,
    pub terrain_collision: bool,
    pub self_propelled: bool,
    /// Emitted from the background evaluation context rather than the
    /// foreground (world-visible) one.
    pub background: bool,
}

/// Cached per-kind particle parameters, derived from settings.
///
/// `life_seconds` on the drop template is a placeholder; the emitter
/// overwrites it per spawn so the drop expires at impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleTemplate {
    pub min_quantity: u32,
    pub add_quantity: u32,
    pub color: u32,
    pub min_velocity: Vec3,
    pub add_velocity: Vec3,
    pub life_seconds: f32,
    pub gravity_effect: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub flags: MotionFlags,
}

/// One concrete emission, resolved from a template plus this invocation's
/// position, velocity and life. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub position: DVec3,
    pub min_velocity: Vec3,
    pub add_velocity: Vec3,
    pub min_quantity: u32,
    pub add_quantity: u32,
    pub color: u32,
    pub life_seconds: f32,
    pub gravity_effect: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub flags: MotionFlags,
}

impl SpawnRequest {
    pub fn from_template(template: &ParticleTemplate, position: DVec3) -> Self {
        SpawnRequest {
            position,
            min_velocity: template.min_velocity,
            add_velocity: template.add_velocity,
            min_quantity: template.min_quantity,
            add_quantity: template.add_quantity,
            color: template.color,
            life_seconds: template.life_seconds,
            gravity_effect: template.gravity_effect,
            min_size: template.min_size,
            max_size: template.max_size,
            flags: template.flags,
        }
    }
}

/// Where spawn requests go.
///
/// `spawn_now` may run on the background evaluation context. `spawn_deferred`
/// must execute the request after `delay_ms` on whatever context the host
/// requires for world-visible effects; there is no cancellation, and the
/// request fires at the precomputed position even if the world has changed.
pub trait EffectSink {
    fn spawn_now(&self, request: SpawnRequest);
    fn spawn_deferred(&self, request: SpawnRequest, delay_ms: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_rgba_clamps_components() {
        assert_eq!(pack_rgba(255, 0, 0, 0), 0xFF00_0000);
        assert_eq!(pack_rgba(0, 255, 255, 255), 0x00FF_FFFF);
        assert_eq!(pack_rgba(300, -10, 256, 128), 0xFF00_FF80);
    }

    #[test]
    fn request_inherits_template_fields() {
        let template = ParticleTemplate {
            min_quantity: 3,
            add_quantity: 2,
            color: pack_rgba(235, 106, 195, 207),
            min_velocity: Vec3::new(-0.5, 0.5, -0.5),
            add_velocity: Vec3::new(0.5, 0.8, 0.5),
            life_seconds: 0.1,
            gravity_effect: 1.5,
            min_size: 0.25,
            max_size: 0.40,
            flags: MotionFlags::default(),
        };
        let request = SpawnRequest::from_template(&template, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(request.position, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(request.color, template.color);
        assert_eq!(request.min_velocity, template.min_velocity);
        assert_eq!(request.life_seconds, template.life_seconds);
    }
}
