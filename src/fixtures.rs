//! Shared test fixtures: an in-memory voxel world and a recording sink.

use crate::effects::{EffectSink, SpawnRequest};
use crate::world::{BlockMaterial, Face, VoxelQuery};
use bevy::math::{bounding::Aabb3d, IVec3, Vec3A};
use std::collections::HashMap;
use std::sync::Mutex;

pub fn local_box(min: (f32, f32, f32), max: (f32, f32, f32)) -> Aabb3d {
    Aabb3d {
        min: Vec3A::new(min.0, min.1, min.2),
        max: Vec3A::new(max.0, max.1, max.2),
    }
}

#[derive(Debug, Clone)]
pub struct FixtureBlock {
    pub material: BlockMaterial,
    pub full_cube: bool,
    pub boxes: Vec<Aabb3d>,
}

impl FixtureBlock {
    pub fn air() -> Self {
        FixtureBlock {
            material: BlockMaterial::Air,
            full_cube: false,
            boxes: Vec::new(),
        }
    }

    pub fn solid() -> Self {
        FixtureBlock {
            material: BlockMaterial::Solid,
            full_cube: true,
            boxes: vec![local_box((0.0, 0.0, 0.0), (1.0, 1.0, 1.0))],
        }
    }

    pub fn plant() -> Self {
        FixtureBlock {
            material: BlockMaterial::Plant,
            full_cube: false,
            boxes: Vec::new(),
        }
    }

    pub fn liquid() -> Self {
        FixtureBlock {
            material: BlockMaterial::Liquid,
            full_cube: false,
            boxes: Vec::new(),
        }
    }

    /// A solid block with partial geometry (stairs, slabs).
    pub fn partial(boxes: Vec<Aabb3d>) -> Self {
        FixtureBlock {
            material: BlockMaterial::Solid,
            full_cube: false,
            boxes,
        }
    }
}

/// Sparse voxel world; unset positions are air, every column is fully
/// rain-exposed, and sunlight is uniform.
#[derive(Debug, Default)]
pub struct FixtureWorld {
    blocks: HashMap<IVec3, FixtureBlock>,
    rain_heights: HashMap<(i32, i32), i32>,
    sunlight: Option<u8>,
}

impl FixtureWorld {
    pub fn new() -> Self {
        FixtureWorld::default()
    }

    pub fn set(&mut self, pos: IVec3, block: FixtureBlock) {
        self.blocks.insert(pos, block);
    }

    pub fn set_rain_height(&mut self, x: i32, z: i32, height: i32) {
        self.rain_heights.insert((x, z), height);
    }

    pub fn set_sunlight(&mut self, level: u8) {
        self.sunlight = Some(level);
    }
}

impl VoxelQuery for FixtureWorld {
    fn material(&self, pos: IVec3) -> BlockMaterial {
        self.blocks
            .get(&pos)
            .map(|b| b.material)
            .unwrap_or(BlockMaterial::Air)
    }

    fn side_solid(&self, pos: IVec3, _face: Face) -> bool {
        self.blocks
            .get(&pos)
            .map(|b| b.full_cube && b.material == BlockMaterial::Solid)
            .unwrap_or(false)
    }

    fn top_solid(&self, pos: IVec3) -> bool {
        self.blocks
            .get(&pos)
            .map(|b| b.full_cube && b.material == BlockMaterial::Solid)
            .unwrap_or(false)
    }

    fn collision_boxes(&self, pos: IVec3) -> Vec<Aabb3d> {
        self.blocks
            .get(&pos)
            .map(|b| b.boxes.clone())
            .unwrap_or_default()
    }

    fn sunlight_level(&self, _pos: IVec3) -> u8 {
        self.sunlight.unwrap_or(15)
    }

    fn rain_exposure_height(&self, x: i32, z: i32) -> i32 {
        self.rain_heights.get(&(x, z)).copied().unwrap_or(i32::MIN)
    }
}

/// Records every spawn request instead of rendering it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    now: Mutex<Vec<SpawnRequest>>,
    deferred: Mutex<Vec<(SpawnRequest, u32)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    pub fn now(&self) -> Vec<SpawnRequest> {
        self.now.lock().unwrap().clone()
    }

    pub fn deferred(&self) -> Vec<(SpawnRequest, u32)> {
        self.deferred.lock().unwrap().clone()
    }
}

impl EffectSink for RecordingSink {
    fn spawn_now(&self, request: SpawnRequest) {
        self.now.lock().unwrap().push(request);
    }

    fn spawn_deferred(&self, request: SpawnRequest, delay_ms: u32) {
        self.deferred.lock().unwrap().push((request, delay_ms));
    }
}
