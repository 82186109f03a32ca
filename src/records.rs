use bytemuck::{Pod, Zeroable};

use glam::Vec2;

use crate::props::{FoodSource, Obstacle, Shelter};
use crate::sim::components::{Boid, Bug, Position, Predator, Spawned, Velocity};
use crate::sim::in_spawn_order;

// Flat output records. Field order is the wire order: a host reads
// `boid_data()` as consecutive groups of `BoidRecord::FIELDS` floats.

/// Stride = 44 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BoidRecord {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub hue: f32,
    pub energy: f32,
    pub max_energy: f32,
    pub size_mult: f32,
    pub mutation_count: f32,
    pub fear: f32,
    /// 0 wandering, 1 flocking, 2 foraging, 3 fleeing, 4 perching, 5 collapsed.
    pub state: f32,
}

impl BoidRecord {
    pub const FIELDS: usize = 11;

    pub fn new(pos: Vec2, vel: Vec2, b: &Boid) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            vx: vel.x,
            vy: vel.y,
            hue: b.hue,
            energy: b.energy,
            max_energy: b.max_energy,
            size_mult: b.size_mult,
            mutation_count: b.mutation_count as f32,
            fear: b.fear,
            state: b.state.wire_value(),
        }
    }
}

/// Stride = 28 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PredatorRecord {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub energy: f32,
    /// 1.0 for the pack leader, 0.0 otherwise.
    pub is_leader: f32,
    pub generation: f32,
}

impl PredatorRecord {
    pub const FIELDS: usize = 7;

    pub fn new(pos: Vec2, vel: Vec2, p: &Predator) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            vx: vel.x,
            vy: vel.y,
            energy: p.energy,
            is_leader: if p.is_leader() { 1.0 } else { 0.0 },
            generation: p.generation as f32,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BugRecord {
    pub x: f32,
    pub y: f32,
    pub hue: f32,
    pub size: f32,
}

impl BugRecord {
    pub const FIELDS: usize = 4;

    pub fn new(pos: Vec2, b: &Bug) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            hue: b.hue,
            size: b.size,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FoodRecord {
    pub x: f32,
    pub y: f32,
    pub amount: f32,
}

impl FoodRecord {
    pub const FIELDS: usize = 3;
}

impl From<&FoodSource> for FoodRecord {
    fn from(f: &FoodSource) -> Self {
        Self {
            x: f.pos.x,
            y: f.pos.y,
            amount: f.amount,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObstacleRecord {
    pub x: f32,
    pub y: f32,
}

impl ObstacleRecord {
    pub const FIELDS: usize = 2;
}

impl From<&Obstacle> for ObstacleRecord {
    fn from(o: &Obstacle) -> Self {
        Self { x: o.pos.x, y: o.pos.y }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ShelterRecord {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl ShelterRecord {
    pub const FIELDS: usize = 3;
}

impl From<&Shelter> for ShelterRecord {
    fn from(s: &Shelter) -> Self {
        Self {
            x: s.pos.x,
            y: s.pos.y,
            radius: s.radius,
        }
    }
}

/// Population summary: boid_count, predator_count, bug_count, day_phase.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Stats {
    pub boid_count: f32,
    pub predator_count: f32,
    pub bug_count: f32,
    pub day_phase: f32,
}

impl Stats {
    pub const FIELDS: usize = 4;
}

/// Every boid's record, in spawn order.
pub fn boid_records(world: &hecs::World) -> Vec<BoidRecord> {
    in_spawn_order(
        world
            .query::<(&Spawned, &Position, &Velocity, &Boid)>()
            .iter()
            .map(|(_, (order, pos, vel, boid))| (*order, BoidRecord::new(pos.0, vel.0, boid)))
            .collect(),
    )
}

pub fn predator_records(world: &hecs::World) -> Vec<PredatorRecord> {
    in_spawn_order(
        world
            .query::<(&Spawned, &Position, &Velocity, &Predator)>()
            .iter()
            .map(|(_, (order, pos, vel, p))| (*order, PredatorRecord::new(pos.0, vel.0, p)))
            .collect(),
    )
}

pub fn bug_records(world: &hecs::World) -> Vec<BugRecord> {
    in_spawn_order(
        world
            .query::<(&Spawned, &Position, &Bug)>()
            .iter()
            .map(|(_, (order, pos, bug))| (*order, BugRecord::new(pos.0, bug)))
            .collect(),
    )
}

/// Reinterpret records as bare floats.
pub fn floats<R: Pod>(records: &[R]) -> Vec<f32> {
    bytemuck::cast_slice(records).to_vec()
}

/// Convert every item to its record and flatten to bare floats.
pub fn flatten<'a, T, R>(items: impl IntoIterator<Item = &'a T>) -> Vec<f32>
where
    T: 'a,
    R: Pod + From<&'a T>,
{
    let records: Vec<R> = items.into_iter().map(R::from).collect();
    floats(&records)
}
