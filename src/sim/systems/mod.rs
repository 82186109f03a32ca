pub mod ambient;
pub mod cursor;
pub mod flock;
pub mod hunt;
pub mod lifecycle;
pub mod movement;
pub mod spatial;

use std::collections::HashMap;

use glam::Vec2;

use crate::config::SimConfig;
use crate::daynight::{DayNightClock, Season};
use crate::sim::components::{PackId, Spawned};
use crate::sim::{Agents, Bounds, Cursor, Props};
use crate::spatial::{BoidSnapshot, PredatorSnapshot, SpatialIndex};

/// Environment values every system reads, sampled once after the clock moves.
#[derive(Debug, Clone, Copy)]
pub struct Environment {
    /// Brightness in [0, 1].
    pub daylight: f32,
    pub season: Season,
}

impl Environment {
    pub fn night(&self) -> f32 {
        1.0 - self.daylight
    }
}

/// What happened during one tick, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub kills: u32,
    pub boids_starved: u32,
    pub boids_born: u32,
    pub predators_starved: u32,
    pub predators_born: u32,
    pub leaders_promoted: u32,
}

// ---------------------------------------------------------------------------
// Buffers (pre-allocated, reused each tick)
// ---------------------------------------------------------------------------

/// Per-tick scratch. Snapshots are the frozen pre-tick state every query
/// reads, sorted by spawn order; slot `i` of every per-agent buffer belongs to
/// snapshot `i`.
pub struct TickBuffers {
    pub boid_snapshots: Vec<BoidSnapshot>,
    pub predator_snapshots: Vec<PredatorSnapshot>,
    /// Snapshot slot of each predator entity.
    pub predator_slots: HashMap<hecs::Entity, usize>,
    /// Steering accumulated for each boid this tick (cursor first).
    pub boid_accel: Vec<Vec2>,
    pub predator_accel: Vec<Vec2>,
    pub predator_speed: Vec<f32>,
    /// Boids caught this tick. Skipped by every later system, dropped in lifecycle.
    pub caught: Vec<bool>,
    /// Food requested per source this tick, applied after all boids have eaten.
    pub bites: Vec<f32>,
    /// Position sum and member count per pack.
    pub pack_centroids: HashMap<PackId, (Vec2, u32)>,
    pub nearby: Vec<u32>,
    /// Entities to despawn once the current pass lets go of the world.
    pub doomed: Vec<hecs::Entity>,
    /// Bugs in spawn order.
    pub bug_order: Vec<(Spawned, hecs::Entity)>,
}

impl TickBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            boid_snapshots: Vec::with_capacity(capacity),
            predator_snapshots: Vec::with_capacity(16),
            predator_slots: HashMap::new(),
            boid_accel: Vec::with_capacity(capacity),
            predator_accel: Vec::with_capacity(16),
            predator_speed: Vec::with_capacity(16),
            caught: Vec::with_capacity(capacity),
            bites: Vec::with_capacity(8),
            pack_centroids: HashMap::new(),
            nearby: Vec::with_capacity(64),
            doomed: Vec::with_capacity(64),
            bug_order: Vec::with_capacity(64),
        }
    }
}

/// Desired-velocity steering: head along `desired` at `speed`, limited to
/// `max_force`. Zero when there's no direction to go.
pub fn steer(desired: Vec2, speed: f32, vel: Vec2, max_force: f32) -> Vec2 {
    let dir = desired.normalize_or_zero();
    if dir == Vec2::ZERO {
        return Vec2::ZERO;
    }
    (dir * speed - vel).clamp_length_max(max_force)
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Run all simulation systems for one tick.
#[allow(clippy::too_many_arguments)]
pub fn tick(
    agents: &mut Agents,
    props: &mut Props,
    clock: &mut DayNightClock,
    bounds: Bounds,
    cursor: Cursor,
    config: &SimConfig,
    rng: &mut fastrand::Rng,
    index: &mut SpatialIndex,
    bufs: &mut TickBuffers,
) -> TickReport {
    // 1. Clock
    clock.advance();
    let env = Environment {
        daylight: clock.daylight(),
        season: clock.season(),
    };

    // 2. Rebuild spatial index + snapshot cache
    spatial::rebuild(agents, props, index, bufs);

    // 3. Cursor attract/repel seeds boid steering
    cursor::apply(cursor, &config.cursor, index, bufs);

    // 4. Predators hunt against the frozen boid snapshot
    let kills = hunt::update(&agents.world, props, index, bufs, env, &config.predator, rng);
    movement::integrate_predators(&mut agents.world, bufs, bounds);

    // 5. Boids rest or flock, forage, flee
    flock::update(&agents.world, props, index, bufs, env, &config.boid, rng);
    movement::integrate_boids(&mut agents.world, props, index, bufs, env, &config.boid, bounds);

    // 6. Bugs drift on their own
    ambient::update_bugs(agents, props, index, bufs, env, &config.bug, rng, bounds);

    // 7. Deaths, then births
    let mut report = lifecycle::resolve(agents, bufs, config, rng, bounds);
    report.kills = kills;

    // 8. Food housekeeping
    ambient::update_food(&mut props.food, &bufs.bites, env, &config.food, rng, bounds);

    lifecycle::check_invariants(agents);

    if report != TickReport::default() {
        log::trace!("tick {}: {:?}", clock.tick(), report);
    }
    report
}
