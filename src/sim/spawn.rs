use glam::Vec2;

use crate::config::{BoidConfig, BugConfig, PredatorConfig};
use crate::sim::components::{
    Boid, BoidState, Bug, PackId, Position, Predator, Rank, Temperament, Velocity,
};

/// Share of the seed population that starts as species 0.
const SPECIES_ZERO_SHARE: f32 = 0.55;
/// Seed boids stay out of the bottom strip where the shelters sit.
const SEED_BOTTOM_MARGIN: f32 = 120.0;
/// Hybrids are greenish whatever their species.
const HYBRID_HUE: f32 = 120.0;

/// Random unit vector.
pub fn random_heading(rng: &mut fastrand::Rng) -> Vec2 {
    Vec2::from_angle(rng.f32() * std::f32::consts::TAU)
}

/// Random offset inside a disc of the given radius.
fn jitter(rng: &mut fastrand::Rng, radius: f32) -> Vec2 {
    random_heading(rng) * rng.f32() * radius
}

/// Base hue band per species: blues, ambers, then spread around the wheel.
fn species_hue(rng: &mut fastrand::Rng, species: u8) -> f32 {
    let base = match species {
        0 => 190.0,
        1 => 40.0,
        n => (n as f32 * 97.0).rem_euclid(360.0),
    };
    wrap_hue(base + rng.f32() * 30.0)
}

/// Hue into [0, 360). `rem_euclid` alone can round tiny negatives up to 360.
fn wrap_hue(hue: f32) -> f32 {
    let wrapped = hue.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn max_age(rng: &mut fastrand::Rng, config: &BoidConfig) -> u32 {
    let (lo, hi) = config.lifespan;
    lo + rng.u32(0..=hi.saturating_sub(lo))
}

/// A fresh boid with randomized heading, energy and temperament.
pub fn new_boid(
    rng: &mut fastrand::Rng,
    config: &BoidConfig,
    pos: Vec2,
    species: u8,
) -> (Position, Velocity, Boid) {
    let speed = 2.0 + rng.f32() * 2.0;
    let vel = random_heading(rng) * speed;
    let (lo, hi) = config.start_energy;
    let max_energy = config.base_max_energy;
    let boid = Boid {
        species,
        is_hybrid: false,
        hue: species_hue(rng, species),
        energy: (lo + rng.f32() * (hi - lo)).clamp(0.0, max_energy),
        max_energy,
        size_mult: 1.0,
        mutation_count: 0,
        fear: 0.0,
        fatigue: 0.0,
        age: 0,
        max_age: max_age(rng, config),
        rest_timer: 0,
        state: BoidState::Wandering,
        temperament: Temperament {
            bravery: rng.f32(),
            sociability: rng.f32(),
            hunger: rng.f32(),
            laziness: rng.f32(),
        },
    };
    (Position(pos), Velocity(vel), boid)
}

/// Initial population: ~55% species 0, the rest species 1, scattered above
/// the shelter strip.
pub fn seed_boids(
    rng: &mut fastrand::Rng,
    config: &BoidConfig,
    count: usize,
    width: f32,
    height: f32,
) -> Vec<(Position, Velocity, Boid)> {
    let species_zero = (count as f32 * SPECIES_ZERO_SHARE) as usize;
    let usable_h = (height - SEED_BOTTOM_MARGIN).max(height * 0.5);
    (0..count)
        .map(|i| {
            let species = if i < species_zero { 0 } else { 1 };
            let pos = Vec2::new(rng.f32() * width, rng.f32() * usable_h);
            new_boid(rng, config, pos, species)
        })
        .collect()
}

/// Split a parent's energy with a drifted copy of it.
///
/// The parent keeps half its energy; the other half seeds the child (capped at
/// the child's own max). Hue, size and temperament drift a little and the
/// child's mutation count is one more than the parent's. Hybrid parents have
/// hybrid young; anyone else has a small chance of one.
pub fn breed_boid(
    rng: &mut fastrand::Rng,
    config: &BoidConfig,
    parent: &mut Boid,
    parent_pos: Vec2,
    parent_vel: Vec2,
) -> (Position, Velocity, Boid) {
    let cost = parent.energy * 0.5;
    parent.energy -= cost;

    let (min_size, max_size) = config.size_range;
    let size_mult = (parent.size_mult + signed(rng) * config.size_drift).clamp(min_size, max_size);
    let max_energy = config.base_max_energy * size_mult;
    let is_hybrid = parent.is_hybrid || rng.f32() < config.hybrid_chance;
    let hue = if is_hybrid && !parent.is_hybrid {
        HYBRID_HUE + rng.f32() * 30.0
    } else {
        wrap_hue(parent.hue + signed(rng) * config.hue_drift)
    };
    let t = parent.temperament;

    let child = Boid {
        species: parent.species,
        is_hybrid,
        hue,
        energy: cost.min(max_energy),
        max_energy,
        size_mult,
        mutation_count: parent.mutation_count + 1,
        fear: 0.0,
        fatigue: 0.0,
        age: 0,
        max_age: max_age(rng, config),
        rest_timer: 0,
        state: BoidState::Wandering,
        temperament: Temperament {
            bravery: drift_trait(rng, t.bravery, config.trait_drift),
            sociability: drift_trait(rng, t.sociability, config.trait_drift),
            hunger: drift_trait(rng, t.hunger, config.trait_drift),
            laziness: drift_trait(rng, t.laziness, config.trait_drift),
        },
    };
    let pos = parent_pos + jitter(rng, config.spawn_jitter);
    let vel = random_heading(rng) * parent_vel.length().max(1.0);
    (Position(pos), Velocity(vel), child)
}

/// Pack founder. Leads its pack from birth.
pub fn new_predator(
    rng: &mut fastrand::Rng,
    config: &PredatorConfig,
    pos: Vec2,
    pack: PackId,
) -> (Position, Velocity, Predator) {
    let predator = Predator {
        energy: config.start_energy.min(config.max_energy),
        pack,
        rank: Rank::Leader,
        generation: 0,
        kills: 0,
    };
    (Position(pos), Velocity(random_heading(rng) * 2.0), predator)
}

/// Offspring joins the parent's pack as a follower of the parent's leader
/// (the parent itself if it leads), one generation deeper. The parent pays
/// `reproduction_cost`, which seeds the child.
pub fn breed_predator(
    rng: &mut fastrand::Rng,
    config: &PredatorConfig,
    parent: &mut Predator,
    parent_entity: hecs::Entity,
    parent_pos: Vec2,
) -> (Position, Velocity, Predator) {
    let cost = config.reproduction_cost.min(parent.energy);
    parent.energy -= cost;
    let leader = match parent.rank {
        Rank::Leader => parent_entity,
        Rank::Follower(leader) => leader,
    };
    let child = Predator {
        energy: cost.min(config.max_energy),
        pack: parent.pack,
        rank: Rank::Follower(leader),
        generation: parent.generation + 1,
        kills: 0,
    };
    let pos = parent_pos + jitter(rng, config.spawn_jitter);
    (Position(pos), Velocity(random_heading(rng) * 2.0), child)
}

pub fn new_bug(
    rng: &mut fastrand::Rng,
    config: &BugConfig,
    pos: Vec2,
) -> (Position, Velocity, Bug) {
    let (lo, hi) = config.lifetime;
    let vel = random_heading(rng) * (1.0 + rng.f32());
    let bug = Bug {
        hue: if rng.bool() { 60.0 } else { 120.0 },
        size: 2.0 + rng.f32() * 2.0,
        lifetime: lo + rng.u32(0..=hi.saturating_sub(lo)),
    };
    (Position(pos), Velocity(vel), bug)
}

/// Uniform in [-1, 1).
fn signed(rng: &mut fastrand::Rng) -> f32 {
    rng.f32() * 2.0 - 1.0
}

fn drift_trait(rng: &mut fastrand::Rng, value: f32, amount: f32) -> f32 {
    (value + signed(rng) * amount).clamp(0.0, 1.0)
}
