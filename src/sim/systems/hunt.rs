use glam::Vec2;

use crate::config::PredatorConfig;
use crate::sim::components::{Predator, Rank};
use crate::sim::spawn::random_heading;
use crate::sim::systems::{steer, Environment, TickBuffers};
use crate::sim::Props;
use crate::spatial::{PredatorSnapshot, SpatialIndex};

/// How much more reckless predators get at full night.
const NIGHT_AGGRESSION: f32 = 0.5;
/// Obstacle push per unit of closeness.
const OBSTACLE_PUSH: f32 = 0.3;
/// Pack members keep apart with this much extra weight.
const SPACING_WEIGHT: f32 = 1.5;

/// Per-predator tuning derived from lineage and the time of day.
struct Drive {
    max_speed: f32,
    max_force: f32,
    hunt_radius: f32,
}

fn drive(predator: &Predator, env: Environment, config: &PredatorConfig) -> Drive {
    let aggression = 1.0 + env.night() * NIGHT_AGGRESSION;
    let generation = predator.generation.min(config.max_bonus_generations) as f32;
    Drive {
        max_speed: config.base_speed
            + generation * config.speed_per_generation
            + env.night() * config.night_speed_bonus,
        max_force: (config.base_force + generation * config.force_per_generation) * aggression,
        hunt_radius: config.hunt_radius * aggression,
    }
}

/// Chase, capture, regroup. Fills `predator_accel` / `predator_speed` and
/// marks captured boids in `caught`. Returns the number of captures.
///
/// Every distance is measured against the pre-tick snapshots, so a boid is
/// caught by at most one predator: the earliest spawned that reaches it.
pub fn update(
    world: &hecs::World,
    props: &Props,
    index: &SpatialIndex,
    bufs: &mut TickBuffers,
    env: Environment,
    config: &PredatorConfig,
    rng: &mut fastrand::Rng,
) -> u32 {
    let mut kills = 0;

    for i in 0..bufs.predator_snapshots.len() {
        let me = bufs.predator_snapshots[i];
        let Ok(mut predator) = world.get::<&mut Predator>(me.entity) else {
            continue;
        };
        let drive = drive(&predator, env, config);

        // -- Nearest prey outside the shelters --
        index.boids.query_radius_into(me.pos, drive.hunt_radius, &mut bufs.nearby);
        let mut target: Option<(usize, f32)> = None;
        for &j in &bufs.nearby {
            let j = j as usize;
            if bufs.caught[j] {
                continue;
            }
            let prey = &bufs.boid_snapshots[j];
            let dist_sq = prey.pos.distance_squared(me.pos);
            let in_reach = dist_sq <= drive.hunt_radius * drive.hunt_radius;
            if !in_reach || props.shelters.contains(prey.pos) {
                continue;
            }
            let closer = match target {
                Some((best, best_sq)) => dist_sq < best_sq || (dist_sq == best_sq && j < best),
                None => true,
            };
            if closer {
                target = Some((j, dist_sq));
            }
        }

        let mut accel = Vec2::ZERO;
        match target {
            Some((j, dist_sq)) => {
                let prey = bufs.boid_snapshots[j];
                if dist_sq < config.capture_radius * config.capture_radius {
                    bufs.caught[j] = true;
                    predator.energy = (predator.energy + config.hunt_gain).min(config.max_energy);
                    predator.kills += 1;
                    kills += 1;
                } else {
                    let intercept = prey.pos + prey.vel * config.intercept_ticks;
                    accel += steer(intercept - me.pos, drive.max_speed, me.vel, drive.max_force);
                }
            }
            None => accel += regroup(&me, bufs, &drive, config, rng),
        }

        // -- Personal space within the pack --
        index.predators.query_radius_into(me.pos, config.spacing_radius, &mut bufs.nearby);
        let mut away = Vec2::ZERO;
        for &k in &bufs.nearby {
            let k = k as usize;
            if k == i {
                continue;
            }
            let delta = me.pos - bufs.predator_snapshots[k].pos;
            let dist_sq = delta.length_squared();
            if dist_sq > 0.0 && dist_sq < config.spacing_radius * config.spacing_radius {
                away += delta / dist_sq;
            }
        }
        accel += steer(away, drive.max_speed, me.vel, drive.max_force) * SPACING_WEIGHT;

        // -- Obstacles --
        let avoid = config.obstacle_avoid_radius;
        index.obstacles.query_radius_into(me.pos, avoid, &mut bufs.nearby);
        for &k in &bufs.nearby {
            let delta = me.pos - props.obstacles.obstacles[k as usize].pos;
            let dist = delta.length();
            if dist > 0.001 && dist < avoid {
                accel += delta / dist * OBSTACLE_PUSH * (1.0 - dist / avoid);
            }
        }

        predator.energy = (predator.energy - config.energy_decay).max(0.0);
        bufs.predator_accel[i] = accel;
        bufs.predator_speed[i] = drive.max_speed;
    }

    if kills > 0 {
        log::debug!("{kills} boid(s) caught");
    }
    kills
}

/// No prey in range: the leader roams, followers close on their leader (or
/// the pack's center when the leader is gone) and match its heading.
fn regroup(
    me: &PredatorSnapshot,
    bufs: &TickBuffers,
    drive: &Drive,
    config: &PredatorConfig,
    rng: &mut fastrand::Rng,
) -> Vec2 {
    let leader = match me.rank {
        Rank::Leader => return random_heading(rng) * config.wander_strength,
        Rank::Follower(leader) => bufs.predator_slots.get(&leader).copied(),
    };

    let (anchor, heading) = match leader {
        Some(slot) => {
            let lead = &bufs.predator_snapshots[slot];
            (lead.pos, lead.vel)
        }
        None => match bufs.pack_centroids.get(&me.pack) {
            Some(&(sum, count)) if count > 0 => (sum / count as f32, me.vel),
            _ => (me.pos, me.vel),
        },
    };

    let to_anchor = anchor - me.pos;
    if to_anchor.length_squared() > config.pack_radius * config.pack_radius {
        steer(to_anchor, drive.max_speed * 0.8, me.vel, drive.max_force)
    } else {
        steer(heading, drive.max_speed * 0.6, me.vel, drive.max_force * 0.5)
            + random_heading(rng) * config.wander_strength * 0.5
    }
}
