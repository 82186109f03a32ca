use glam::Vec2;

use crate::config::BoidConfig;
use crate::sim::components::{Boid, Position, Velocity};
use crate::sim::systems::{Environment, TickBuffers};
use crate::sim::{Bounds, Props};
use crate::spatial::SpatialIndex;

/// Boids slow to this fraction of top speed at full night.
const NIGHT_SPEED: f32 = 0.6;
/// Extra speed at full fear.
const FEAR_BURST: f32 = 0.5;

/// Bounce off the world edges: mirror the overshoot back inside and point the
/// velocity inward.
pub fn reflect(pos: &mut Vec2, vel: &mut Vec2, bounds: Bounds) {
    if pos.x < 0.0 {
        pos.x = -pos.x;
        vel.x = vel.x.abs();
    } else if pos.x > bounds.width {
        pos.x = 2.0 * bounds.width - pos.x;
        vel.x = -vel.x.abs();
    }
    if pos.y < 0.0 {
        pos.y = -pos.y;
        vel.y = vel.y.abs();
    } else if pos.y > bounds.height {
        pos.y = 2.0 * bounds.height - pos.y;
        vel.y = -vel.y.abs();
    }
    // A step longer than the world itself can still overshoot.
    *pos = pos.clamp(Vec2::ZERO, Vec2::new(bounds.width, bounds.height));
}

/// Toroidal wrap, used by bugs.
pub fn wrap(pos: &mut Vec2, bounds: Bounds) {
    pos.x = pos.x.rem_euclid(bounds.width).min(bounds.width);
    pos.y = pos.y.rem_euclid(bounds.height).min(bounds.height);
}

/// Top speed for a boid right now: slower at night and with age, faster
/// when afraid.
pub fn boid_speed_cap(config: &BoidConfig, env: Environment, boid: &Boid) -> f32 {
    let light = NIGHT_SPEED + env.daylight * (1.0 - NIGHT_SPEED);
    config.max_speed * light * (1.0 + boid.fear * FEAR_BURST) * boid.vigor(config.old_age_speed)
}

pub fn integrate_predators(world: &mut hecs::World, bufs: &TickBuffers, bounds: Bounds) {
    for (i, me) in bufs.predator_snapshots.iter().enumerate() {
        let Ok((pos, vel)) = world.query_one_mut::<(&mut Position, &mut Velocity)>(me.entity)
        else {
            continue;
        };
        vel.0 = (vel.0 + bufs.predator_accel[i]).clamp_length_max(bufs.predator_speed[i]);
        pos.0 += vel.0;
        reflect(&mut pos.0, &mut vel.0, bounds);
    }
}

/// Apply steering, move, bounce, then push any boid that ended up inside an
/// obstacle's hard radius back out to its edge. Resting boids stay put.
pub fn integrate_boids(
    world: &mut hecs::World,
    props: &Props,
    index: &SpatialIndex,
    bufs: &mut TickBuffers,
    env: Environment,
    config: &BoidConfig,
    bounds: Bounds,
) {
    let hard = config.obstacle_hard_radius;
    for i in 0..bufs.boid_snapshots.len() {
        if bufs.caught[i] {
            continue;
        }
        let entity = bufs.boid_snapshots[i].entity;
        let Ok((pos, vel, boid)) =
            world.query_one_mut::<(&mut Position, &mut Velocity, &Boid)>(entity)
        else {
            continue;
        };
        if boid.state.is_resting() {
            vel.0 = Vec2::ZERO;
            continue;
        }
        let cap = boid_speed_cap(config, env, boid);
        vel.0 = (vel.0 + bufs.boid_accel[i]).clamp_length_max(cap);
        pos.0 += vel.0;
        reflect(&mut pos.0, &mut vel.0, bounds);

        index.obstacles.query_radius_into(pos.0, hard, &mut bufs.nearby);
        for &k in &bufs.nearby {
            let center = props.obstacles.obstacles[k as usize].pos;
            let delta = pos.0 - center;
            let dist = delta.length();
            if dist < hard {
                let out = if dist > 0.001 { delta / dist } else { Vec2::X };
                pos.0 = center + out * hard;
                // Drop the inward part of the velocity.
                let inward = vel.0.dot(out);
                if inward < 0.0 {
                    vel.0 -= out * inward;
                }
            }
        }
        pos.0 = pos.0.clamp(Vec2::ZERO, Vec2::new(bounds.width, bounds.height));
    }
}
