use glam::Vec2;

use crate::config::{BugConfig, FoodConfig};
use crate::props::FoodSources;
use crate::sim::components::{Bug, Position, Spawned, Velocity};
use crate::sim::spawn::{new_bug, random_heading};
use crate::sim::systems::movement::wrap;
use crate::sim::systems::{Environment, TickBuffers};
use crate::sim::{Agents, Bounds, Props};
use crate::spatial::SpatialIndex;

/// Ambient food only appears while it's at least this bright.
const FOOD_DAYLIGHT: f32 = 0.45;
/// Bugs stay out of this strip at the bottom of the world when spawning.
const BUG_GROUND: f32 = 100.0;

// ---------------------------------------------------------------------------
// Bugs
// ---------------------------------------------------------------------------

/// Spawn, cull, drift and age the bug swarm. Bugs are livelier at night,
/// skirt obstacles and wrap around the edges.
#[allow(clippy::too_many_arguments)]
pub fn update_bugs(
    agents: &mut Agents,
    props: &Props,
    index: &SpatialIndex,
    bufs: &mut TickBuffers,
    env: Environment,
    config: &BugConfig,
    rng: &mut fastrand::Rng,
    bounds: Bounds,
) {
    let season = env.season.index();
    let cap = config.max_bugs[season];
    if agents.bug_count() < cap && rng.f32() < config.spawn_chance[season] {
        let sky = (bounds.height - BUG_GROUND).max(bounds.height * 0.5);
        let pos = Vec2::new(rng.f32() * bounds.width, rng.f32() * sky);
        agents.spawn_bug(new_bug(rng, config, pos));
    }

    bufs.bug_order.clear();
    bufs.bug_order.extend(
        agents.world.query::<(&Spawned, &Bug)>().iter().map(|(e, (order, _))| (*order, e)),
    );
    bufs.bug_order.sort_unstable();
    // Seasons shrink the cap; thin out the oldest one bug per tick.
    if bufs.bug_order.len() > cap {
        let (_, oldest) = bufs.bug_order.remove(0);
        let _ = agents.world.despawn(oldest);
    }

    let speed = config.max_speed * (0.6 + env.night() * 0.4);
    let clearance = config.obstacle_radius;
    bufs.doomed.clear();
    for &(_, entity) in &bufs.bug_order {
        let Ok((pos, vel, bug)) =
            agents.world.query_one_mut::<(&mut Position, &mut Velocity, &mut Bug)>(entity)
        else {
            continue;
        };
        vel.0 = (vel.0 + random_heading(rng) * config.wander_strength).clamp_length_max(speed);

        let next = pos.0 + vel.0;
        index.obstacles.query_radius_into(next, clearance, &mut bufs.nearby);
        for &k in &bufs.nearby {
            let delta = next - props.obstacles.obstacles[k as usize].pos;
            if delta.length_squared() < clearance * clearance {
                vel.0 = delta.normalize_or(Vec2::X) * speed;
                break;
            }
        }

        pos.0 += vel.0;
        wrap(&mut pos.0, bounds);
        bug.lifetime = bug.lifetime.saturating_sub(1);
        if bug.lifetime == 0 {
            bufs.doomed.push(entity);
        }
    }
    for entity in bufs.doomed.drain(..) {
        let _ = agents.world.despawn(entity);
    }
}

// ---------------------------------------------------------------------------
// Food
// ---------------------------------------------------------------------------

/// Apply this tick's bites, regrow every source, and maybe sprout a new one
/// during the day.
pub fn update_food(
    food: &mut FoodSources,
    bites: &[f32],
    env: Environment,
    config: &FoodConfig,
    rng: &mut fastrand::Rng,
    bounds: Bounds,
) {
    for (k, &bite) in bites.iter().enumerate() {
        if bite > 0.0 {
            food.deplete(k, bite);
        }
    }
    food.regenerate(config.regen_rate);

    let chance = config.spawn_chance * config.season_spawn_scale[env.season.index()];
    if env.daylight > FOOD_DAYLIGHT && food.len() < config.max_sources && rng.f32() < chance {
        let margin_x = config.spawn_margin.min(bounds.width * 0.5);
        let margin_y = config.spawn_margin.min(bounds.height * 0.5);
        let pos = Vec2::new(
            margin_x + rng.f32() * (bounds.width - 2.0 * margin_x),
            margin_y + rng.f32() * (bounds.height - 2.0 * margin_y),
        );
        food.spawn(pos);
        log::debug!("food sprouted at ({:.0}, {:.0})", pos.x, pos.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daynight::Season;
    use crate::props::{Obstacles, Shelters};

    fn env(daylight: f32, season: Season) -> Environment {
        Environment { daylight, season }
    }

    #[test]
    fn bites_deplete_then_regrow() {
        let mut food = FoodSources::new(100.0);
        food.spawn(Vec2::new(10.0, 10.0));
        let mut config = FoodConfig::default();
        config.spawn_chance = 0.0;
        let mut rng = fastrand::Rng::with_seed(1);

        let bounds = Bounds::new(100.0, 100.0);
        update_food(&mut food, &[1.2], env(1.0, Season::Spring), &config, &mut rng, bounds);

        let expected = 100.0 - 1.2 + config.regen_rate;
        assert!((food.sources[0].amount - expected).abs() < 1e-4);
    }

    #[test]
    fn no_food_sprouts_at_night() {
        let mut food = FoodSources::new(100.0);
        let mut config = FoodConfig::default();
        config.spawn_chance = 1.0;
        let mut rng = fastrand::Rng::with_seed(1);
        let bounds = Bounds::new(400.0, 300.0);

        update_food(&mut food, &[], env(0.1, Season::Summer), &config, &mut rng, bounds);
        assert!(food.is_empty());

        for _ in 0..20 {
            update_food(&mut food, &[], env(0.9, Season::Summer), &config, &mut rng, bounds);
        }
        assert_eq!(food.len(), config.max_sources);
        for source in &food.sources {
            let x = source.pos.x;
            assert!(x >= config.spawn_margin && x <= 400.0 - config.spawn_margin);
        }
    }

    fn bug_scene(width: f32, height: f32) -> (Props, SpatialIndex, TickBuffers) {
        let props = Props {
            food: FoodSources::new(100.0),
            obstacles: Obstacles::new(),
            shelters: Shelters::for_bounds(width, height),
        };
        let index = SpatialIndex::new(100.0, width, height);
        (props, index, TickBuffers::new(4))
    }

    #[test]
    fn bugs_age_out_and_respect_the_season_cap() {
        let (props, index, mut bufs) = bug_scene(400.0, 300.0);
        let mut rng = fastrand::Rng::with_seed(6);
        let mut config = BugConfig::default();
        config.spawn_chance = [1.0; 4];
        config.lifetime = (3, 3);
        let bounds = Bounds::new(400.0, 300.0);
        let winter = env(0.5, Season::Winter);
        let mut agents = Agents::new();

        for _ in 0..10 {
            update_bugs(&mut agents, &props, &index, &mut bufs, winter, &config, &mut rng, bounds);
            assert!(agents.bug_count() <= config.max_bugs[Season::Winter.index()]);
            for (_, (_, pos)) in agents.world.query::<(&Bug, &Position)>().iter() {
                assert!(pos.0.x >= 0.0 && pos.0.x <= 400.0);
                assert!(pos.0.y >= 0.0 && pos.0.y <= 300.0);
            }
        }
        // One spawn per tick, three ticks to live.
        assert_eq!(agents.bug_count(), 2);
    }

    #[test]
    fn shrinking_cap_culls_the_oldest_bug_first() {
        let (props, index, mut bufs) = bug_scene(400.0, 300.0);
        let mut rng = fastrand::Rng::with_seed(7);
        let mut config = BugConfig::default();
        config.spawn_chance = [0.0; 4];
        config.lifetime = (1_000, 1_000);
        let mut agents = Agents::new();
        let bugs: Vec<_> = (0..3)
            .map(|i| {
                let pos = Vec2::new(50.0 + i as f32 * 100.0, 100.0);
                agents.spawn_bug(new_bug(&mut rng, &config, pos))
            })
            .collect();
        config.max_bugs = [2; 4];

        let bounds = Bounds::new(400.0, 300.0);
        let night = env(0.0, Season::Autumn);
        update_bugs(&mut agents, &props, &index, &mut bufs, night, &config, &mut rng, bounds);

        assert!(!agents.world.contains(bugs[0]));
        assert!(agents.world.contains(bugs[1]) && agents.world.contains(bugs[2]));
    }
}
