use glam::Vec2;

use crate::config::BoidConfig;
use crate::sim::components::{Boid, BoidState};
use crate::sim::spawn::random_heading;
use crate::sim::systems::{steer, Environment, TickBuffers};
use crate::sim::Props;
use crate::spatial::{BoidSnapshot, SpatialIndex};

/// Cohesion radius grows by this much at full night.
const NIGHT_HUDDLE: f32 = 0.5;
/// Fully frightened boids keep only a quarter of their flocking pull.
const FEAR_DAMPING: f32 = 0.75;
/// Timid boids notice predators this much further out.
const TIMID_ALARM: f32 = 0.5;
/// Perching only happens below, and waking only above, this daylight.
const DUSK: f32 = 0.5;

/// Summed neighbor forces for one boid.
#[derive(Default)]
struct Neighborhood {
    separation: Vec2,
    alignment: Vec2,
    cohesion: Vec2,
    flockmates: u32,
}

/// Separation from everyone. Alignment and cohesion with awake flockmates:
/// the same species, or anyone when either side is a hybrid. Other species
/// still pull on alignment at `cross_species_alignment`. Reads the frozen
/// snapshot so results don't depend on update order.
fn neighborhood(
    i: usize,
    me: &BoidSnapshot,
    nearby: &[u32],
    snapshots: &[BoidSnapshot],
    caught: &[bool],
    cohesion_radius: f32,
    config: &BoidConfig,
) -> Neighborhood {
    let mut push = Vec2::ZERO;
    let mut heading = Vec2::ZERO;
    let mut heading_weight = 0.0;
    let mut center = Vec2::ZERO;
    let mut flockmates = 0u32;

    for &j in nearby {
        let j = j as usize;
        if j == i || caught[j] {
            continue;
        }
        let other = &snapshots[j];
        let delta = me.pos - other.pos;
        let dist_sq = delta.length_squared();

        if dist_sq > 0.0 && dist_sq < config.separation_radius * config.separation_radius {
            push += delta / dist_sq;
        }
        if other.resting {
            continue;
        }
        let kin = me.flocks_with(other);
        if dist_sq < config.alignment_radius * config.alignment_radius {
            let weight = if kin { 1.0 } else { config.cross_species_alignment };
            heading += other.vel * weight;
            heading_weight += weight;
        }
        if kin && dist_sq < cohesion_radius * cohesion_radius {
            center += other.pos;
            flockmates += 1;
        }
    }

    let speed = config.max_speed;
    let force = config.max_force;
    let mut out = Neighborhood {
        flockmates,
        ..Default::default()
    };
    out.separation = steer(push, speed, me.vel, force);
    if heading_weight > 0.0 {
        out.alignment = steer(heading / heading_weight, speed, me.vel, force);
    }
    if flockmates > 0 {
        out.cohesion = steer(center / flockmates as f32 - me.pos, speed, me.vel, force);
    }
    out
}

/// Advance a resting boid. Returns true while it keeps resting this tick.
fn rest(boid: &mut Boid, env: Environment, config: &BoidConfig) -> bool {
    match boid.state {
        BoidState::Collapsed => {
            boid.rest_timer = boid.rest_timer.saturating_sub(1);
            if boid.rest_timer > 0 {
                boid.energy -= config.collapse_energy_cost;
                return true;
            }
            boid.fatigue = config.recovered_fatigue;
            boid.state = BoidState::Wandering;
            false
        }
        BoidState::Perching => {
            boid.fatigue = (boid.fatigue - config.perch_recovery).max(0.0);
            let rested = env.daylight > DUSK && boid.fatigue < config.wake_fatigue;
            if rested || boid.fear > config.wake_fear {
                boid.state = BoidState::Wandering;
                return false;
            }
            boid.energy -= config.perch_energy_cost;
            true
        }
        _ => false,
    }
}

/// Steering, fear, foraging, fatigue, energy and the state label for every
/// live boid. Writes the final acceleration into `boid_accel` (on top of the
/// cursor pull) and queues food bites into `bites`. Resting boids get no
/// steering at all.
pub fn update(
    world: &hecs::World,
    props: &Props,
    index: &SpatialIndex,
    bufs: &mut TickBuffers,
    env: Environment,
    config: &BoidConfig,
    rng: &mut fastrand::Rng,
) {
    for i in 0..bufs.boid_snapshots.len() {
        if bufs.caught[i] {
            continue;
        }
        let me = bufs.boid_snapshots[i];
        let Ok(mut boid) = world.get::<&mut Boid>(me.entity) else {
            continue;
        };
        let t = boid.temperament;
        boid.age = boid.age.saturating_add(1);

        // -- Fear --
        let sheltered = props.shelters.contains(me.pos);
        let alarm_radius = config.alarm_radius * (1.0 + (1.0 - t.bravery) * TIMID_ALARM);
        let mut threat: Option<(Vec2, f32)> = None;
        if !sheltered {
            index.predators.query_radius_into(me.pos, alarm_radius, &mut bufs.nearby);
            for &k in &bufs.nearby {
                let pos = bufs.predator_snapshots[k as usize].pos;
                let dist = pos.distance(me.pos);
                if dist < alarm_radius && threat.map_or(true, |(_, best)| dist < best) {
                    threat = Some((pos, dist));
                }
            }
        }
        boid.fear = if sheltered {
            0.0
        } else {
            let target = threat.map_or(0.0, |(_, dist)| 1.0 - dist / alarm_radius);
            target.max(boid.fear * config.fear_decay).clamp(0.0, 1.0)
        };

        // -- Rest --
        if rest(&mut boid, env, config) {
            boid.energy = boid.energy.clamp(0.0, boid.max_energy);
            bufs.boid_accel[i] = Vec2::ZERO;
            continue;
        }
        let fleeing = boid.fear > config.flee_threshold;

        // -- Flocking --
        let cohesion_radius =
            config.cohesion_radius * (1.0 + env.night() * NIGHT_HUDDLE + t.sociability * 0.3);
        let perception = cohesion_radius
            .max(config.alignment_radius)
            .max(config.separation_radius);
        index.boids.query_radius_into(me.pos, perception, &mut bufs.nearby);
        let hood = neighborhood(
            i,
            &me,
            &bufs.nearby,
            &bufs.boid_snapshots,
            &bufs.caught,
            cohesion_radius,
            config,
        );

        let flee = match threat {
            Some((pos, _)) => {
                let urgency = config.flee_weight * boid.fear * (1.5 - 0.5 * t.bravery);
                let burst = config.max_speed * 1.5;
                steer(me.pos - pos, burst, me.vel, config.max_force * 2.0) * urgency
            }
            None => Vec2::ZERO,
        };

        // -- Obstacles --
        let avoid_radius = if fleeing {
            config.obstacle_avoid_radius * 1.6
        } else {
            config.obstacle_avoid_radius
        };
        index.obstacles.query_radius_into(me.pos, avoid_radius, &mut bufs.nearby);
        let mut away = Vec2::ZERO;
        let mut too_close = false;
        for &k in &bufs.nearby {
            let delta = me.pos - props.obstacles.obstacles[k as usize].pos;
            let dist_sq = delta.length_squared();
            if dist_sq < avoid_radius * avoid_radius {
                away += delta / (dist_sq + 0.001);
                too_close |= dist_sq < config.obstacle_hard_radius * config.obstacle_hard_radius;
            }
        }
        let (avoid_force, avoid_weight) = if fleeing { (3.0, 3.0) } else { (2.0, 1.0) };
        let avoid =
            steer(away, config.max_speed, me.vel, config.max_force * avoid_force) * avoid_weight;

        // -- Foraging --
        let mut forage = Vec2::ZERO;
        let mut foraging = false;
        let mut gained = 0.0;
        if !fleeing && boid.energy < config.forage_high_water * boid.max_energy {
            let reach = config.forage_radius * (0.5 + t.hunger);
            index.food.query_radius_into(me.pos, reach, &mut bufs.nearby);
            let mut nearest: Option<(usize, f32)> = None;
            for &k in &bufs.nearby {
                let k = k as usize;
                let source = &props.food.sources[k];
                let dist_sq = source.pos.distance_squared(me.pos);
                if source.amount > 0.0
                    && dist_sq < reach * reach
                    && nearest.map_or(true, |(_, best)| dist_sq < best)
                {
                    nearest = Some((k, dist_sq));
                }
            }
            if let Some((k, dist_sq)) = nearest {
                foraging = true;
                if dist_sq < config.eat_radius * config.eat_radius {
                    bufs.bites[k] += config.bite_size;
                    gained = config.eat_gain;
                } else {
                    let to_food = props.food.sources[k].pos - me.pos;
                    let appetite = 0.5 + t.hunger;
                    forage = steer(to_food, config.max_speed, me.vel, config.max_force) * appetite;
                }
            }
        }

        // -- Fatigue --
        let strain = (config.fatigue_rate - t.laziness * config.laziness_relief).max(0.0);
        boid.fatigue += strain + boid.fear * config.fear_fatigue;
        if gained > 0.0 {
            boid.fatigue = (boid.fatigue - config.eat_rest).max(0.0);
        }

        // -- Combine --
        boid.state = if boid.fatigue > config.collapse_fatigue {
            boid.rest_timer = config.collapse_ticks;
            BoidState::Collapsed
        } else if !fleeing && env.daylight < DUSK && boid.fatigue >= config.perch_fatigue {
            BoidState::Perching
        } else if fleeing {
            BoidState::Fleeing
        } else if foraging {
            BoidState::Foraging
        } else if hood.flockmates > 0 {
            BoidState::Flocking
        } else {
            BoidState::Wandering
        };

        let accel = if boid.state.is_resting() {
            Vec2::ZERO
        } else if too_close {
            avoid
        } else {
            let calm = 1.0 - boid.fear * FEAR_DAMPING;
            let flocking = hood.separation * config.separation_weight
                + hood.alignment
                + hood.cohesion * (1.0 + t.sociability * 0.3);
            let mut total = bufs.boid_accel[i] + flocking * calm + flee + avoid + forage;
            if boid.state == BoidState::Wandering {
                total += random_heading(rng) * config.wander_strength;
            }
            total
        };
        bufs.boid_accel[i] = accel;

        // -- Energy --
        let mut burn = config.energy_decay + t.hunger * config.hunger_decay;
        if fleeing {
            burn += config.flee_energy_cost;
        }
        boid.energy = (boid.energy - burn + gained).clamp(0.0, boid.max_energy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::daynight::Season;
    use crate::props::{FoodSources, Obstacles, Shelters};
    use crate::sim::spawn::{new_boid, new_predator};
    use crate::sim::systems::spatial;
    use crate::sim::Agents;

    const NOON: Environment = Environment {
        daylight: 1.0,
        season: Season::Summer,
    };
    const MIDNIGHT: Environment = Environment {
        daylight: 0.0,
        season: Season::Summer,
    };

    struct Scene {
        agents: Agents,
        props: Props,
        index: SpatialIndex,
        bufs: TickBuffers,
        rng: fastrand::Rng,
        boids: Vec<hecs::Entity>,
    }

    impl Scene {
        fn new(positions: &[Vec2]) -> Self {
            Self::with_species(&positions.iter().map(|&p| (p, 0)).collect::<Vec<_>>())
        }

        fn with_species(boids: &[(Vec2, u8)]) -> Self {
            let config = SimConfig::default();
            let mut rng = fastrand::Rng::with_seed(8);
            let mut agents = Agents::new();
            let boids = boids
                .iter()
                .map(|&(p, species)| {
                    agents.spawn_boid(new_boid(&mut rng, &config.boid, p, species))
                })
                .collect();
            Self {
                agents,
                props: Props {
                    food: FoodSources::new(100.0),
                    obstacles: Obstacles::new(),
                    shelters: Shelters::for_bounds(800.0, 600.0),
                },
                index: SpatialIndex::new(100.0, 800.0, 600.0),
                bufs: TickBuffers::new(16),
                rng,
                boids,
            }
        }

        fn boid(&self, i: usize) -> hecs::RefMut<'_, Boid> {
            self.agents.world.get::<&mut Boid>(self.boids[i]).unwrap()
        }

        fn add_predator(&mut self, pos: Vec2) {
            let mut rng = fastrand::Rng::with_seed(1);
            let pack = self.agents.next_pack_id();
            let bundle = new_predator(&mut rng, &SimConfig::default().predator, pos, pack);
            self.agents.spawn_predator(bundle);
        }

        fn rebuild(&mut self) {
            spatial::rebuild(&self.agents, &self.props, &mut self.index, &mut self.bufs);
        }

        fn update(&mut self, env: Environment, config: &BoidConfig) {
            update(
                &self.agents.world,
                &self.props,
                &self.index,
                &mut self.bufs,
                env,
                config,
                &mut self.rng,
            );
        }

        fn step(&mut self) {
            self.step_at(NOON, &BoidConfig::default());
        }

        fn step_at(&mut self, env: Environment, config: &BoidConfig) {
            self.rebuild();
            self.update(env, config);
        }
    }

    #[test]
    fn nearby_predator_raises_fear_and_flees() {
        let mut scene = Scene::new(&[Vec2::new(400.0, 300.0)]);
        scene.add_predator(Vec2::new(420.0, 300.0));

        scene.step();

        assert!(scene.boid(0).fear > 0.5);
        assert_eq!(scene.boid(0).state, BoidState::Fleeing);
        assert!(scene.bufs.boid_accel[0].x < 0.0);
    }

    #[test]
    fn fear_decays_without_threats() {
        let mut scene = Scene::new(&[Vec2::new(400.0, 300.0)]);
        scene.boid(0).fear = 1.0;
        let mut last = 1.0;
        for _ in 0..50 {
            scene.step();
            let fear = scene.boid(0).fear;
            assert!(fear < last);
            last = fear;
        }
        assert!(last < 0.1);
        assert_ne!(scene.boid(0).state, BoidState::Fleeing);
    }

    #[test]
    fn sheltered_boid_feels_no_fear() {
        let mut scene = Scene::new(&[Vec2::new(80.0, 500.0)]);
        scene.boid(0).fear = 0.9;
        scene.add_predator(Vec2::new(100.0, 500.0));

        scene.step();

        assert_eq!(scene.boid(0).fear, 0.0);
    }

    #[test]
    fn hungry_boid_eats_and_queues_a_bite() {
        let mut scene = Scene::new(&[Vec2::new(400.0, 300.0)]);
        scene.props.food.spawn(Vec2::new(405.0, 300.0));
        scene.boid(0).energy = 10.0;
        scene.boid(0).fatigue = 5.0;

        scene.step();

        let config = BoidConfig::default();
        assert_eq!(scene.boid(0).state, BoidState::Foraging);
        assert!(scene.boid(0).energy > 10.0);
        assert!(scene.boid(0).fatigue < 5.0);
        assert!((scene.bufs.bites[0] - config.bite_size).abs() < 1e-6);
    }

    #[test]
    fn lone_boid_wanders_and_pairs_flock() {
        let mut scene = Scene::new(&[
            Vec2::new(100.0, 100.0),
            Vec2::new(600.0, 100.0),
            Vec2::new(620.0, 100.0),
        ]);
        scene.step();
        assert_eq!(scene.boid(0).state, BoidState::Wandering);
        assert_eq!(scene.boid(1).state, BoidState::Flocking);
    }

    #[test]
    fn species_only_mix_through_hybrids() {
        let mut scene =
            Scene::with_species(&[(Vec2::new(400.0, 300.0), 0), (Vec2::new(420.0, 300.0), 1)]);
        scene.step();
        assert_eq!(scene.boid(0).state, BoidState::Wandering);

        scene.boid(1).is_hybrid = true;
        scene.step();
        assert_eq!(scene.boid(0).state, BoidState::Flocking);
        assert_eq!(scene.boid(1).state, BoidState::Flocking);
    }

    #[test]
    fn energy_never_leaves_range() {
        let mut scene = Scene::new(&[Vec2::new(400.0, 300.0)]);
        scene.boid(0).energy = 0.001;
        scene.step();
        assert_eq!(scene.boid(0).energy, 0.0);
    }

    #[test]
    fn fear_and_flight_wear_a_boid_out() {
        let mut scene = Scene::new(&[Vec2::new(400.0, 300.0)]);
        scene.step();
        let calm = scene.boid(0).fatigue;

        let mut scene = Scene::new(&[Vec2::new(400.0, 300.0)]);
        scene.add_predator(Vec2::new(420.0, 300.0));
        scene.step();
        assert!(scene.boid(0).fatigue > calm);
        assert!(calm > 0.0);
    }

    #[test]
    fn exhausted_boid_collapses_then_recovers() {
        let config = BoidConfig::default();
        let mut scene = Scene::new(&[Vec2::new(400.0, 300.0)]);
        scene.boid(0).fatigue = config.collapse_fatigue;
        scene.boid(0).energy = 90.0;

        scene.step();
        assert_eq!(scene.boid(0).state, BoidState::Collapsed);
        assert_eq!(scene.bufs.boid_accel[0], Vec2::ZERO);

        for _ in 1..config.collapse_ticks {
            scene.step();
            assert_eq!(scene.boid(0).state, BoidState::Collapsed);
            assert_eq!(scene.bufs.boid_accel[0], Vec2::ZERO);
        }
        scene.step();
        assert_ne!(scene.boid(0).state, BoidState::Collapsed);
        assert!(scene.boid(0).fatigue < config.perch_fatigue);
        assert!(scene.boid(0).energy < 90.0);
    }

    #[test]
    fn tired_boids_perch_at_night_and_wake_rested_at_dawn() {
        let config = BoidConfig::default();
        let mut scene = Scene::new(&[Vec2::new(400.0, 300.0)]);
        scene.boid(0).fatigue = config.perch_fatigue + 1.0;

        scene.step_at(MIDNIGHT, &config);
        assert_eq!(scene.boid(0).state, BoidState::Perching);

        // Still dark: stays put however rested.
        for _ in 0..200 {
            scene.step_at(MIDNIGHT, &config);
        }
        assert_eq!(scene.boid(0).state, BoidState::Perching);
        assert_eq!(scene.boid(0).fatigue, 0.0);

        scene.step_at(NOON, &config);
        assert_ne!(scene.boid(0).state, BoidState::Perching);
    }

    #[test]
    fn predator_startles_a_perched_boid() {
        let config = BoidConfig::default();
        let mut scene = Scene::new(&[Vec2::new(400.0, 300.0)]);
        scene.boid(0).state = BoidState::Perching;
        scene.boid(0).fatigue = config.perch_fatigue;
        scene.add_predator(Vec2::new(405.0, 300.0));

        scene.step_at(MIDNIGHT, &config);

        assert_eq!(scene.boid(0).state, BoidState::Fleeing);
    }

    #[test]
    fn inside_the_hard_radius_only_avoidance_counts() {
        let config = BoidConfig::default();
        let mut scene = Scene::new(&[Vec2::new(400.0, 300.0)]);
        scene.props.obstacles.spawn(Vec2::new(410.0, 300.0));
        scene.rebuild();
        // A strong cursor pull straight into the obstacle.
        scene.bufs.boid_accel[0] = Vec2::new(50.0, 0.0);

        scene.update(NOON, &config);

        let accel = scene.bufs.boid_accel[0];
        assert!(accel.x < 0.0, "accel {accel} still heads into the obstacle");
        assert!(accel.length() <= config.max_force * 2.0 + 1e-4);
    }
}
