use glam::Vec2;

use crate::config::SimConfig;
use crate::daynight::{DayNightClock, Season};
use crate::props::{FoodSources, Obstacles, Shelters};
use crate::records::{
    self, flatten, floats, BoidRecord, FoodRecord, ObstacleRecord, PredatorRecord, ShelterRecord,
    Stats,
};
use crate::sim::components::{Boid, BoidState, Position};
use crate::sim::spawn::{new_boid, new_predator, seed_boids};
use crate::sim::systems::{self, TickBuffers, TickReport};
use crate::sim::{Agents, Bounds, Cursor, Props};
use crate::spatial::SpatialIndex;

/// Spacing between boids dropped by [`World::add_boids`].
const BATCH_SPACING: f32 = 5.0;
/// Random scatter around each batch slot.
const BATCH_SCATTER: f32 = 20.0;

/// The whole simulation. Owns every agent, the clock and the RNG; a host
/// drives it with [`World::tick`] and reads it back through the `*_data`
/// queries.
pub struct World {
    config: SimConfig,
    bounds: Bounds,
    clock: DayNightClock,
    rng: fastrand::Rng,
    agents: Agents,
    props: Props,
    index: SpatialIndex,
    bufs: TickBuffers,
}

impl World {
    pub fn new(width: f32, height: f32, start_boids: u32) -> Self {
        Self::with_config(width, height, start_boids, SimConfig::default())
    }

    pub fn with_seed(width: f32, height: f32, start_boids: u32, seed: u64) -> Self {
        Self::with_config(width, height, start_boids, SimConfig::with_seed(seed))
    }

    pub fn with_config(width: f32, height: f32, start_boids: u32, config: SimConfig) -> Self {
        let bounds = Bounds::new(width, height);
        let mut rng = fastrand::Rng::with_seed(config.seed);
        let mut agents = Agents::new();
        let boids = seed_boids(
            &mut rng,
            &config.boid,
            start_boids as usize,
            bounds.width,
            bounds.height,
        );
        for boid in boids {
            agents.spawn_boid(boid);
        }
        log::info!(
            "world {}x{} with {} boids (seed {})",
            bounds.width,
            bounds.height,
            agents.boid_count(),
            config.seed
        );

        Self {
            clock: DayNightClock::new(&config.clock),
            agents,
            props: Props {
                food: FoodSources::new(config.food.capacity),
                obstacles: Obstacles::new(),
                shelters: Shelters::for_bounds(bounds.width, bounds.height),
            },
            index: SpatialIndex::new(config.spatial.cell_size, bounds.width, bounds.height),
            bufs: TickBuffers::new(start_boids as usize),
            bounds,
            rng,
            config,
        }
    }

    /// Start over with new bounds and population, replaying the construction
    /// seed.
    pub fn reset(&mut self, width: f32, height: f32, start_boids: u32) {
        log::info!("reset");
        *self = Self::with_config(width, height, start_boids, self.config.clone());
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Advance one tick. `cursor_mode`: 0 none, 1 attract, 2 repel; any other
    /// value acts as none.
    pub fn tick(&mut self, x: f32, y: f32, cursor_mode: i32, strength: f32) -> TickReport {
        self.tick_with(Cursor::new(x, y, cursor_mode, strength))
    }

    pub fn tick_with(&mut self, cursor: Cursor) -> TickReport {
        systems::tick(
            &mut self.agents,
            &mut self.props,
            &mut self.clock,
            self.bounds,
            cursor,
            &self.config,
            &mut self.rng,
            &mut self.index,
            &mut self.bufs,
        )
    }

    // -----------------------------------------------------------------------
    // Mutators. Positions are clamped into the world.
    // -----------------------------------------------------------------------

    pub fn add_boid(&mut self, x: f32, y: f32, species: u8) {
        let pos = self.bounds.clamp_point(x, y);
        let boid = new_boid(&mut self.rng, &self.config.boid, pos, species);
        self.agents.spawn_boid(boid);
    }

    /// Drop a short row of boids centred on (x, y), species picked at random.
    pub fn add_boids(&mut self, x: f32, y: f32, count: u32) {
        let half = count as f32 / 2.0;
        for i in 0..count {
            let ox = (i as f32 - half) * BATCH_SPACING + (self.rng.f32() - 0.5) * BATCH_SCATTER;
            let oy = (self.rng.f32() - 0.5) * BATCH_SCATTER;
            let species = if self.rng.bool() { 0 } else { 1 };
            self.add_boid(x + ox, y + oy, species);
        }
    }

    /// Found a new pack with this predator as its leader.
    pub fn add_predator(&mut self, x: f32, y: f32) {
        let pos = self.bounds.clamp_point(x, y);
        let pack = self.agents.next_pack_id();
        let predator = new_predator(&mut self.rng, &self.config.predator, pos, pack);
        log::debug!("pack {pack} founded at ({:.0}, {:.0})", pos.x, pos.y);
        self.agents.spawn_predator(predator);
    }

    pub fn add_food(&mut self, x: f32, y: f32) {
        let pos = self.bounds.clamp_point(x, y);
        self.props.food.spawn(pos);
    }

    pub fn add_obstacle(&mut self, x: f32, y: f32) {
        let pos = self.bounds.clamp_point(x, y);
        self.props.obstacles.spawn(pos);
    }

    /// Remove the obstacle nearest (x, y) if one lies within the removal
    /// radius. Returns whether anything was removed.
    pub fn remove_obstacle(&mut self, x: f32, y: f32) -> bool {
        let pos = self.bounds.clamp_point(x, y);
        self.props.obstacles.remove_near(pos)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn boid_data(&self) -> Vec<f32> {
        floats(&self.boid_records())
    }

    pub fn predator_data(&self) -> Vec<f32> {
        floats(&self.predator_records())
    }

    pub fn bug_data(&self) -> Vec<f32> {
        floats(&records::bug_records(&self.agents.world))
    }

    pub fn food_data(&self) -> Vec<f32> {
        flatten::<_, FoodRecord>(&self.props.food.sources)
    }

    pub fn obstacle_data(&self) -> Vec<f32> {
        flatten::<_, ObstacleRecord>(&self.props.obstacles.obstacles)
    }

    pub fn shelter_data(&self) -> Vec<f32> {
        flatten::<_, ShelterRecord>(&self.props.shelters.shelters)
    }

    /// `[boid_count, predator_count, bug_count, day_phase]`.
    pub fn stats(&self) -> Vec<f32> {
        let stats = Stats {
            boid_count: self.agents.boid_count() as f32,
            predator_count: self.agents.predator_count() as f32,
            bug_count: self.agents.bug_count() as f32,
            day_phase: self.clock.day_phase(),
        };
        floats(&[stats])
    }

    pub fn width(&self) -> f32 {
        self.bounds.width
    }

    pub fn height(&self) -> f32 {
        self.bounds.height
    }

    pub fn day_phase(&self) -> f32 {
        self.clock.day_phase()
    }

    pub fn daylight(&self) -> f32 {
        self.clock.daylight()
    }

    pub fn season(&self) -> Season {
        self.clock.season()
    }

    pub fn tick_count(&self) -> u64 {
        self.clock.tick()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Boid records in spawn order, the typed form of [`World::boid_data`].
    pub fn boid_records(&self) -> Vec<BoidRecord> {
        records::boid_records(&self.agents.world)
    }

    pub fn predator_records(&self) -> Vec<PredatorRecord> {
        records::predator_records(&self.agents.world)
    }

    /// Centre of mass of the boids, if any.
    pub fn boid_centroid(&self) -> Option<Vec2> {
        let (sum, n) = self
            .agents
            .world
            .query::<(&Position, &Boid)>()
            .iter()
            .fold((Vec2::ZERO, 0u32), |(sum, n), (_, (pos, _))| (sum + pos.0, n + 1));
        (n > 0).then(|| sum / n as f32)
    }

    /// How many boids are in each state, in state order.
    pub fn state_census(&self) -> Vec<(BoidState, usize)> {
        let mut counts = [0usize; BoidState::ALL.len()];
        for (_, boid) in self.agents.world.query::<&Boid>().iter() {
            counts[boid.state as usize] += 1;
        }
        BoidState::ALL.into_iter().zip(counts).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_world_does_not_grow() {
        let mut world = World::new(800.0, 600.0, 50);
        for _ in 0..100 {
            world.tick(0.0, 0.0, 0, 0.0);
        }
        let stats = world.stats();
        assert_eq!(stats.len(), 4);
        assert!(stats[0] <= 50.0);
        assert!((0.0..1.0).contains(&stats[3]));
    }

    #[test]
    fn obstacle_removed_near_its_position() {
        let mut world = World::new(800.0, 600.0, 0);
        world.add_obstacle(100.0, 100.0);
        assert_eq!(world.obstacle_data(), vec![100.0, 100.0]);
        assert!(world.remove_obstacle(105.0, 102.0));
        assert!(world.obstacle_data().is_empty());
        assert!(!world.remove_obstacle(105.0, 102.0));
    }

    #[test]
    fn predator_catches_adjacent_boid() {
        let mut world = World::with_config(800.0, 600.0, 0, SimConfig::calm(9));
        world.add_boid(400.0, 300.0, 0);
        world.add_predator(405.0, 300.0);

        let report = world.tick(0.0, 0.0, 0, 0.0);

        let config = world.config().predator.clone();
        assert_eq!(report.kills, 1);
        assert_eq!(world.stats()[0], 0.0);
        let energy = world.predator_data()[4];
        let expected = config.start_energy + config.hunt_gain - config.energy_decay;
        assert!((energy - expected).abs() < 1e-3);
    }

    #[test]
    fn same_seed_same_story() {
        let run = || {
            let mut world = World::with_seed(640.0, 480.0, 120, 4242);
            world.add_predator(320.0, 240.0);
            world.add_food(100.0, 100.0);
            world.add_obstacle(300.0, 200.0);
            world.add_boids(200.0, 200.0, 10);
            for t in 0..300 {
                let x = (t as f32 * 2.0) % 640.0;
                world.tick(x, 240.0, (t % 3) as i32, 1.0);
            }
            (
                world.boid_data(),
                world.predator_data(),
                world.bug_data(),
                world.food_data(),
                world.stats(),
            )
        };
        let a = run();
        let b = run();
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
        assert_eq!(a.2, b.2);
        assert_eq!(a.3, b.3);
        assert_eq!(a.4, b.4);
    }

    #[test]
    fn reset_replays_the_seed() {
        let mut world = World::with_seed(400.0, 400.0, 30, 5);
        let initial = world.boid_data();
        world.add_predator(200.0, 200.0);
        for _ in 0..20 {
            world.tick(0.0, 0.0, 0, 0.0);
        }
        world.reset(400.0, 400.0, 30);
        assert_eq!(world.boid_data(), initial);
        assert!(world.predator_data().is_empty());
        assert_eq!(world.tick_count(), 0);
    }

    #[test]
    fn energy_stays_in_range_over_a_long_run() {
        let mut world = World::with_seed(600.0, 400.0, 150, 31);
        world.add_predator(100.0, 100.0);
        world.add_predator(500.0, 300.0);
        for (x, y) in [(150.0, 150.0), (450.0, 250.0), (300.0, 100.0)] {
            world.add_food(x, y);
        }
        world.add_obstacle(300.0, 200.0);

        let predator_max = world.config().predator.max_energy;
        for t in 0..2_000 {
            world.tick(300.0, 200.0, if t % 200 < 100 { 1 } else { 2 }, 0.5);
            for boid in world.boid_records() {
                assert!(boid.energy > 0.0 && boid.energy <= boid.max_energy);
                assert!((0.0..=1.0).contains(&boid.fear));
                assert!(boid.x >= 0.0 && boid.x <= 600.0);
                assert!(boid.y >= 0.0 && boid.y <= 400.0);
            }
            for predator in world.predator_records() {
                assert!(predator.energy > 0.0 && predator.energy <= predator_max);
            }
        }
        assert!(world.boid_records().len() <= world.config().boid.max_boids);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let mut world = World::new(200.0, 100.0, 0);
        world.add_boid(-50.0, 1e9, 3);
        world.add_food(f32::NAN, 50.0);
        world.add_obstacle(f32::INFINITY, -1.0);

        let boid = world.boid_data();
        assert_eq!(&boid[..2], &[0.0, 100.0]);
        assert_eq!(world.boid_records()[0].state, BoidState::Wandering.wire_value());
        assert_eq!(&world.food_data()[..2], &[0.0, 50.0]);
        assert_eq!(world.obstacle_data(), vec![0.0, 0.0]);

        world.tick(f32::NAN, f32::NAN, 1, f32::INFINITY);
        assert_eq!(world.stats()[0], 1.0);
    }

    #[test]
    fn add_boids_adds_exactly_count() {
        let mut world = World::new(800.0, 600.0, 0);
        world.add_boids(400.0, 300.0, 12);
        assert_eq!(world.boid_data().len(), 12 * BoidRecord::FIELDS);
        assert_eq!(world.shelter_data().len(), 2 * ShelterRecord::FIELDS);
    }

    #[test]
    fn cursor_cannot_drag_boids_into_an_obstacle() {
        let mut config = SimConfig::calm(17);
        config.boid.max_boids = 40;
        let hard = config.boid.obstacle_hard_radius;
        let mut world = World::with_config(800.0, 600.0, 0, config);
        world.add_obstacle(400.0, 300.0);
        world.add_boids(400.0, 150.0, 40);

        for _ in 0..500 {
            world.tick(400.0, 300.0, 1, 5.0);
            for boid in world.boid_records() {
                let dist = Vec2::new(boid.x, boid.y).distance(Vec2::new(400.0, 300.0));
                assert!(dist >= hard - 1e-3, "boid {dist} from the obstacle center");
            }
        }
    }

    #[test]
    fn census_covers_every_boid() {
        let mut world = World::with_seed(400.0, 300.0, 60, 3);
        for _ in 0..50 {
            world.tick(0.0, 0.0, 0, 0.0);
        }
        let census = world.state_census();
        assert_eq!(census.len(), BoidState::ALL.len());
        let total: usize = census.iter().map(|(_, n)| n).sum();
        assert_eq!(total, world.boid_records().len());
        assert!(world.boid_centroid().is_some());
        assert!(World::new(400.0, 300.0, 0).boid_centroid().is_none());
    }
}
