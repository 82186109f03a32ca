//! Simulation tunables. Every number a rule depends on lives here so a host
//! can swap presets without touching the systems.

/// Top-level configuration handed to [`crate::World::with_config`].
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Seed for the world-owned RNG. Same seed + same calls = same output.
    pub seed: u64,
    pub spatial: SpatialConfig,
    pub clock: ClockConfig,
    pub boid: BoidConfig,
    pub predator: PredatorConfig,
    pub bug: BugConfig,
    pub food: FoodConfig,
    pub cursor: CursorConfig,
}

/// Default RNG seed when the host doesn't inject one.
pub const DEFAULT_SEED: u64 = 77_777;

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            spatial: SpatialConfig::default(),
            clock: ClockConfig::default(),
            boid: BoidConfig::default(),
            predator: PredatorConfig::default(),
            bug: BugConfig::default(),
            food: FoodConfig::default(),
            cursor: CursorConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Calm preset: no ambient food, no bugs. Handy for isolating flocking.
    pub fn calm(seed: u64) -> Self {
        let mut config = Self::with_seed(seed);
        config.food.spawn_chance = 0.0;
        config.bug.spawn_chance = [0.0; 4];
        config
    }
}

#[derive(Debug, Clone)]
pub struct SpatialConfig {
    /// Grid cell edge. Sized near the boid perception radius.
    pub cell_size: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { cell_size: 100.0 }
    }
}

#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Ticks per full day/night cycle (~70s at 60 ticks/s).
    pub day_length: u64,
    /// Days per season.
    pub days_per_season: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            day_length: 4_200,
            days_per_season: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoidConfig {
    /// Speed cap before day/fear modifiers.
    pub max_speed: f32,
    /// Per-rule steering force cap.
    pub max_force: f32,

    pub separation_radius: f32,
    pub separation_weight: f32,
    pub alignment_radius: f32,
    /// Alignment pull toward boids of another species (same species = 1.0).
    pub cross_species_alignment: f32,
    /// Base cohesion radius; widened at night and by sociability.
    pub cohesion_radius: f32,

    /// Base alarm radius; timid boids notice predators further out.
    pub alarm_radius: f32,
    pub flee_weight: f32,
    /// Per-tick multiplier applied to fear when no threat is near.
    pub fear_decay: f32,
    /// Fear above this counts as fleeing.
    pub flee_threshold: f32,

    /// Steering kicks in inside this radius of an obstacle.
    pub obstacle_avoid_radius: f32,
    /// Inside this radius avoidance replaces every other force.
    pub obstacle_hard_radius: f32,

    /// Base food detection radius, scaled by hunger.
    pub forage_radius: f32,
    /// Distance at which a boid is "at" a food source.
    pub eat_radius: f32,
    /// Stop looking for food above this fraction of max energy.
    pub forage_high_water: f32,
    pub eat_gain: f32,
    /// Food amount removed per boid per tick while eating.
    pub bite_size: f32,

    pub base_max_energy: f32,
    pub energy_decay: f32,
    /// Extra decay per unit of hunger.
    pub hunger_decay: f32,
    pub flee_energy_cost: f32,
    /// Reproduce at or above this fraction of max energy.
    pub reproduction_threshold: f32,
    /// Spawned boids start with energy in this range.
    pub start_energy: (f32, f32),

    pub hue_drift: f32,
    pub size_drift: f32,
    pub size_range: (f32, f32),
    pub trait_drift: f32,
    /// Offspring spawn within this distance of the parent.
    pub spawn_jitter: f32,
    pub max_boids: usize,
    /// Random heading change applied to boids with no neighbors.
    pub wander_strength: f32,
    /// Chance that an offspring is a hybrid that flocks with every species.
    pub hybrid_chance: f32,

    /// Fatigue gained per active tick before laziness.
    pub fatigue_rate: f32,
    /// Fatigue rate reduction per unit of laziness.
    pub laziness_relief: f32,
    /// Extra fatigue per tick at full fear.
    pub fear_fatigue: f32,
    /// Fatigue shed per bite of food.
    pub eat_rest: f32,
    /// Tired boids perch at night once fatigue reaches this.
    pub perch_fatigue: f32,
    /// Fatigue shed per perched tick.
    pub perch_recovery: f32,
    /// Perched boids wake after dawn once fatigue drops below this.
    pub wake_fatigue: f32,
    /// Fear that startles a perched boid awake.
    pub wake_fear: f32,
    pub perch_energy_cost: f32,
    /// Fatigue past this knocks a boid out.
    pub collapse_fatigue: f32,
    pub collapse_ticks: u32,
    pub collapse_energy_cost: f32,
    /// Fatigue a boid wakes up with after collapsing.
    pub recovered_fatigue: f32,

    /// Max age range in ticks. Old boids slow down but don't die of it.
    pub lifespan: (u32, u32),
    /// Speed multiplier reached at max age.
    pub old_age_speed: f32,
}

impl Default for BoidConfig {
    fn default() -> Self {
        Self {
            max_speed: 4.0,
            max_force: 0.15,

            separation_radius: 25.0,
            separation_weight: 1.8,
            alignment_radius: 50.0,
            cross_species_alignment: 0.2,
            cohesion_radius: 50.0,

            alarm_radius: 100.0,
            flee_weight: 4.0,
            fear_decay: 0.95,
            flee_threshold: 0.3,

            obstacle_avoid_radius: 50.0,
            obstacle_hard_radius: 14.0,

            forage_radius: 70.0,
            eat_radius: 12.0,
            forage_high_water: 0.95,
            eat_gain: 1.0,
            bite_size: 0.4,

            base_max_energy: 100.0,
            energy_decay: 0.012,
            hunger_decay: 0.005,
            flee_energy_cost: 0.04,
            reproduction_threshold: 0.85,
            start_energy: (40.0, 70.0),

            hue_drift: 8.0,
            size_drift: 0.06,
            size_range: (0.6, 1.6),
            trait_drift: 0.05,
            spawn_jitter: 10.0,
            max_boids: 2_000,
            wander_strength: 0.05,
            hybrid_chance: 0.03,

            fatigue_rate: 0.025,
            laziness_relief: 0.01,
            fear_fatigue: 0.04,
            eat_rest: 0.3,
            perch_fatigue: 60.0,
            perch_recovery: 0.8,
            wake_fatigue: 20.0,
            wake_fear: 0.5,
            perch_energy_cost: 0.003,
            collapse_fatigue: 150.0,
            collapse_ticks: 100,
            collapse_energy_cost: 0.01,
            recovered_fatigue: 50.0,

            lifespan: (8_000, 12_000),
            old_age_speed: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PredatorConfig {
    pub base_speed: f32,
    /// Max speed gained per generation.
    pub speed_per_generation: f32,
    pub base_force: f32,
    pub force_per_generation: f32,
    /// Generation bonuses stop growing past this.
    pub max_bonus_generations: u32,
    /// Extra speed at full night.
    pub night_speed_bonus: f32,
    /// Hunt radius at full daylight; grows at night.
    pub hunt_radius: f32,
    /// Ticks of prey velocity to lead the target by.
    pub intercept_ticks: f32,
    pub capture_radius: f32,

    pub start_energy: f32,
    pub max_energy: f32,
    pub hunt_gain: f32,
    pub energy_decay: f32,
    pub reproduction_threshold: f32,
    /// Energy moved from parent to offspring.
    pub reproduction_cost: f32,
    pub spawn_jitter: f32,
    pub max_predators: usize,

    /// Followers start steering back to the pack past this distance.
    pub pack_radius: f32,
    pub spacing_radius: f32,
    pub obstacle_avoid_radius: f32,
    pub wander_strength: f32,
}

impl Default for PredatorConfig {
    fn default() -> Self {
        Self {
            base_speed: 3.5,
            speed_per_generation: 0.3,
            base_force: 0.1,
            force_per_generation: 0.02,
            max_bonus_generations: 5,
            night_speed_bonus: 2.0,
            hunt_radius: 150.0,
            intercept_ticks: 8.0,
            capture_radius: 12.0,

            start_energy: 80.0,
            max_energy: 150.0,
            hunt_gain: 45.0,
            energy_decay: 0.04,
            reproduction_threshold: 140.0,
            reproduction_cost: 70.0,
            spawn_jitter: 15.0,
            max_predators: 64,

            pack_radius: 60.0,
            spacing_radius: 20.0,
            obstacle_avoid_radius: 30.0,
            wander_strength: 0.08,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BugConfig {
    /// Per-tick spawn chance, indexed by season.
    pub spawn_chance: [f32; 4],
    /// Population cap, indexed by season.
    pub max_bugs: [usize; 4],
    /// Lifetime range in ticks.
    pub lifetime: (u32, u32),
    pub max_speed: f32,
    pub wander_strength: f32,
    pub obstacle_radius: f32,
}

impl Default for BugConfig {
    fn default() -> Self {
        Self {
            // Spring, Summer, Autumn, Winter.
            spawn_chance: [0.08, 0.15, 0.08, 0.03],
            max_bugs: [40, 60, 40, 20],
            lifetime: (500, 1_000),
            max_speed: 2.0,
            wander_strength: 0.15,
            obstacle_radius: 18.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FoodConfig {
    /// Amount a fresh source holds.
    pub capacity: f32,
    /// Amount regained per tick, up to capacity.
    pub regen_rate: f32,
    /// Per-tick ambient spawn chance during daylight.
    pub spawn_chance: f32,
    /// Multiplier on `spawn_chance`, indexed by season.
    pub season_spawn_scale: [f32; 4],
    /// Ambient spawning stops at this many sources.
    pub max_sources: usize,
    /// Ambient sources keep this far from the edges.
    pub spawn_margin: f32,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            capacity: 100.0,
            regen_rate: 0.02,
            spawn_chance: 0.0015,
            season_spawn_scale: [1.0, 2.0, 1.0, 0.2],
            max_sources: 5,
            spawn_margin: 50.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CursorConfig {
    /// Cursor only affects boids within this distance.
    pub radius: f32,
    /// Force at the cursor itself for strength 1.0, falling off linearly.
    pub force: f32,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            radius: 100.0,
            force: 0.3,
        }
    }
}
