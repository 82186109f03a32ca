//! Multi-species flocking simulation: boids, hunting predator packs, ambient
//! bugs, food and obstacles, advanced one deterministic tick at a time.
//!
//! ```no_run
//! let mut world = flockworld::World::with_seed(800.0, 600.0, 200, 7);
//! world.add_predator(400.0, 300.0);
//! world.tick(0.0, 0.0, 0, 0.0);
//! let boids = world.boid_data(); // 11 floats per boid
//! # let _ = boids;
//! ```

pub mod config;
pub mod daynight;
pub mod props;
pub mod records;
pub mod sim;
pub mod spatial;
pub mod world;

pub use config::SimConfig;
pub use daynight::{DayNightClock, Season};
pub use sim::components::{BoidState, PackId};
pub use sim::systems::TickReport;
pub use sim::{Cursor, CursorMode};
pub use world::World;
