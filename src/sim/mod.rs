pub mod components;
pub mod spawn;
pub mod systems;

use glam::Vec2;

use crate::props::{FoodSources, Obstacles, Shelters};
use components::{Boid, Bug, PackId, Position, Predator, Spawned, Velocity};

/// World rectangle. Boids and predators reflect off its edges, bugs wrap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    /// Degenerate or non-finite sizes become 1x1.
    pub fn new(width: f32, height: f32) -> Self {
        let sane = |v: f32| if v.is_finite() && v >= 1.0 { v } else { 1.0 };
        Self {
            width: sane(width),
            height: sane(height),
        }
    }

    /// Pull a caller-supplied point into the world. Non-finite axes go to 0.
    pub fn clamp_point(&self, x: f32, y: f32) -> Vec2 {
        let fix = |v: f32, max: f32| if v.is_finite() { v.clamp(0.0, max) } else { 0.0 };
        Vec2::new(fix(x, self.width), fix(y, self.height))
    }
}

/// What the cursor does to nearby boids this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    None,
    Attract,
    Repel,
}

impl CursorMode {
    /// 1 = attract, 2 = repel, anything else = none.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Attract,
            2 => Self::Repel,
            _ => Self::None,
        }
    }
}

/// External force applied to boids near a point.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub pos: Vec2,
    pub mode: CursorMode,
    pub strength: f32,
}

impl Cursor {
    pub const NONE: Cursor = Cursor {
        pos: Vec2::ZERO,
        mode: CursorMode::None,
        strength: 0.0,
    };

    pub fn new(x: f32, y: f32, mode: i32, strength: f32) -> Self {
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
        Self {
            pos: Vec2::new(finite(x), finite(y)),
            mode: CursorMode::from_code(mode),
            strength: finite(strength).max(0.0),
        }
    }
}

/// Every live agent as an entity in one `hecs::World`. Boids carry
/// `(Position, Velocity, Spawned, Boid)`, predators and bugs the same with
/// their own data component.
pub struct Agents {
    pub world: hecs::World,
    next_spawn: u64,
    next_pack: PackId,
}

impl Default for Agents {
    fn default() -> Self {
        Self::new()
    }
}

impl Agents {
    pub fn new() -> Self {
        Self {
            world: hecs::World::new(),
            next_spawn: 0,
            next_pack: 0,
        }
    }

    pub fn spawn_boid(&mut self, (pos, vel, boid): (Position, Velocity, Boid)) -> hecs::Entity {
        let order = self.next_order();
        self.world.spawn((pos, vel, order, boid))
    }

    pub fn spawn_predator(
        &mut self,
        (pos, vel, predator): (Position, Velocity, Predator),
    ) -> hecs::Entity {
        let order = self.next_order();
        self.world.spawn((pos, vel, order, predator))
    }

    pub fn spawn_bug(&mut self, (pos, vel, bug): (Position, Velocity, Bug)) -> hecs::Entity {
        let order = self.next_order();
        self.world.spawn((pos, vel, order, bug))
    }

    /// Fresh id for a newly founded pack.
    pub fn next_pack_id(&mut self) -> PackId {
        let id = self.next_pack;
        self.next_pack = self.next_pack.wrapping_add(1);
        id
    }

    pub fn boid_count(&self) -> usize {
        self.world.query::<&Boid>().iter().count()
    }

    pub fn predator_count(&self) -> usize {
        self.world.query::<&Predator>().iter().count()
    }

    pub fn bug_count(&self) -> usize {
        self.world.query::<&Bug>().iter().count()
    }

    fn next_order(&mut self) -> Spawned {
        let order = Spawned(self.next_spawn);
        self.next_spawn += 1;
        order
    }
}

/// Drop the spawn-order keys after sorting by them.
pub fn in_spawn_order<T>(mut rows: Vec<(Spawned, T)>) -> Vec<T> {
    rows.sort_unstable_by_key(|(order, _)| *order);
    rows.into_iter().map(|(_, row)| row).collect()
}

/// Static and slow-changing world features.
pub struct Props {
    pub food: FoodSources,
    pub obstacles: Obstacles,
    pub shelters: Shelters,
}
