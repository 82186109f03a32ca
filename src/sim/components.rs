use glam::Vec2;

/// Current world position.
#[derive(Debug, Clone, Copy)]
pub struct Position(pub Vec2);

/// Velocity in world units per tick.
#[derive(Debug, Clone, Copy)]
pub struct Velocity(pub Vec2);

/// Spawn sequence number, unique per world. Systems visit agents in this
/// order and output records follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Spawned(pub u64);

/// Dominant behavior this tick, highest priority first: collapsed, perching,
/// fleeing, foraging, flocking, wandering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BoidState {
    Wandering = 0,
    Flocking = 1,
    Foraging = 2,
    Fleeing = 3,
    /// Resting by choice at night; wakes at dawn once recovered or when scared.
    Perching = 4,
    /// Worn out. Lies still for a fixed number of ticks.
    Collapsed = 5,
}

impl BoidState {
    pub const ALL: [BoidState; 6] = [
        Self::Wandering,
        Self::Flocking,
        Self::Foraging,
        Self::Fleeing,
        Self::Perching,
        Self::Collapsed,
    ];

    /// Value written into the `state` field of boid records.
    pub fn wire_value(self) -> f32 {
        self as u8 as f32
    }

    pub fn is_resting(self) -> bool {
        matches!(self, Self::Perching | Self::Collapsed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Wandering => "wandering",
            Self::Flocking => "flocking",
            Self::Foraging => "foraging",
            Self::Fleeing => "fleeing",
            Self::Perching => "perching",
            Self::Collapsed => "collapsed",
        }
    }
}

/// Inherited behavior traits, each in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperament {
    /// Shrinks the alarm radius and softens the flee response.
    pub bravery: f32,
    /// Widens and strengthens cohesion.
    pub sociability: f32,
    /// Widens forage range, burns energy faster.
    pub hunger: f32,
    /// Slows the build-up of fatigue.
    pub laziness: f32,
}

/// Everything about a boid except where it is and where it's going.
#[derive(Debug, Clone)]
pub struct Boid {
    pub species: u8,
    /// Flocks with every species, not just its own.
    pub is_hybrid: bool,
    /// Color in degrees, [0, 360).
    pub hue: f32,
    pub energy: f32,
    pub max_energy: f32,
    /// Visual scale; also scales `max_energy`.
    pub size_mult: f32,
    /// Number of reproductions in this boid's ancestry.
    pub mutation_count: u32,
    /// Predator alarm in [0, 1].
    pub fear: f32,
    /// Builds up while active, drains while resting.
    pub fatigue: f32,
    /// Ticks lived.
    pub age: u32,
    /// Age at which the boid reaches its slowest.
    pub max_age: u32,
    /// Ticks left in the collapsed state.
    pub rest_timer: u32,
    pub state: BoidState,
    pub temperament: Temperament,
}

impl Boid {
    /// Speed multiplier from age: 1.0 at birth, falling linearly to
    /// `slowest` at `max_age` and staying there.
    pub fn vigor(&self, slowest: f32) -> f32 {
        if self.max_age == 0 {
            return slowest;
        }
        let worn = self.age as f32 / self.max_age as f32;
        (1.0 - worn * (1.0 - slowest)).max(slowest)
    }
}

/// Lineage id. Every predator descended from the same explicitly spawned
/// founder carries the founder's pack id.
pub type PackId = u32;

/// Standing within a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Leader,
    /// Follows the given leader entity.
    Follower(hecs::Entity),
}

#[derive(Debug, Clone)]
pub struct Predator {
    pub energy: f32,
    pub pack: PackId,
    pub rank: Rank,
    /// Lineage depth. Founders are generation 0.
    pub generation: u32,
    pub kills: u32,
}

impl Predator {
    pub fn is_leader(&self) -> bool {
        self.rank == Rank::Leader
    }
}

/// Decorative ambient agent.
#[derive(Debug, Clone)]
pub struct Bug {
    pub hue: f32,
    pub size: f32,
    /// Ticks left before the bug fades out.
    pub lifetime: u32,
}
