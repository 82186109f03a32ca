use glam::Vec2;

// ---------------------------------------------------------------------------
// Food
// ---------------------------------------------------------------------------

/// A patch boids graze from. Depletes to zero, then slowly grows back.
#[derive(Debug, Clone, Copy)]
pub struct FoodSource {
    pub pos: Vec2,
    pub amount: f32,
}

/// Manages food sources. Sources keep their index for their whole life.
pub struct FoodSources {
    pub sources: Vec<FoodSource>,
    capacity: f32,
}

impl FoodSources {
    pub fn new(capacity: f32) -> Self {
        Self {
            sources: Vec::new(),
            capacity,
        }
    }

    pub fn spawn(&mut self, pos: Vec2) {
        self.sources.push(FoodSource {
            pos,
            amount: self.capacity,
        });
    }

    /// Take `total` from source `index`, flooring at zero.
    pub fn deplete(&mut self, index: usize, total: f32) {
        if let Some(source) = self.sources.get_mut(index) {
            source.amount = (source.amount - total).max(0.0);
        }
    }

    /// Grow every source back toward capacity.
    pub fn regenerate(&mut self, rate: f32) {
        for source in &mut self.sources {
            source.amount = (source.amount + rate).min(self.capacity);
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Obstacles
// ---------------------------------------------------------------------------

/// Obstacles within this distance of a removal point can be removed.
pub const OBSTACLE_REMOVE_RADIUS: f32 = 20.0;

#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub pos: Vec2,
}

#[derive(Default)]
pub struct Obstacles {
    pub obstacles: Vec<Obstacle>,
}

impl Obstacles {
    pub fn new() -> Self {
        Self {
            obstacles: Vec::new(),
        }
    }

    pub fn spawn(&mut self, pos: Vec2) {
        self.obstacles.push(Obstacle { pos });
    }

    /// Remove the obstacle nearest to `pos` if it's within
    /// [`OBSTACLE_REMOVE_RADIUS`]. Returns whether one was removed.
    pub fn remove_near(&mut self, pos: Vec2) -> bool {
        let limit_sq = OBSTACLE_REMOVE_RADIUS * OBSTACLE_REMOVE_RADIUS;
        let nearest = self
            .obstacles
            .iter()
            .enumerate()
            .map(|(i, o)| (i, o.pos.distance_squared(pos)))
            .filter(|&(_, d)| d <= limit_sq)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match nearest {
            Some((index, _)) => {
                // Keep placement order stable for renderers.
                self.obstacles.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Shelters
// ---------------------------------------------------------------------------

/// Shelter radius for the default pair.
const SHELTER_RADIUS: f32 = 50.0;
/// Inset of the default shelters from the side edges.
const SHELTER_INSET_X: f32 = 80.0;
/// Inset of the default shelters from the bottom edge.
const SHELTER_INSET_Y: f32 = 100.0;

/// Circular safe zone. Boids inside feel no fear and predators ignore them.
#[derive(Debug, Clone, Copy)]
pub struct Shelter {
    pub pos: Vec2,
    pub radius: f32,
}

pub struct Shelters {
    pub shelters: Vec<Shelter>,
}

impl Shelters {
    /// Two shelters tucked into the bottom corners.
    pub fn for_bounds(width: f32, height: f32) -> Self {
        let y = (height - SHELTER_INSET_Y).max(0.0);
        Self {
            shelters: vec![
                Shelter {
                    pos: Vec2::new(SHELTER_INSET_X.min(width), y),
                    radius: SHELTER_RADIUS,
                },
                Shelter {
                    pos: Vec2::new((width - SHELTER_INSET_X).max(0.0), y),
                    radius: SHELTER_RADIUS,
                },
            ],
        }
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        self.shelters
            .iter()
            .any(|s| s.pos.distance_squared(pos) < s.radius * s.radius)
    }
}
