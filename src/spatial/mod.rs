use glam::Vec2;

use crate::sim::components::{PackId, Rank};

/// Frozen pre-tick copy of a boid for neighbor queries.
/// Stored alongside the grid so the hot path never touches live agents.
#[derive(Debug, Clone, Copy)]
pub struct BoidSnapshot {
    pub entity: hecs::Entity,
    /// Spawn order; snapshots are sorted by it.
    pub order: u64,
    pub pos: Vec2,
    pub vel: Vec2,
    pub species: u8,
    pub is_hybrid: bool,
    /// Perching or collapsed at the start of the tick.
    pub resting: bool,
}

impl BoidSnapshot {
    /// Whether these two align and cohere: same species, or either is a hybrid.
    pub fn flocks_with(&self, other: &BoidSnapshot) -> bool {
        self.is_hybrid || other.is_hybrid || self.species == other.species
    }
}

/// Frozen pre-tick copy of a predator.
#[derive(Debug, Clone, Copy)]
pub struct PredatorSnapshot {
    pub entity: hecs::Entity,
    pub order: u64,
    pub pos: Vec2,
    pub vel: Vec2,
    pub pack: PackId,
    pub rank: Rank,
}

/// Upper bound on buckets per grid. Huge worlds get coarser cells instead.
const MAX_CELLS: i64 = 65_536;

/// Uniform grid over the world rectangle for radius-bounded neighbor queries.
///
/// Positions outside the world land in the nearest edge cell, so a query never
/// misses an agent; it may return a few extra ones from cell granularity.
pub struct SpatialGrid {
    /// Requested cell edge; the effective one may be larger.
    cell_size: f32,
    inv_cell_size: f32,
    cols: i32,
    rows: i32,
    /// Row-major buckets of agent indices. Pre-allocated, cleared each tick.
    buckets: Vec<Vec<u32>>,
    len: usize,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, width: f32, height: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 1.0 {
            cell_size
        } else {
            1.0
        };
        let mut grid = Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cols: 1,
            rows: 1,
            buckets: Vec::new(),
            len: 0,
        };
        grid.resize(width, height);
        grid
    }

    /// Re-shape for new world bounds. Drops all entries. Cells grow past the
    /// requested size when the world would otherwise need more than
    /// `MAX_CELLS` of them.
    fn resize(&mut self, width: f32, height: f32) {
        let mut cell = self.cell_size;
        let spread = (extent(width) * extent(height) / MAX_CELLS as f32).sqrt();
        if spread > cell {
            cell = spread;
        }
        loop {
            self.cols = cells_along(width, cell);
            self.rows = cells_along(height, cell);
            if self.cols as i64 * self.rows as i64 <= MAX_CELLS {
                break;
            }
            cell *= 1.05;
        }
        self.inv_cell_size = 1.0 / cell;
        let total = (self.cols * self.rows) as usize;
        self.buckets.clear();
        self.buckets.resize_with(total, || Vec::with_capacity(8));
        self.len = 0;
    }

    /// Clear all buckets. Call at start of each rebuild.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear(); // Keeps allocation.
        }
        self.len = 0;
    }

    pub fn insert(&mut self, pos: Vec2, index: u32) {
        let (cx, cy) = self.cell_coords(pos);
        let bucket = self.bucket_index(cx, cy);
        self.buckets[bucket].push(index);
        self.len += 1;
    }

    /// Rebuild from scratch; the i-th position is stored under index i.
    pub fn build(&mut self, positions: impl IntoIterator<Item = Vec2>) {
        self.clear();
        for (index, pos) in positions.into_iter().enumerate() {
            self.insert(pos, index as u32);
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Call `callback` for every entry whose cell overlaps the square around
    /// `pos` of half-width `radius`. Superset of the entries within `radius`.
    pub fn query_radius(&self, pos: Vec2, radius: f32, mut callback: impl FnMut(u32)) {
        let r = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
        let (x0, y0) = self.cell_coords(pos - Vec2::splat(r));
        let (x1, y1) = self.cell_coords(pos + Vec2::splat(r));
        self.for_each_in_span(x0, y0, x1, y1, &mut callback);
    }

    /// Same as [`Self::query_radius`], collecting into a reusable buffer.
    pub fn query_radius_into(&self, pos: Vec2, radius: f32, out: &mut Vec<u32>) {
        out.clear();
        self.query_radius(pos, radius, |index| out.push(index));
    }

    fn for_each_in_span(
        &self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        callback: &mut impl FnMut(u32),
    ) {
        let (x0, x1) = (x0.max(0), x1.min(self.cols - 1));
        let (y0, y1) = (y0.max(0), y1.min(self.rows - 1));
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                for &index in &self.buckets[self.bucket_index(cx, cy)] {
                    callback(index);
                }
            }
        }
    }

    fn cell_coords(&self, pos: Vec2) -> (i32, i32) {
        // `as i32` saturates (and maps NaN to 0), so the clamp is always safe.
        let cx = (pos.x * self.inv_cell_size).floor() as i32;
        let cy = (pos.y * self.inv_cell_size).floor() as i32;
        (cx.clamp(0, self.cols - 1), cy.clamp(0, self.rows - 1))
    }

    fn bucket_index(&self, cx: i32, cy: i32) -> usize {
        (cy * self.cols + cx) as usize
    }
}

/// World extent with non-finite or non-positive sizes treated as one cell.
fn extent(v: f32) -> f32 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        1.0
    }
}

fn cells_along(length: f32, cell: f32) -> i32 {
    // `as i32` saturates, so the clamp keeps the product in range.
    ((extent(length) / cell).ceil() as i32).clamp(1, MAX_CELLS as i32)
}

/// One grid per agent kind, rebuilt together at the start of every tick.
pub struct SpatialIndex {
    pub boids: SpatialGrid,
    pub predators: SpatialGrid,
    pub food: SpatialGrid,
    pub obstacles: SpatialGrid,
}

impl SpatialIndex {
    pub fn new(cell_size: f32, width: f32, height: f32) -> Self {
        Self {
            boids: SpatialGrid::new(cell_size, width, height),
            predators: SpatialGrid::new(cell_size, width, height),
            food: SpatialGrid::new(cell_size, width, height),
            obstacles: SpatialGrid::new(cell_size, width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_query() {
        let mut grid = SpatialGrid::new(64.0, 1_000.0, 1_000.0);
        grid.insert(Vec2::new(100.0, 100.0), 0);
        grid.insert(Vec2::new(110.0, 105.0), 1);
        grid.insert(Vec2::new(900.0, 900.0), 2);

        let mut found = Vec::new();
        grid.query_radius_into(Vec2::new(105.0, 102.0), 20.0, &mut found);

        assert!(found.contains(&0));
        assert!(found.contains(&1));
        assert!(!found.contains(&2));
    }

    #[test]
    fn clear_and_reuse() {
        let mut grid = SpatialGrid::new(64.0, 512.0, 512.0);
        grid.insert(Vec2::new(50.0, 50.0), 42);
        grid.clear();

        let mut found = Vec::new();
        grid.query_radius_into(Vec2::new(50.0, 50.0), 64.0, &mut found);
        assert!(found.is_empty());
        assert!(grid.is_empty());
    }

    #[test]
    fn radius_query_never_misses() {
        let mut rng = fastrand::Rng::with_seed(7);
        let (w, h) = (800.0, 600.0);
        let mut grid = SpatialGrid::new(50.0, w, h);
        let mut buf = Vec::new();

        for _ in 0..50 {
            let points: Vec<Vec2> = (0..300)
                .map(|_| Vec2::new(rng.f32() * w, rng.f32() * h))
                .collect();
            grid.build(points.iter().copied());
            assert_eq!(grid.len(), points.len());

            let center = Vec2::new(rng.f32() * w, rng.f32() * h);
            let radius = rng.f32() * 180.0;
            grid.query_radius_into(center, radius, &mut buf);

            for (i, p) in points.iter().enumerate() {
                if p.distance(center) <= radius {
                    assert!(buf.contains(&(i as u32)), "missed point {i} at {p}");
                }
            }
        }
    }

    #[test]
    fn radius_query_returns_each_entry_once() {
        let mut grid = SpatialGrid::new(10.0, 100.0, 100.0);
        grid.build((0..20).map(|i| Vec2::new(i as f32 * 5.0, 50.0)));
        let mut buf = Vec::new();
        grid.query_radius_into(Vec2::new(50.0, 50.0), 1_000.0, &mut buf);
        assert_eq!(buf.len(), 20);
        buf.sort_unstable();
        buf.dedup();
        assert_eq!(buf.len(), 20);
    }

    #[test]
    fn out_of_bounds_points_are_still_found() {
        let mut grid = SpatialGrid::new(50.0, 200.0, 200.0);
        grid.insert(Vec2::new(-30.0, 210.0), 3);
        let mut buf = Vec::new();
        grid.query_radius_into(Vec2::new(-10.0, 205.0), 25.0, &mut buf);
        assert_eq!(buf, vec![3]);
    }

    #[test]
    fn huge_world_keeps_bucket_count_bounded() {
        let mut grid = SpatialGrid::new(10.0, 1.0e6, 1.0e6);
        assert!(grid.buckets.len() as i64 <= MAX_CELLS);
        assert!(grid.buckets.len() > 1);

        grid.insert(Vec2::new(500_000.0, 500_000.0), 0);
        grid.insert(Vec2::new(999_990.0, 10.0), 1);
        let mut buf = Vec::new();
        grid.query_radius_into(Vec2::new(500_005.0, 499_995.0), 10.0, &mut buf);
        assert_eq!(buf, vec![0]);
        grid.query_radius_into(Vec2::new(1.0e6, 0.0), 15.0, &mut buf);
        assert_eq!(buf, vec![1]);
    }

    #[test]
    fn long_thin_world_stays_under_the_cap() {
        let grid = SpatialGrid::new(1.5, 5.0e7, 3.0);
        assert!(grid.buckets.len() as i64 <= MAX_CELLS);
        assert_eq!(grid.rows, 1);
    }

    #[test]
    fn hybrids_flock_across_species() {
        let world = hecs::World::new();
        let snap = |species, is_hybrid| BoidSnapshot {
            entity: world.reserve_entity(),
            order: 0,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            species,
            is_hybrid,
            resting: false,
        };
        let (blue, amber, green) = (snap(0, false), snap(1, false), snap(1, true));
        assert!(blue.flocks_with(&blue));
        assert!(!blue.flocks_with(&amber));
        assert!(blue.flocks_with(&green));
        assert!(green.flocks_with(&blue));
    }
}
