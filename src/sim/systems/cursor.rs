use crate::config::CursorConfig;
use crate::sim::systems::TickBuffers;
use crate::sim::{Cursor, CursorMode};
use crate::spatial::SpatialIndex;

/// Seed each boid's steering with the cursor pull (or push).
/// Falls off linearly to zero at `config.radius`.
pub fn apply(cursor: Cursor, config: &CursorConfig, index: &SpatialIndex, bufs: &mut TickBuffers) {
    let sign = match cursor.mode {
        CursorMode::None => return,
        CursorMode::Attract => 1.0,
        CursorMode::Repel => -1.0,
    };
    if cursor.strength <= 0.0 || config.radius <= 0.0 {
        return;
    }

    index.boids.query_radius_into(cursor.pos, config.radius, &mut bufs.nearby);
    for &i in &bufs.nearby {
        let i = i as usize;
        let to_cursor = cursor.pos - bufs.boid_snapshots[i].pos;
        let dist = to_cursor.length();
        if dist < config.radius && dist > 0.001 {
            let falloff = 1.0 - dist / config.radius;
            let force = config.force * cursor.strength * falloff;
            bufs.boid_accel[i] += to_cursor / dist * sign * force;
        }
    }
}
