use glam::Vec2;

use crate::sim::components::{Boid, Position, Predator, Spawned, Velocity};
use crate::sim::systems::TickBuffers;
use crate::sim::{Agents, Props};
use crate::spatial::{BoidSnapshot, PredatorSnapshot, SpatialIndex};

/// Rebuild every grid and the snapshot cache from current positions, and
/// reset the per-tick scratch to the current population sizes.
pub fn rebuild(agents: &Agents, props: &Props, index: &mut SpatialIndex, bufs: &mut TickBuffers) {
    bufs.boid_snapshots.clear();
    for (entity, (order, pos, vel, boid)) in agents
        .world
        .query::<(&Spawned, &Position, &Velocity, &Boid)>()
        .iter()
    {
        bufs.boid_snapshots.push(BoidSnapshot {
            entity,
            order: order.0,
            pos: pos.0,
            vel: vel.0,
            species: boid.species,
            is_hybrid: boid.is_hybrid,
            resting: boid.state.is_resting(),
        });
    }
    bufs.boid_snapshots.sort_unstable_by_key(|s| s.order);
    index.boids.build(bufs.boid_snapshots.iter().map(|s| s.pos));

    bufs.predator_snapshots.clear();
    for (entity, (order, pos, vel, predator)) in agents
        .world
        .query::<(&Spawned, &Position, &Velocity, &Predator)>()
        .iter()
    {
        bufs.predator_snapshots.push(PredatorSnapshot {
            entity,
            order: order.0,
            pos: pos.0,
            vel: vel.0,
            pack: predator.pack,
            rank: predator.rank,
        });
    }
    bufs.predator_snapshots.sort_unstable_by_key(|s| s.order);
    index.predators.build(bufs.predator_snapshots.iter().map(|s| s.pos));

    index.food.build(props.food.sources.iter().map(|f| f.pos));
    index.obstacles.build(props.obstacles.obstacles.iter().map(|o| o.pos));

    let boids = bufs.boid_snapshots.len();
    let predators = bufs.predator_snapshots.len();
    bufs.boid_accel.clear();
    bufs.boid_accel.resize(boids, Vec2::ZERO);
    bufs.caught.clear();
    bufs.caught.resize(boids, false);
    bufs.predator_accel.clear();
    bufs.predator_accel.resize(predators, Vec2::ZERO);
    bufs.predator_speed.clear();
    bufs.predator_speed.resize(predators, 0.0);
    bufs.bites.clear();
    bufs.bites.resize(props.food.len(), 0.0);

    bufs.predator_slots.clear();
    bufs.pack_centroids.clear();
    for (slot, p) in bufs.predator_snapshots.iter().enumerate() {
        bufs.predator_slots.insert(p.entity, slot);
        let entry = bufs.pack_centroids.entry(p.pack).or_insert((Vec2::ZERO, 0));
        entry.0 += p.pos;
        entry.1 += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::props::{FoodSources, Obstacles, Shelters};
    use crate::sim::spawn::{new_boid, new_predator};

    #[test]
    fn snapshots_follow_spawn_order_after_despawns() {
        let config = SimConfig::default();
        let mut rng = fastrand::Rng::with_seed(12);
        let mut agents = Agents::new();
        let spawned: Vec<_> = (0..6)
            .map(|i| {
                let pos = Vec2::new(20.0 + i as f32 * 40.0, 100.0);
                agents.spawn_boid(new_boid(&mut rng, &config.boid, pos, 0))
            })
            .collect();
        agents.world.despawn(spawned[1]).unwrap();
        agents.world.despawn(spawned[4]).unwrap();
        let late = agents.spawn_boid(new_boid(&mut rng, &config.boid, Vec2::ONE, 1));
        let pack = agents.next_pack_id();
        let hunter = agents.spawn_predator(new_predator(
            &mut rng,
            &config.predator,
            Vec2::new(300.0, 300.0),
            pack,
        ));

        let props = Props {
            food: FoodSources::new(100.0),
            obstacles: Obstacles::new(),
            shelters: Shelters::for_bounds(800.0, 600.0),
        };
        let mut index = SpatialIndex::new(100.0, 800.0, 600.0);
        let mut bufs = TickBuffers::new(8);
        rebuild(&agents, &props, &mut index, &mut bufs);

        let order: Vec<_> = bufs.boid_snapshots.iter().map(|s| s.entity).collect();
        assert_eq!(order, [spawned[0], spawned[2], spawned[3], spawned[5], late]);
        assert_eq!(bufs.caught.len(), 5);
        assert_eq!(bufs.predator_slots.get(&hunter), Some(&0));
        assert_eq!(bufs.pack_centroids.get(&pack), Some(&(Vec2::new(300.0, 300.0), 1)));
    }
}
