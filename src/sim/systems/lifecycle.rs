use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::config::SimConfig;
use crate::sim::components::{Boid, PackId, Position, Predator, Rank, Spawned, Velocity};
use crate::sim::spawn::{breed_boid, breed_predator};
use crate::sim::systems::{TickBuffers, TickReport};
use crate::sim::{in_spawn_order, Agents, Bounds};

/// End-of-tick deaths and births. Caught and starved agents go first, then
/// survivors at the reproduction threshold split, up to the population caps.
/// Offspring spawn after everyone already alive, so they don't act until the
/// next tick.
pub fn resolve(
    agents: &mut Agents,
    bufs: &mut TickBuffers,
    config: &SimConfig,
    rng: &mut fastrand::Rng,
    bounds: Bounds,
) -> TickReport {
    let mut report = TickReport::default();

    // -- Boid deaths --
    bufs.doomed.clear();
    for (i, me) in bufs.boid_snapshots.iter().enumerate() {
        if bufs.caught[i] {
            bufs.doomed.push(me.entity);
            continue;
        }
        let starved = agents
            .world
            .get::<&Boid>(me.entity)
            .map(|boid| boid.energy <= 0.0)
            .unwrap_or(false);
        if starved {
            bufs.doomed.push(me.entity);
            report.boids_starved += 1;
        }
    }
    for entity in bufs.doomed.drain(..) {
        let _ = agents.world.despawn(entity);
    }

    // -- Boid births --
    let boid_config = &config.boid;
    let mut population = agents.boid_count();
    for me in &bufs.boid_snapshots {
        if population >= boid_config.max_boids {
            break;
        }
        let Ok((pos, vel, parent)) =
            agents.world.query_one_mut::<(&Position, &Velocity, &mut Boid)>(me.entity)
        else {
            continue;
        };
        if parent.energy < boid_config.reproduction_threshold * parent.max_energy {
            continue;
        }
        let (pos, vel, child) = breed_boid(rng, boid_config, parent, pos.0, vel.0);
        let pos = Position(bounds.clamp_point(pos.0.x, pos.0.y));
        agents.spawn_boid((pos, vel, child));
        population += 1;
        report.boids_born += 1;
    }

    // -- Predator deaths --
    bufs.doomed.extend(
        agents
            .world
            .query::<&Predator>()
            .iter()
            .filter(|(_, p)| p.energy <= 0.0)
            .map(|(e, _)| e),
    );
    report.predators_starved = bufs.doomed.len() as u32;
    for entity in bufs.doomed.drain(..) {
        let _ = agents.world.despawn(entity);
    }
    if report.predators_starved > 0 {
        log::debug!("{} predator(s) starved", report.predators_starved);
    }
    report.leaders_promoted = reassign_leaders(agents);

    // -- Predator births --
    let predator_config = &config.predator;
    let parents = in_spawn_order(
        agents
            .world
            .query::<(&Spawned, &Predator)>()
            .iter()
            .map(|(e, (order, _))| (*order, e))
            .collect(),
    );
    let mut population = parents.len();
    for entity in parents {
        if population >= predator_config.max_predators {
            break;
        }
        let Ok((pos, parent)) = agents.world.query_one_mut::<(&Position, &mut Predator)>(entity)
        else {
            continue;
        };
        if parent.energy < predator_config.reproduction_threshold {
            continue;
        }
        let (pos, vel, child) = breed_predator(rng, predator_config, parent, entity, pos.0);
        let pos = Position(bounds.clamp_point(pos.0.x, pos.0.y));
        log::debug!("pack {} grew: generation {} born", child.pack, child.generation);
        agents.spawn_predator((pos, vel, child));
        population += 1;
        report.predators_born += 1;
    }

    report
}

/// Make sure every pack with survivors has exactly one leader and every
/// follower points at it. A pack that lost its leader promotes its earliest
/// spawned member. Returns the promotions.
pub fn reassign_leaders(agents: &mut Agents) -> u32 {
    let members = in_spawn_order(
        agents
            .world
            .query::<(&Spawned, &Predator)>()
            .iter()
            .map(|(e, (order, p))| (*order, (e, p.pack, p.is_leader())))
            .collect(),
    );

    let mut leaders: HashMap<PackId, hecs::Entity> = HashMap::new();
    for &(entity, pack, leads) in &members {
        if leads {
            leaders.entry(pack).or_insert(entity);
        }
    }

    let mut promoted = 0;
    for &(entity, pack, _) in &members {
        if let Entry::Vacant(slot) = leaders.entry(pack) {
            slot.insert(entity);
            promoted += 1;
            log::debug!("pack {pack} lost its leader; promoting a follower");
        }
    }

    for &(entity, pack, _) in &members {
        let Some(&leader) = leaders.get(&pack) else {
            continue;
        };
        if let Ok(mut predator) = agents.world.get::<&mut Predator>(entity) {
            predator.rank = if leader == entity {
                Rank::Leader
            } else {
                Rank::Follower(leader)
            };
        }
    }
    promoted
}

/// Panics if any agent escaped its energy range, a pack has no single leader,
/// or a follower points at anything but its own pack's live leader.
pub fn check_invariants(agents: &Agents) {
    for (_, boid) in agents.world.query::<&Boid>().iter() {
        assert!(
            boid.energy > 0.0 && boid.energy <= boid.max_energy,
            "boid energy {} out of (0, {}]",
            boid.energy,
            boid.max_energy
        );
        assert!((0.0..=1.0).contains(&boid.fear), "boid fear {} out of range", boid.fear);
    }

    let mut leaders: HashSet<PackId> = HashSet::new();
    let mut packs: HashSet<PackId> = HashSet::new();
    for (_, predator) in agents.world.query::<&Predator>().iter() {
        assert!(predator.energy > 0.0, "dead predator survived the tick");
        packs.insert(predator.pack);
        match predator.rank {
            Rank::Leader => {
                assert!(leaders.insert(predator.pack), "pack {} has two leaders", predator.pack);
            }
            Rank::Follower(leader) => {
                let follows_own_leader = agents
                    .world
                    .get::<&Predator>(leader)
                    .map(|l| l.is_leader() && l.pack == predator.pack)
                    .unwrap_or(false);
                assert!(follows_own_leader, "pack {} follower has a stale leader", predator.pack);
            }
        }
    }
    assert_eq!(leaders.len(), packs.len(), "a pack has no leader");
}
