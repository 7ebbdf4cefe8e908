use crate::spatial::{ATTR_STRIDE, A_LIFE, A_TYPE};
use crate::systems::{air_heat, position, AttributePass, VelocityPass};

use super::{PerfTimer, SimulationCore};

pub(super) fn tick(sim: &mut SimulationCore, dt: f32, player_x: f32, player_y: f32) {
    let perf_on = sim.perf_enabled;
    let alloc_failures = std::mem::take(&mut sim.alloc_failures);
    if perf_on {
        sim.perf_stats.reset();
        sim.perf_stats.allocation_failures = alloc_failures;
        sim.perf_stats.capacity = sim.store.capacity() as u32;
    }
    let tick_start = if perf_on { Some(PerfTimer::start()) } else { None };

    // Pick up emissions/clears made since the last tick
    PerfTimer::time(perf_on, &mut sim.perf_stats.hash_ms, || {
        if sim.hash_dirty {
            sim.hash.rebuild(&sim.store);
            sim.hash_dirty = false;
        }
    });

    sim.store.snapshot_velocities();

    // === VELOCITIES ===
    PerfTimer::time(perf_on, &mut sim.perf_stats.velocity_ms, || {
        VelocityPass {
            store: &sim.store,
            hash: &sim.hash,
            forces: &sim.config.forces,
            world_size: sim.config.world_size,
            dt,
            player: (player_x, player_y),
        }
        .run(&mut sim.velocity_out);
    });
    std::mem::swap(&mut sim.store.velocity, &mut sim.velocity_out);

    // === ATTRIBUTES ===
    PerfTimer::time(perf_on, &mut sim.perf_stats.attributes_ms, || {
        AttributePass {
            store: &sim.store,
            hash: &sim.hash,
            air: &sim.heat_map,
            heat: &sim.config.heat,
            types: &sim.config.types,
            world_size: sim.config.world_size,
            dt,
        }
        .run(&mut sim.attributes_out);
    });
    std::mem::swap(&mut sim.store.attributes, &mut sim.attributes_out);

    if perf_on {
        // attributes_out now holds the previous frame
        let (changes, deaths) = count_transitions(&sim.attributes_out, &sim.store.attributes);
        sim.perf_stats.phase_changes = changes;
        sim.perf_stats.deaths = deaths;
    }

    // === POSITIONS ===
    PerfTimer::time(perf_on, &mut sim.perf_stats.position_ms, || {
        position::integrate(&mut sim.store.position, &sim.store.velocity, dt);
    });

    // === AIR HEAT ===
    // Injection reads the hash built at the start of the tick
    PerfTimer::time(perf_on, &mut sim.perf_stats.air_heat_ms, || {
        air_heat::diffuse(&mut sim.heat_map, &sim.store, &sim.hash, &sim.config.air, dt);
    });

    // Queries after the tick see the moved particles
    PerfTimer::time(perf_on, &mut sim.perf_stats.hash_ms, || {
        sim.hash.rebuild(&sim.store);
    });
    sim.hash_dirty = false;

    sim.frame += 1;

    if let Some(t0) = tick_start {
        sim.perf_stats.tick_ms = t0.elapsed_ms();
        sim.perf_stats.alive_count = sim.store.alive_count() as u32;
        sim.perf_stats.occupied_cells = sim.hash.occupied_cells() as u32;
    }
}

/// (type changes, deaths) among particles alive before the tick.
fn count_transitions(before: &[f32], after: &[f32]) -> (u32, u32) {
    let mut changes = 0;
    let mut deaths = 0;
    for (old, new) in before.chunks_exact(ATTR_STRIDE).zip(after.chunks_exact(ATTR_STRIDE)) {
        if old[A_LIFE] <= 0.0 {
            continue;
        }
        if new[A_LIFE] <= 0.0 {
            deaths += 1;
        } else if old[A_TYPE] != new[A_TYPE] {
            changes += 1;
        }
    }
    (changes, deaths)
}
