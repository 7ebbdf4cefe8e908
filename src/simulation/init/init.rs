use crate::core::random::DEFAULT_SEED;
use crate::domain::SimConfig;
use crate::spatial::{AirHeatMap, ParticleStore, SpatialHash, ATTR_STRIDE, POS_STRIDE};
use crate::systems::SoundField;

use super::perf_stats::PerfStats;
use super::SimulationCore;

/// `config` must already be validated.
pub(super) fn create_simulation_core(config: SimConfig) -> SimulationCore {
    let capacity = config.capacity;
    let side = config.grid_side();
    log::debug!(
        "creating simulation core: {} slots, {}x{} hash cells",
        capacity,
        side,
        side
    );

    SimulationCore {
        store: ParticleStore::new(capacity),
        hash: SpatialHash::new(side),
        heat_map: AirHeatMap::new(side),
        velocity_out: vec![0.0; capacity * POS_STRIDE],
        attributes_out: vec![0.0; capacity * ATTR_STRIDE],
        hash_dirty: false,
        frame: 0,
        rng_state: DEFAULT_SEED,
        saturated: false,
        alloc_failures: 0,
        sound_cache: SoundField::default(),
        perf_enabled: false,
        perf_stats: PerfStats::default(),
        config,
    }
}
