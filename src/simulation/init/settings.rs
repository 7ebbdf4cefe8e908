use crate::core::random::sanitize_seed;

use super::perf_stats::PerfStats;
use super::SimulationCore;

pub(super) fn set_seed(sim: &mut SimulationCore, seed: u32) {
    sim.rng_state = sanitize_seed(seed);
}

pub(super) fn enable_perf_metrics(sim: &mut SimulationCore, enabled: bool) {
    sim.perf_enabled = enabled;
    if !enabled {
        sim.perf_stats.reset();
    }
}

pub(super) fn get_perf_stats(sim: &SimulationCore) -> PerfStats {
    sim.perf_stats.clone()
}
