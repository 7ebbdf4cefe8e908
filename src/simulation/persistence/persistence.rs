//! Level save/load in the flat-array shape level files use.

use serde::{Deserialize, Serialize};

use crate::core::SimResult;
use crate::spatial::LoadFit;

use super::SimulationCore;

/// Particle buffers as stored in a level file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticleSnapshot {
    pub prt_pos: Vec<f32>,
    pub prt_vel: Vec<f32>,
    pub prt_attr: Vec<f32>,
}

pub(super) fn snapshot(sim: &SimulationCore) -> ParticleSnapshot {
    let (prt_pos, prt_vel, prt_attr) = sim.store.to_flat();
    ParticleSnapshot {
        prt_pos,
        prt_vel,
        prt_attr,
    }
}

/// Replace the pool. The air heat map starts cold again and the hash is
/// rebuilt right away so queries work before the first tick.
pub(super) fn load_flat(
    sim: &mut SimulationCore,
    position: &[f32],
    velocity: &[f32],
    attributes: &[f32],
) -> LoadFit {
    let fit = sim.store.load_flat(position, velocity, attributes);
    sim.heat_map.reset();
    sim.hash.rebuild(&sim.store);
    sim.hash_dirty = false;
    sim.saturated = false;
    sim.sound_cache = Default::default();

    if fit.is_exact() {
        log::info!("particles loaded: {} alive", sim.store.alive_count());
    } else {
        log::warn!(
            "particles loaded with size mismatch: {} lanes zero-padded, {} dropped ({} alive)",
            fit.padded,
            fit.truncated,
            sim.store.alive_count()
        );
    }
    fit
}

pub(super) fn to_json(sim: &SimulationCore) -> SimResult<String> {
    Ok(serde_json::to_string(&snapshot(sim))?)
}

pub(super) fn load_json(sim: &mut SimulationCore, json: &str) -> SimResult<LoadFit> {
    let snapshot: ParticleSnapshot = serde_json::from_str(json)?;
    Ok(load_flat(sim, &snapshot.prt_pos, &snapshot.prt_vel, &snapshot.prt_attr))
}
