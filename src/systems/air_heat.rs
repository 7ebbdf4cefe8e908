//! Air heat diffusion.
//!
//! Each cell relaxes toward its four neighbors with convection weights
//! (below > sides > above), takes heat from the particle hashed into it, and
//! decays. Cells past the border read as 0.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::domain::{AirConfig, ParticleType};
use crate::spatial::{AirHeatMap, ParticleStore, SpatialHash};

/// Heat a particle injects into the cell it occupies.
#[inline]
fn injected_heat(air: &AirConfig, ty: ParticleType, heat: f32) -> f32 {
    match ty {
        ParticleType::Lava => (heat + air.lava_offset) * air.lava_gain,
        ParticleType::Water | ParticleType::Bio => heat + air.watery_bonus,
        _ => heat,
    }
}

/// Advance the map by `dt`, reading `map.values` and publishing the result.
pub fn diffuse(
    map: &mut AirHeatMap,
    store: &ParticleStore,
    hash: &SpatialHash,
    air: &AirConfig,
    dt: f32,
) {
    let side = map.side();
    debug_assert_eq!(hash.side(), side);
    let dt2 = dt * air.time_scale;

    let mut next = std::mem::take(&mut map.next);
    {
        let current: &AirHeatMap = map;
        let cell = |gx: usize, gy: usize| -> f32 {
            let x = gx as i32;
            let y = gy as i32;
            let h = current.get(x, y);
            let left = current.get(x - 1, y);
            let right = current.get(x + 1, y);
            let up = current.get(x, y - 1);
            let down = current.get(x, y + 1);

            let add = match hash.get(x, y) {
                Some(j) if store.is_alive(j) => {
                    injected_heat(air, store.particle_type(j), store.heat(j))
                }
                _ => 0.0,
            };

            let mut ret = h + add * dt2 * air.inject_scale;
            ret += (down - h) * dt2 * air.down_weight;
            ret += (left - h) * dt2 * air.side_weight;
            ret += (right - h) * dt2 * air.side_weight;
            ret += (up - h) * dt2 * air.up_weight;
            ret - ret * dt2 * air.decay
        };

        #[cfg(feature = "parallel")]
        {
            next.par_chunks_mut(side).enumerate().for_each(|(gy, row)| {
                for (gx, v) in row.iter_mut().enumerate() {
                    *v = cell(gx, gy);
                }
            });
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (gy, row) in next.chunks_mut(side).enumerate() {
                for (gx, v) in row.iter_mut().enumerate() {
                    *v = cell(gx, gy);
                }
            }
        }
    }
    map.next = next;
    map.swap();
}
