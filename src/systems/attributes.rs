//! Attribute/phase updater.
//!
//! Per particle: heat exchange with hashed neighbors and the air map, life
//! loss, freezing, bio spread/reversion and the per-type radius/viscosity
//! reset. Reads the committed buffers (with this tick's velocities) and
//! writes a fresh attribute buffer.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::MIN_DIST_EPS;
use crate::domain::{HeatConfig, ParticleType, TypeDefaults, TYPE_COUNT};
use crate::spatial::{
    cell_coord, AirHeatMap, ParticleStore, SpatialHash, ATTR_STRIDE, A_HEAT, A_LIFE, A_RADIUS,
    A_TYPE, A_VISC,
};

/// Life written when a particle drops out through the floor.
pub const FELL_OUT_LIFE: f32 = -1.0;

pub struct AttributePass<'a> {
    pub store: &'a ParticleStore,
    pub hash: &'a SpatialHash,
    pub air: &'a AirHeatMap,
    pub heat: &'a HeatConfig,
    pub types: &'a [TypeDefaults; TYPE_COUNT],
    pub world_size: f32,
    pub dt: f32,
}

impl<'a> AttributePass<'a> {
    /// Fill `out` (length `5N`) with the next attributes of every slot.
    pub fn run(&self, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.store.capacity() * ATTR_STRIDE);

        #[cfg(feature = "parallel")]
        {
            out.par_chunks_mut(ATTR_STRIDE)
                .enumerate()
                .for_each(|(idx, attrs)| self.particle(idx, attrs));
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (idx, attrs) in out.chunks_mut(ATTR_STRIDE).enumerate() {
                self.particle(idx, attrs);
            }
        }
    }

    fn particle(&self, idx: usize, out: &mut [f32]) {
        let store = self.store;
        let h = self.heat;
        let dt = self.dt;

        let base = idx * ATTR_STRIDE;
        out.copy_from_slice(&store.attributes[base..base + ATTR_STRIDE]);

        let mut life = out[A_LIFE];
        if life <= 0.0 {
            return;
        }
        let mut ty = ParticleType::from_lane(out[A_TYPE]);
        let mut heat = out[A_HEAT];
        let radius = out[A_RADIUS];

        match ty {
            ParticleType::Solid => {
                out[A_LIFE] = life + (1.0 - life) * dt * h.solid_life_recovery;
                out[A_RADIUS] = if heat > h.solid_hot_heat {
                    h.solid_hot_radius
                } else {
                    self.types[ParticleType::Solid.index()].radius
                };
                return;
            }
            ParticleType::Fire => {
                out[A_LIFE] = life - dt * h.fire_decay;
                return;
            }
            _ => {}
        }

        let (px, py) = store.pos(idx);
        let (vx, vy) = store.vel(idx);

        if py >= self.world_size - 1.0 {
            out[A_LIFE] = FELL_OUT_LIFE;
            return;
        }

        let gx = cell_coord(px);
        let gy = cell_coord(py);
        let air_heat = (self.air.max_in_window(gx, gy, h.window) * h.air_sample_scale).max(0.0);

        let mut ret = heat;
        let mut max_bio = 0.0f32;
        let mut same_count = 0u32;

        self.hash.for_each_in_window(gx, gy, h.window, |j| {
            if j == idx || !store.is_alive(j) {
                return;
            }
            let wty = store.particle_type(j);
            let (wx, wy) = store.pos(j);
            let dx = px - wx;
            let dy = py - wy;
            let reach = ((store.radius(j) + radius) * 2.0).max(MIN_DIST_EPS);
            let influence = 1.0 - (dx * dx + dy * dy) / (reach * reach);

            if wty == ty {
                same_count += 1;
            }
            if wty == ParticleType::Solid && influence > h.crush_influence {
                life = 0.0;
            }
            if matches!(
                (ty, wty),
                (ParticleType::Water, ParticleType::Bio) | (ParticleType::Bio, ParticleType::Water)
            ) {
                max_bio = max_bio.max(influence);
            }
            if influence > 0.0 && !wty.is_static() {
                let a = influence * influence * dt;
                ret += exchange(h, ty, heat, wty, store.heat(j), a);
            }
        });

        // Crushed particles skip the rest of the update
        if life > 0.0 {
            let slow = vx.abs() < h.isolation_speed && vy.abs() < h.isolation_speed;
            if (same_count < 1 || life < h.weak_life) && slow {
                life -= dt;
            } else if life < h.weak_life {
                life -= dt;
            }

            if ty.is_watery() && ret > h.boil_threshold {
                life -= dt * ret * h.boil_damage;
                ret *= 1.0 + dt * h.boil_growth;
            } else if ty == ParticleType::Lava && ret < h.lava_chill_threshold {
                ret *= 1.0 + dt * h.boil_growth;
            } else if ty.is_watery() && heat > 0.0 {
                ret -= ret * dt * h.warm_relax;
            }

            let excess_air = (air_heat - h.air_threshold).max(0.0);
            let absorb = match ty {
                ParticleType::Water if heat < h.cold_heat => h.air_absorb_cold,
                ParticleType::Water => h.water_air_absorb,
                ParticleType::Bio if heat < h.cold_heat => h.air_absorb_cold,
                ParticleType::Bio => h.bio_air_absorb,
                _ => 0.0,
            };
            ret += excess_air * dt * absorb;

            ret = ret.clamp(h.min_heat, h.max_heat);

            if py < 0.0 {
                life -= dt * h.top_damage;
            }

            let freeze_below = match ty {
                ParticleType::Water => Some(h.water_freeze_below),
                ParticleType::Lava => Some(h.lava_freeze_below),
                _ => None,
            };
            if let Some(limit) = freeze_below {
                if ret < limit {
                    ty = ParticleType::Solid;
                    life = h.frozen_life;
                    heat = 0.0;
                    ret = 0.0;
                }
            }

            if ty == ParticleType::Water && max_bio > h.bio_contact {
                ty = ParticleType::Bio;
                heat = 0.0;
                ret = 0.0;
            } else if ty == ParticleType::Bio && max_bio > h.bio_contact {
                life -= dt * h.bio_revert_damage;
                if life <= h.bio_revert_life {
                    life = self.types[ParticleType::Water.index()].life;
                    ty = ParticleType::Water;
                }
            }
        }

        let blend = match ty {
            ParticleType::Water if heat < 0.0 => h.water_cold_blend,
            ParticleType::Water => h.water_warm_blend,
            _ => h.default_blend,
        };
        let mut new_heat = ret * blend + heat * (1.0 - blend);
        if ty == ParticleType::Lava && new_heat > 0.0 {
            new_heat = 0.0;
        }

        out[A_TYPE] = ty.to_lane();
        out[A_HEAT] = new_heat;
        out[A_LIFE] = life;
        if ty.is_liquid() {
            let defaults = self.types[ty.index()];
            out[A_RADIUS] = defaults.radius;
            out[A_VISC] = defaults.viscosity;
        }
    }
}

/// Heat gained by a particle of `ty` from one neighbor, given the neighbor's
/// squared influence times `dt`.
fn exchange(h: &HeatConfig, ty: ParticleType, heat: f32, wty: ParticleType, wheat: f32, a: f32) -> f32 {
    use ParticleType::*;

    let (rate, target) = match (ty, wty) {
        (Water | Bio, Water | Bio) => {
            let mut rate = h.watery_rate;
            if wheat > h.thaw_partner_heat && heat < h.cold_heat {
                rate *= h.watery_thaw_boost;
            }
            (rate, wheat)
        }
        (Lava, Lava) => {
            if wheat < h.lava_chill_partner {
                (h.lava_rate * h.lava_chill_boost, wheat - h.chill_offset)
            } else {
                (h.lava_rate, wheat)
            }
        }
        (Water, Lava | Bio) => {
            let mut rate = h.water_heating_rate;
            if heat > h.water_warm_above {
                rate *= h.water_warm_factor;
            }
            if wty == Lava {
                rate *= h.water_lava_boost;
            }
            (rate, wheat + h.hot_offset)
        }
        (Lava, Water) => (h.lava_cooling_rate, wheat - h.chill_offset),
        (Lava, Bio) => (h.lava_bio_rate, wheat - h.hot_offset),
        (Bio, Lava) => (h.bio_heating_rate, wheat + h.hot_offset),
        _ => return 0.0,
    };
    (a * rate).min(h.exchange_cap) * (target - heat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SimConfig, DEFAULT_TYPE_TABLE};

    const DT: f32 = 1.0 / 60.0;

    fn spawn(store: &mut ParticleStore, x: f32, y: f32, ty: ParticleType, heat: f32) -> usize {
        store
            .allocate(x, y, ty, heat, 0.0, DEFAULT_TYPE_TABLE[ty.index()])
            .expect("free slot")
    }

    fn run(store: &ParticleStore, config: &SimConfig) -> Vec<f32> {
        run_with_air(store, config, &AirHeatMap::new(config.grid_side()))
    }

    fn run_with_air(store: &ParticleStore, config: &SimConfig, air: &AirHeatMap) -> Vec<f32> {
        let mut hash = SpatialHash::new(config.grid_side());
        hash.rebuild(store);
        let mut out = vec![0.0; store.capacity() * ATTR_STRIDE];
        AttributePass {
            store,
            hash: &hash,
            air,
            heat: &config.heat,
            types: &config.types,
            world_size: config.world_size,
            dt: DT,
        }
        .run(&mut out);
        out
    }

    fn lane(out: &[f32], idx: usize, lane: usize) -> f32 {
        out[idx * ATTR_STRIDE + lane]
    }

    #[test]
    fn cold_water_freezes_into_rock() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(2);
        let a = spawn(&mut store, 100.0, 100.0, ParticleType::Water, -1.0);
        spawn(&mut store, 104.0, 100.0, ParticleType::Water, -1.0);
        let out = run(&store, &config);
        assert_eq!(lane(&out, a, A_TYPE), ParticleType::Solid.to_lane());
        assert_eq!(lane(&out, a, A_HEAT), 0.0);
        assert_eq!(lane(&out, a, A_LIFE), config.heat.frozen_life);
    }

    #[test]
    fn fire_burns_down() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(1);
        spawn(&mut store, 100.0, 100.0, ParticleType::Fire, 0.0);
        let out = run(&store, &config);
        assert!((lane(&out, 0, A_LIFE) - (1.0 - DT)).abs() < 1e-6);
    }

    #[test]
    fn hot_rock_shrinks() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(1);
        spawn(&mut store, 100.0, 100.0, ParticleType::Solid, 0.8);
        let out = run(&store, &config);
        assert_eq!(lane(&out, 0, A_RADIUS), config.heat.solid_hot_radius);
    }

    #[test]
    fn water_touching_bio_turns_bio() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(2);
        let water = spawn(&mut store, 100.0, 100.0, ParticleType::Water, 0.0);
        let bio = spawn(&mut store, 103.0, 100.0, ParticleType::Bio, 0.0);
        let out = run(&store, &config);
        assert_eq!(lane(&out, water, A_TYPE), ParticleType::Bio.to_lane());
        assert_eq!(lane(&out, water, A_VISC), DEFAULT_TYPE_TABLE[ParticleType::Bio.index()].viscosity);
        // Bio loses life while it is in contact with water
        assert!(lane(&out, bio, A_LIFE) < 1.0);
        assert_eq!(lane(&out, bio, A_TYPE), ParticleType::Bio.to_lane());
    }

    #[test]
    fn water_below_floor_dies() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(1);
        spawn(&mut store, 100.0, config.world_size, ParticleType::Water, 0.0);
        let out = run(&store, &config);
        assert!(lane(&out, 0, A_LIFE) <= 0.0);
    }

    #[test]
    fn lava_cools_next_to_water() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(2);
        let lava = spawn(&mut store, 100.0, 100.0, ParticleType::Lava, 0.0);
        spawn(&mut store, 104.0, 100.0, ParticleType::Water, 0.0);
        let out = run(&store, &config);
        assert!(lane(&out, lava, A_HEAT) < 0.0);
    }

    #[test]
    fn exchange_is_capped() {
        let h = HeatConfig::default();
        let gained = exchange(&h, ParticleType::Lava, 0.0, ParticleType::Water, 0.0, 10.0);
        assert_eq!(gained, h.exchange_cap * -h.chill_offset);
    }

    #[test]
    fn rock_crushes_overlapping_water() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(2);
        let water = spawn(&mut store, 100.0, 100.0, ParticleType::Water, 0.0);
        spawn(&mut store, 100.5, 100.0, ParticleType::Solid, 0.0);
        let out = run(&store, &config);
        assert!(lane(&out, water, A_LIFE) <= 0.0);
    }

    #[test]
    fn water_above_the_top_takes_damage() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(2);
        let high = spawn(&mut store, 100.0, -5.0, ParticleType::Water, 0.0);
        let low = spawn(&mut store, 300.0, 100.0, ParticleType::Water, 0.0);
        let out = run(&store, &config);
        // Both are isolated; only the one above the top pays top damage
        let top = config.heat.top_damage;
        assert!((lane(&out, high, A_LIFE) - (1.0 - DT - DT * top)).abs() < 1e-6);
        assert!((lane(&out, low, A_LIFE) - (1.0 - DT)).abs() < 1e-6);
    }

    #[test]
    fn isolated_still_water_decays() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(3);
        let lone = spawn(&mut store, 300.0, 100.0, ParticleType::Water, 0.0);
        let a = spawn(&mut store, 100.0, 100.0, ParticleType::Water, 0.0);
        let b = spawn(&mut store, 104.0, 100.0, ParticleType::Water, 0.0);
        let out = run(&store, &config);
        assert!((lane(&out, lone, A_LIFE) - (1.0 - DT)).abs() < 1e-6);
        assert_eq!(lane(&out, a, A_LIFE), 1.0);
        assert_eq!(lane(&out, b, A_LIFE), 1.0);
    }

    #[test]
    fn moving_water_is_not_isolated() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(1);
        let idx = spawn(&mut store, 300.0, 100.0, ParticleType::Water, 0.0);
        store.set_vel(idx, 20.0, 0.0);
        let out = run(&store, &config);
        assert_eq!(lane(&out, idx, A_LIFE), 1.0);
    }

    #[test]
    fn cold_lava_freezes_into_rock() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(2);
        let a = spawn(&mut store, 100.0, 100.0, ParticleType::Lava, -1.0);
        spawn(&mut store, 104.0, 100.0, ParticleType::Lava, -1.0);
        let out = run(&store, &config);
        assert_eq!(lane(&out, a, A_TYPE), ParticleType::Solid.to_lane());
        assert_eq!(lane(&out, a, A_HEAT), 0.0);
        assert_eq!(lane(&out, a, A_LIFE), config.heat.frozen_life);
    }

    #[test]
    fn worn_out_bio_reverts_to_water() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(2);
        let bio = spawn(&mut store, 100.0, 100.0, ParticleType::Bio, 0.0);
        store.set_attr(bio, A_LIFE, 0.15);
        spawn(&mut store, 103.0, 100.0, ParticleType::Water, 0.0);
        let out = run(&store, &config);
        let water = DEFAULT_TYPE_TABLE[ParticleType::Water.index()];
        assert_eq!(lane(&out, bio, A_TYPE), ParticleType::Water.to_lane());
        assert_eq!(lane(&out, bio, A_LIFE), water.life);
        assert_eq!(lane(&out, bio, A_RADIUS), water.radius);
        assert_eq!(lane(&out, bio, A_VISC), water.viscosity);
    }

    #[test]
    fn cold_water_soaks_up_hot_air() {
        let config = SimConfig::default();
        let h = &config.heat;
        let mut store = ParticleStore::new(2);
        let warm = spawn(&mut store, 100.0, 100.0, ParticleType::Water, 0.0);
        let cold = spawn(&mut store, 300.0, 100.0, ParticleType::Water, -0.5);
        let mut air = AirHeatMap::new(config.grid_side());
        air.set(50, 50, 20.0);
        air.set(150, 50, 20.0);

        let out = run_with_air(&store, &config, &air);
        // Sampled air is 20 * 0.25 = 5, so 2.5 above the threshold
        let excess = 20.0 * h.air_sample_scale - h.air_threshold;
        let warm_heat = excess * DT * h.water_air_absorb * h.water_warm_blend;
        let cold_ret = -0.5 + excess * DT * h.air_absorb_cold;
        let cold_heat = cold_ret * h.water_cold_blend - 0.5 * (1.0 - h.water_cold_blend);
        assert!((lane(&out, warm, A_HEAT) - warm_heat).abs() < 1e-5);
        assert!((lane(&out, cold, A_HEAT) - cold_heat).abs() < 1e-5);
        assert!(lane(&out, cold, A_HEAT) + 0.5 > 10.0 * lane(&out, warm, A_HEAT));

        // Cool air is ignored
        let still = run(&store, &config);
        assert_eq!(lane(&still, warm, A_HEAT), 0.0);
    }

    #[test]
    fn water_beside_cold_lava_freezes_gradually() {
        let mut config = SimConfig::default();
        config.heat.hot_offset = 0.0;
        // Keep the lava liquid so it keeps chilling the water
        config.heat.lava_freeze_below = -1.5;
        let mut store = ParticleStore::new(2);
        let water = spawn(&mut store, 100.0, 100.0, ParticleType::Water, 0.0);
        let lava = spawn(&mut store, 104.0, 100.0, ParticleType::Lava, -1.0);
        store.set_vel(water, 20.0, 0.0);
        store.set_vel(lava, 20.0, 0.0);

        let mut last_heat = 0.0;
        let mut frozen_at = None;
        for tick in 1..=60 {
            let out = run(&store, &config);
            store.attributes.copy_from_slice(&out);
            assert_eq!(store.particle_type(lava), ParticleType::Lava);
            if store.particle_type(water) == ParticleType::Solid {
                frozen_at = Some(tick);
                break;
            }
            let heat = store.heat(water);
            assert!(heat < last_heat, "tick {}: {} -> {}", tick, last_heat, heat);
            last_heat = heat;
        }

        let tick = frozen_at.expect("water froze");
        assert!(tick > 2, "froze on tick {}", tick);
    }

    #[test]
    fn batch_matches_particle_by_particle() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(128);
        for i in 0..120 {
            let x = 100.0 + (i % 12) as f32 * 3.1 + (i / 12 % 3) as f32 * 0.7;
            let y = 100.0 + (i / 12) as f32 * 2.9;
            let heat = ((i * 7) % 11) as f32 / 5.0 - 1.0;
            let idx = spawn(&mut store, x, y, ParticleType::ALL[i % 5], heat);
            store.set_vel(idx, (i % 9) as f32 - 4.0, (i % 5) as f32);
        }
        store.free(17);

        let mut hash = SpatialHash::new(config.grid_side());
        hash.rebuild(&store);
        let mut air = AirHeatMap::new(config.grid_side());
        air.set(60, 55, 30.0);
        let pass = AttributePass {
            store: &store,
            hash: &hash,
            air: &air,
            heat: &config.heat,
            types: &config.types,
            world_size: config.world_size,
            dt: DT,
        };
        let mut out = vec![0.0; store.capacity() * ATTR_STRIDE];
        pass.run(&mut out);

        let mut one = [0.0; ATTR_STRIDE];
        for idx in 0..store.capacity() {
            pass.particle(idx, &mut one);
            let batch = &out[idx * ATTR_STRIDE..(idx + 1) * ATTR_STRIDE];
            let same = batch.iter().zip(&one).all(|(a, b)| a.to_bits() == b.to_bits());
            assert!(same, "slot {}: {:?} vs {:?}", idx, batch, one);
        }
    }
}
