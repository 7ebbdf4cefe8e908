//! Force/velocity integrator.
//!
//! Reads committed positions, velocities and attributes plus the hash built
//! from them, and writes every slot's new velocity into a separate buffer.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::MIN_DIST_EPS;
use crate::domain::{ForceConfig, ParticleType};
use crate::spatial::{cell_coord, ParticleStore, SpatialHash, POS_STRIDE};

pub struct VelocityPass<'a> {
    pub store: &'a ParticleStore,
    pub hash: &'a SpatialHash,
    pub forces: &'a ForceConfig,
    pub world_size: f32,
    pub dt: f32,
    pub player: (f32, f32),
}

impl<'a> VelocityPass<'a> {
    /// Fill `out` (length `2N`) with the next velocity of every slot.
    pub fn run(&self, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.store.capacity() * POS_STRIDE);

        #[cfg(feature = "parallel")]
        {
            out.par_chunks_mut(POS_STRIDE)
                .enumerate()
                .for_each(|(idx, v)| {
                    let (vx, vy) = self.particle(idx);
                    v[0] = vx;
                    v[1] = vy;
                });
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (idx, v) in out.chunks_mut(POS_STRIDE).enumerate() {
                let (vx, vy) = self.particle(idx);
                v[0] = vx;
                v[1] = vy;
            }
        }
    }

    fn particle(&self, idx: usize) -> (f32, f32) {
        let store = self.store;
        let f = self.forces;
        let dt = self.dt;

        // Dead slots keep whatever they had
        if !store.is_alive(idx) {
            return store.vel(idx);
        }
        let ty = store.particle_type(idx);
        if ty.is_static() {
            return (0.0, 0.0);
        }

        let heat = store.heat(idx);
        let radius = store.radius(idx);
        let visc = store.viscosity(idx);
        let (px, py) = store.pos(idx);
        let (mut vx, mut vy) = store.vel(idx);

        if ty.is_watery() {
            let k = f.damping * (1.0 - (-heat).max(0.0) * f.cold_damping);
            vx *= k;
            vy *= k;
        }
        vy += dt * f.gravity;
        // Cold Water/Bio floats, warm sinks (y grows downward)
        if ty.is_watery() && heat != 0.0 {
            vy += dt * f.heat_buoyancy * heat;
            vy *= f.damping;
        }
        if matches!(ty, ParticleType::Lava | ParticleType::Bio) {
            vx *= f.damping * (1.0 - heat.max(0.0) * f.hot_damping);
            vy *= f.damping;
        }

        // Velocity before neighbor coupling; viscosity blends against this
        let (ivx, ivy) = (vx, vy);
        let pair_row = &f.pair[ty.index()];

        self.hash
            .for_each_in_window(cell_coord(px), cell_coord(py), f.window, |j| {
                if j == idx || !store.is_alive(j) {
                    return;
                }
                let wty = store.particle_type(j);
                // Fire only pushes other Fire
                if wty == ParticleType::Fire && ty != ParticleType::Fire {
                    return;
                }
                let (wx, wy) = store.pos(j);
                let dx = px - wx;
                let dy = py - wy;
                let reach = (radius + store.radius(j)).max(MIN_DIST_EPS);
                let influence = 1.0 - (dx * dx + dy * dy) / (reach * reach);
                if influence <= 0.0 {
                    return;
                }
                let influence = influence * influence;

                let push = pair_row[wty.index()] * f.pair_scale;
                vx += dx * influence * dt * push;
                vy += dy * influence * dt * push;

                if !wty.is_static() {
                    let (wvx, wvy) = store.vel(j);
                    let a = (influence * (visc + store.viscosity(j)) * dt).min(1.0);
                    vx += (wvx - ivx) * a + wvx * dt * f.neighbor_drag;
                    vy += (wvy - ivy) * a + wvy * dt * f.neighbor_drag;
                }
            });

        if ty.is_watery() {
            let (plx, ply) = self.player;
            let dx = px - plx;
            let dy = py - ply;
            let reach = (radius + f.player_radius).max(MIN_DIST_EPS);
            let influence = 1.0 - (dx * dx + dy * dy) / (reach * reach);
            if influence > 0.0 {
                let influence = influence * influence;
                vx -= dx * influence * dt * f.player_pull;
                vy -= dy * influence * dt * f.player_pull;
            }
        }

        if (px < 1.0 && vx < 0.0) || (px >= self.world_size - 1.0 && vx > 0.0) {
            vx = -vx * f.wall_restitution;
        }

        (vx, vy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SimConfig, DEFAULT_TYPE_TABLE};

    const FAR_PLAYER: (f32, f32) = (-10_000.0, -10_000.0);

    fn spawn(store: &mut ParticleStore, x: f32, y: f32, ty: ParticleType, heat: f32) -> usize {
        store
            .allocate(x, y, ty, heat, 0.0, DEFAULT_TYPE_TABLE[ty.index()])
            .expect("free slot")
    }

    fn run(store: &ParticleStore, config: &SimConfig, player: (f32, f32)) -> Vec<f32> {
        let mut hash = SpatialHash::new(config.grid_side());
        hash.rebuild(store);
        let mut out = vec![0.0; store.capacity() * POS_STRIDE];
        VelocityPass {
            store,
            hash: &hash,
            forces: &config.forces,
            world_size: config.world_size,
            dt: 1.0 / 60.0,
            player,
        }
        .run(&mut out);
        out
    }

    #[test]
    fn lone_water_falls() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(4);
        spawn(&mut store, 512.0, 512.0, ParticleType::Water, 0.0);
        let out = run(&store, &config, FAR_PLAYER);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 100.0 / 60.0).abs() < 1e-5);
    }

    #[test]
    fn solid_is_static_and_dead_slots_echo() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(4);
        let rock = spawn(&mut store, 100.0, 100.0, ParticleType::Solid, 0.0);
        store.set_vel(rock, 5.0, 5.0);
        let dead = spawn(&mut store, 200.0, 200.0, ParticleType::Water, 0.0);
        store.set_vel(dead, 3.0, -7.0);
        store.free(dead);

        let out = run(&store, &config, FAR_PLAYER);
        assert_eq!((out[0], out[1]), (0.0, 0.0));
        assert_eq!((out[2], out[3]), (3.0, -7.0));
    }

    #[test]
    fn cold_water_rises() {
        let mut config = SimConfig::default();
        config.forces.gravity = 0.0;
        let mut store = ParticleStore::new(1);
        spawn(&mut store, 512.0, 512.0, ParticleType::Water, -0.5);
        let out = run(&store, &config, FAR_PLAYER);
        let expected = -0.5 * config.forces.heat_buoyancy / 60.0 * config.forces.damping;
        assert!((out[1] - expected).abs() < 1e-4, "vy = {}", out[1]);
        assert!(out[1] < 0.0);
    }

    #[test]
    fn warm_water_sinks() {
        let mut config = SimConfig::default();
        config.forces.gravity = 0.0;
        let mut store = ParticleStore::new(1);
        spawn(&mut store, 512.0, 512.0, ParticleType::Water, 0.5);
        let out = run(&store, &config, FAR_PLAYER);
        assert!(out[1] > 0.0, "vy = {}", out[1]);
    }

    #[test]
    fn hot_lava_damps_sideways_only() {
        let mut config = SimConfig::default();
        config.forces.gravity = 0.0;
        let f = &config.forces;
        let mut store = ParticleStore::new(1);
        let idx = spawn(&mut store, 512.0, 512.0, ParticleType::Lava, 2.0);
        store.set_vel(idx, 10.0, 10.0);
        let out = run(&store, &config, FAR_PLAYER);
        let lateral = 10.0 * f.damping * (1.0 - 2.0 * f.hot_damping);
        assert!((out[0] - lateral).abs() < 1e-4, "vx = {}", out[0]);
        assert!((out[1] - 10.0 * f.damping).abs() < 1e-4, "vy = {}", out[1]);
    }

    #[test]
    fn left_wall_reflects() {
        let config = SimConfig::default();
        let mut store = ParticleStore::new(1);
        let idx = spawn(&mut store, -2.0, 300.0, ParticleType::Water, 0.0);
        store.set_vel(idx, -40.0, 0.0);
        let out = run(&store, &config, FAR_PLAYER);
        assert!(out[0] > 0.0);
        assert!(out[0] <= 40.0 * 0.95);
    }

    #[test]
    fn overlapping_pair_pushes_apart() {
        let mut config = SimConfig::default();
        config.forces.gravity = 0.0;
        let mut store = ParticleStore::new(2);
        spawn(&mut store, 100.0, 100.0, ParticleType::Lava, 0.0);
        spawn(&mut store, 103.0, 100.0, ParticleType::Lava, 0.0);
        let out = run(&store, &config, FAR_PLAYER);
        assert!(out[0] < 0.0, "left particle should move left, got {}", out[0]);
        assert!(out[2] > 0.0, "right particle should move right, got {}", out[2]);
    }

    #[test]
    fn fire_does_not_push_water() {
        let mut config = SimConfig::default();
        config.forces.gravity = 0.0;
        let mut store = ParticleStore::new(2);
        spawn(&mut store, 100.0, 100.0, ParticleType::Water, 0.0);
        spawn(&mut store, 101.0, 100.0, ParticleType::Fire, 0.0);
        let out = run(&store, &config, FAR_PLAYER);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn player_pulls_nearby_water() {
        let mut config = SimConfig::default();
        config.forces.gravity = 0.0;
        let mut store = ParticleStore::new(1);
        spawn(&mut store, 100.0, 100.0, ParticleType::Water, 0.0);
        let out = run(&store, &config, (103.0, 100.0));
        assert!(out[0] > 0.0);
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
        let pass = VelocityPass {
            store: &store,
            hash: &hash,
            forces: &config.forces,
            world_size: config.world_size,
            dt: 1.0 / 60.0,
            player: (120.0, 110.0),
        };
        let mut out = vec![0.0; store.capacity() * POS_STRIDE];
        pass.run(&mut out);

        for idx in 0..store.capacity() {
            let (vx, vy) = pass.particle(idx);
            assert_eq!(out[idx * POS_STRIDE].to_bits(), vx.to_bits(), "vx of {}", idx);
            assert_eq!(out[idx * POS_STRIDE + 1].to_bits(), vy.to_bits(), "vy of {}", idx);
        }
    }
}
