//! Read-only queries gameplay and audio run against committed state.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::domain::{ParticleType, QueryConfig};
use crate::spatial::{cell_coord, ParticleStore, SpatialHash};

/// Closest collidable particle to a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearestParticle {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub ty: ParticleType,
    pub heat: f32,
    pub radius: f32,
    pub vx: f32,
    pub vy: f32,
    pub distance: f32,
}

/// Scan the hash window around `(x, y)` for the nearest particle whose life
/// is above `nearestMinLife`. Equal distances keep the first one scanned.
pub fn nearest_particle(
    store: &ParticleStore,
    hash: &SpatialHash,
    q: &QueryConfig,
    x: f32,
    y: f32,
) -> Option<NearestParticle> {
    let mut best: Option<(usize, f32)> = None;
    hash.for_each_in_window(cell_coord(x), cell_coord(y), q.nearest_window, |i| {
        if store.life(i) <= q.nearest_min_life {
            return;
        }
        let (px, py) = store.pos(i);
        let dx = px - x;
        let dy = py - y;
        let dist = (dx * dx + dy * dy).sqrt();
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((i, dist));
        }
    });

    best.map(|(index, distance)| {
        let (px, py) = store.pos(index);
        let (vx, vy) = store.vel(index);
        NearestParticle {
            index,
            x: px,
            y: py,
            ty: store.particle_type(index),
            heat: store.heat(index),
            radius: store.radius(index),
            vx,
            vy,
            distance,
        }
    })
}

/// Alive particles of `ty` within `radius` of `(x, y)`. Brute force over the
/// whole pool; a negative radius counts nothing.
pub fn count_type_near(store: &ParticleStore, x: f32, y: f32, radius: f32, ty: ParticleType) -> usize {
    if radius < 0.0 {
        return 0;
    }
    let r2 = radius * radius;
    (0..store.capacity())
        .filter(|&i| store.is_alive(i) && store.particle_type(i) == ty)
        .filter(|&i| {
            let (px, py) = store.pos(i);
            let dx = px - x;
            let dy = py - y;
            dx * dx + dy * dy <= r2
        })
        .count()
}

/// Audio metrics for one lattice point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoundSample {
    /// Weighted liquid presence per scanned cell; hot Water/Bio lowers it.
    pub density: f32,
    /// Weighted velocity change (plus a heat term for Water/Bio).
    pub speed: f32,
    /// Most common liquid around the point. Fire counts as Lava.
    pub dominant: ParticleType,
}

impl Default for SoundSample {
    fn default() -> Self {
        Self {
            density: 0.0,
            speed: 0.0,
            dominant: ParticleType::Water,
        }
    }
}

/// `side x side` lattice of samples centred on a focus point, row-major.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SoundField {
    pub side: usize,
    pub samples: Vec<SoundSample>,
}

impl SoundField {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, col: usize, row: usize) -> Option<&SoundSample> {
        if col >= self.side || row >= self.side {
            return None;
        }
        self.samples.get(row * self.side + col)
    }

    /// Sample nearest the focus point.
    pub fn center(&self) -> Option<&SoundSample> {
        self.get(self.side / 2, self.side / 2)
    }

    /// Flat `[density, speed, dominant]` triples, the layout audio code reads.
    pub fn to_flat(&self) -> Vec<f32> {
        self.samples
            .iter()
            .flat_map(|s| [s.density, s.speed, s.dominant.to_lane()])
            .collect()
    }
}

pub fn sample_sound_field(
    store: &ParticleStore,
    hash: &SpatialHash,
    q: &QueryConfig,
    focus_x: f32,
    focus_y: f32,
) -> SoundField {
    let side = q.sound_lattice;
    let half = (side / 2) as i32;
    let point = |i: usize| {
        let col = (i % side) as i32 - half;
        let row = (i / side) as i32 - half;
        sample_point(
            store,
            hash,
            q,
            focus_x + col as f32 * q.sound_spacing,
            focus_y + row as f32 * q.sound_spacing,
        )
    };

    #[cfg(feature = "parallel")]
    let samples: Vec<SoundSample> = (0..side * side).into_par_iter().map(point).collect();

    #[cfg(not(feature = "parallel"))]
    let samples: Vec<SoundSample> = (0..side * side).map(point).collect();

    SoundField { side, samples }
}

fn sample_point(store: &ParticleStore, hash: &SpatialHash, q: &QueryConfig, x: f32, y: f32) -> SoundSample {
    let cells = (2 * q.sound_window + 1) as f32;
    let total_cells = cells * cells;

    let mut density = 0.0f32;
    let mut speed = 0.0f32;
    let mut total_weight = 0.0f32;
    // water, lava, bio
    let mut counts = [0u32; 3];

    hash.for_each_in_window(cell_coord(x), cell_coord(y), q.sound_window, |i| {
        if !store.is_alive(i) {
            return;
        }
        let ty = match store.particle_type(i) {
            ParticleType::Fire => ParticleType::Lava,
            other => other,
        };
        if !ty.is_liquid() {
            return;
        }
        match ty {
            ParticleType::Water => counts[0] += 1,
            ParticleType::Bio => counts[2] += 1,
            _ => counts[1] += 1,
        }

        let (px, py) = store.pos(i);
        let dx = px - x;
        let dy = py - y;
        let dist = (dx * dx + dy * dy).sqrt();
        let mut weight = (1.0 - dist / q.sound_falloff).max(0.0).powf(q.sound_falloff_exp);

        if ty != ParticleType::Lava {
            let heat = store.heat(i);
            weight *= 1.0 + q.sound_heat_gain * heat.max(0.0);
            density -= heat * weight * q.sound_heat_density;
            speed += heat.max(0.0) * q.sound_heat_speed * weight;
        }
        density += weight;
        total_weight += weight;

        let (vx, vy) = store.vel(i);
        let (lvx, lvy) = store.prev_vel(i);
        let dvx = vx - lvx;
        let dvy = vy - lvy;
        speed += (dvx * dvx + dvy * dvy).powf(q.sound_velocity_exp) * weight * q.sound_velocity_gain;
    });

    density /= total_cells;
    if total_weight > 0.0 {
        speed /= total_weight;
    }

    let [water, lava, bio] = counts;
    let dominant = if water >= lava && water >= bio {
        ParticleType::Water
    } else if lava >= bio {
        ParticleType::Lava
    } else {
        ParticleType::Bio
    };

    SoundSample {
        density,
        speed,
        dominant,
    }
}
