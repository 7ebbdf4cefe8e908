//! Particle Store - fixed-capacity flat buffers
//!
//! A particle is a slot index into three interleaved float buffers:
//!
//! ```text
//! position   [x0, y0, x1, y1, ...]                        2N
//! velocity   [vx0, vy0, vx1, vy1, ...]                    2N
//! attributes [type0, heat0, radius0, visc0, life0, ...]   5N
//! ```
//!
//! Slots are never compacted. `life <= 0` marks a free slot; its other lanes
//! are stale and every stage skips it. These are the same shapes the level
//! files store, so save/load is a straight copy.

use crate::domain::{ParticleType, TypeDefaults, TypeMask};

pub const POS_STRIDE: usize = 2;
pub const ATTR_STRIDE: usize = 5;

pub const A_TYPE: usize = 0;
pub const A_HEAT: usize = 1;
pub const A_RADIUS: usize = 2;
pub const A_VISC: usize = 3;
pub const A_LIFE: usize = 4;

/// Life written into slots converted by a clear. Negative, so the slot is free.
pub const PLACEHOLDER_LIFE: f32 = -1.0;

pub struct ParticleStore {
    capacity: usize,

    pub position: Vec<f32>,
    pub velocity: Vec<f32>,
    /// Velocities as they were when the current tick started.
    pub prev_velocity: Vec<f32>,
    pub attributes: Vec<f32>,
}

/// How a flat buffer load had to be adjusted to fit the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadFit {
    /// Lanes filled with zeros because the input was short.
    pub padded: usize,
    /// Lanes dropped because the input was long.
    pub truncated: usize,
}

impl LoadFit {
    pub fn is_exact(&self) -> bool {
        self.padded == 0 && self.truncated == 0
    }
}

impl ParticleStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            position: vec![0.0; capacity * POS_STRIDE],
            velocity: vec![0.0; capacity * POS_STRIDE],
            prev_velocity: vec![0.0; capacity * POS_STRIDE],
            attributes: vec![0.0; capacity * ATTR_STRIDE],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // === Per-slot accessors ===

    #[inline]
    pub fn attr(&self, idx: usize, lane: usize) -> f32 {
        *fast!(self.attributes, [idx * ATTR_STRIDE + lane])
    }

    #[inline]
    pub fn set_attr(&mut self, idx: usize, lane: usize, value: f32) {
        fast!(self.attributes, [idx * ATTR_STRIDE + lane] = value);
    }

    #[inline]
    pub fn life(&self, idx: usize) -> f32 {
        self.attr(idx, A_LIFE)
    }

    #[inline]
    pub fn is_alive(&self, idx: usize) -> bool {
        self.life(idx) > 0.0
    }

    #[inline]
    pub fn particle_type(&self, idx: usize) -> ParticleType {
        ParticleType::from_lane(self.attr(idx, A_TYPE))
    }

    #[inline]
    pub fn heat(&self, idx: usize) -> f32 {
        self.attr(idx, A_HEAT)
    }

    #[inline]
    pub fn radius(&self, idx: usize) -> f32 {
        self.attr(idx, A_RADIUS)
    }

    #[inline]
    pub fn viscosity(&self, idx: usize) -> f32 {
        self.attr(idx, A_VISC)
    }

    #[inline]
    pub fn pos(&self, idx: usize) -> (f32, f32) {
        let base = idx * POS_STRIDE;
        (*fast!(self.position, [base]), *fast!(self.position, [base + 1]))
    }

    #[inline]
    pub fn set_pos(&mut self, idx: usize, x: f32, y: f32) {
        let base = idx * POS_STRIDE;
        fast!(self.position, [base] = x);
        fast!(self.position, [base + 1] = y);
    }

    #[inline]
    pub fn vel(&self, idx: usize) -> (f32, f32) {
        let base = idx * POS_STRIDE;
        (*fast!(self.velocity, [base]), *fast!(self.velocity, [base + 1]))
    }

    #[inline]
    pub fn set_vel(&mut self, idx: usize, vx: f32, vy: f32) {
        let base = idx * POS_STRIDE;
        fast!(self.velocity, [base] = vx);
        fast!(self.velocity, [base + 1] = vy);
    }

    #[inline]
    pub fn prev_vel(&self, idx: usize) -> (f32, f32) {
        let base = idx * POS_STRIDE;
        (*fast!(self.prev_velocity, [base]), *fast!(self.prev_velocity, [base + 1]))
    }

    // === Pool operations ===

    /// Lowest free slot (`life <= 0`).
    ///
    /// Linear scan; at 8K slots this is cheap next to a tick, but it is the
    /// first thing to replace with a free list if emitters get heavier.
    pub fn find_free_slot(&self) -> Option<usize> {
        self.attributes
            .chunks_exact(ATTR_STRIDE)
            .position(|attrs| attrs[A_LIFE] <= 0.0)
    }

    /// Place one particle exactly at `(x, y)` in the lowest free slot.
    ///
    /// Returns `None` when the pool is full; nothing is written in that case.
    pub fn allocate(
        &mut self,
        x: f32,
        y: f32,
        ty: ParticleType,
        heat: f32,
        vy: f32,
        defaults: TypeDefaults,
    ) -> Option<usize> {
        let idx = self.find_free_slot()?;
        self.set_pos(idx, x, y);
        self.set_vel(idx, 0.0, vy);
        let base = idx * POS_STRIDE;
        self.prev_velocity[base] = 0.0;
        self.prev_velocity[base + 1] = vy;
        self.set_attr(idx, A_TYPE, ty.to_lane());
        self.set_attr(idx, A_HEAT, heat);
        self.set_attr(idx, A_RADIUS, defaults.radius);
        self.set_attr(idx, A_VISC, defaults.viscosity);
        self.set_attr(idx, A_LIFE, defaults.life);
        Some(idx)
    }

    /// Mark a slot free. Out-of-range indices are ignored.
    pub fn free(&mut self, idx: usize) {
        if idx < self.capacity {
            self.set_attr(idx, A_LIFE, 0.0);
        }
    }

    /// Turn every alive particle of `mask` within `radius` of the centre into a
    /// dead rock fragment (type Solid, heat 0, negative life).
    ///
    /// Returns the number of particles converted.
    pub fn clear_in_radius(
        &mut self,
        cx: f32,
        cy: f32,
        radius: f32,
        mask: TypeMask,
        fragment: TypeDefaults,
    ) -> usize {
        if radius < 0.0 {
            return 0;
        }
        let r2 = radius * radius;
        let mut cleared = 0;
        for idx in 0..self.capacity {
            if !self.is_alive(idx) || !mask.contains(self.particle_type(idx)) {
                continue;
            }
            let (x, y) = self.pos(idx);
            let dx = x - cx;
            let dy = y - cy;
            if dx * dx + dy * dy <= r2 {
                self.set_attr(idx, A_TYPE, ParticleType::Solid.to_lane());
                self.set_attr(idx, A_HEAT, 0.0);
                self.set_attr(idx, A_RADIUS, fragment.radius);
                self.set_attr(idx, A_VISC, fragment.viscosity);
                self.set_attr(idx, A_LIFE, PLACEHOLDER_LIFE);
                cleared += 1;
            }
        }
        cleared
    }

    /// Free every slot and zero all buffers.
    pub fn reset(&mut self) {
        self.position.fill(0.0);
        self.velocity.fill(0.0);
        self.prev_velocity.fill(0.0);
        self.attributes.fill(0.0);
    }

    /// Remember the current velocities as "last frame".
    pub fn snapshot_velocities(&mut self) {
        self.prev_velocity.copy_from_slice(&self.velocity);
    }

    // === Counting ===

    pub fn alive_count(&self) -> usize {
        self.attributes
            .chunks_exact(ATTR_STRIDE)
            .filter(|attrs| attrs[A_LIFE] > 0.0)
            .count()
    }

    /// Alive particles per type, indexed by type id.
    pub fn count_by_type(&self) -> [u32; 5] {
        let mut counts = [0u32; 5];
        for attrs in self.attributes.chunks_exact(ATTR_STRIDE) {
            if attrs[A_LIFE] > 0.0 {
                counts[ParticleType::from_lane(attrs[A_TYPE]).index()] += 1;
            }
        }
        counts
    }

    // === Flat buffers ===

    /// Copies of the position, velocity and attribute buffers.
    pub fn to_flat(&self) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        (
            self.position.clone(),
            self.velocity.clone(),
            self.attributes.clone(),
        )
    }

    /// Load flat buffers, zero-padding short inputs and dropping extra lanes.
    pub fn load_flat(&mut self, position: &[f32], velocity: &[f32], attributes: &[f32]) -> LoadFit {
        let mut fit = LoadFit::default();
        fit_into(&mut self.position, position, &mut fit);
        fit_into(&mut self.velocity, velocity, &mut fit);
        fit_into(&mut self.attributes, attributes, &mut fit);
        self.prev_velocity.copy_from_slice(&self.velocity);
        fit
    }
}

fn fit_into(dst: &mut [f32], src: &[f32], fit: &mut LoadFit) {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    dst[n..].fill(0.0);
    fit.padded += dst.len() - n;
    fit.truncated += src.len() - n;
}
