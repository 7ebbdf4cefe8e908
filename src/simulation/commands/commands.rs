use std::f32::consts::TAU;

use crate::core::random::next_unit;
use crate::domain::{ParticleType, TypeMask};

use super::SimulationCore;

pub(super) fn allocate(
    sim: &mut SimulationCore,
    x: f32,
    y: f32,
    ty: ParticleType,
    heat: f32,
    downward: bool,
) -> Option<usize> {
    let vy = if downward { sim.config.emit.down_speed } else { 0.0 };
    let defaults = sim.config.type_defaults(ty);

    match sim.store.allocate(x, y, ty, heat, vy, defaults) {
        Some(idx) => {
            if sim.saturated {
                log::debug!("particle pool has free slots again");
                sim.saturated = false;
            }
            sim.hash_dirty = true;
            Some(idx)
        }
        None => {
            sim.alloc_failures = sim.alloc_failures.saturating_add(1);
            if !sim.saturated {
                log::warn!(
                    "particle pool full ({} slots), dropping emissions until slots free up",
                    sim.store.capacity()
                );
                sim.saturated = true;
            }
            None
        }
    }
}

pub(super) fn free(sim: &mut SimulationCore, index: usize) {
    if index < sim.store.capacity() {
        sim.store.free(index);
        sim.hash_dirty = true;
    }
}

pub(super) fn clear_in_radius(
    sim: &mut SimulationCore,
    x: f32,
    y: f32,
    radius: f32,
    mask: TypeMask,
) -> usize {
    let fragment = sim.config.type_defaults(ParticleType::Solid);
    let cleared = sim.store.clear_in_radius(x, y, radius, mask, fragment);
    if cleared > 0 {
        sim.hash_dirty = true;
    }
    cleared
}

pub(super) fn emit(
    sim: &mut SimulationCore,
    x: f32,
    y: f32,
    radius: f32,
    ty: ParticleType,
    heat: f32,
    downward: bool,
) -> usize {
    if ty == ParticleType::Solid {
        emit_rock(sim, x, y, radius, heat)
    } else {
        emit_fluid(sim, x, y, radius, ty, heat, downward)
    }
}

/// One particle at a random point of the disk, replacing same-type matter
/// already sitting there.
fn emit_fluid(
    sim: &mut SimulationCore,
    x: f32,
    y: f32,
    radius: f32,
    ty: ParticleType,
    heat: f32,
    downward: bool,
) -> usize {
    let angle = next_unit(&mut sim.rng_state) * TAU;
    let dist = next_unit(&mut sim.rng_state) * radius.max(0.0) * sim.config.emit.jitter_scale;
    let px = (x + angle.cos() * dist).round();
    let py = (y + angle.sin() * dist).round();

    let replace = sim.config.emit.replace_radius;
    clear_in_radius(sim, px, py, replace, TypeMask::only(ty));
    allocate(sim, px, py, ty, heat, downward).map_or(0, |_| 1)
}

/// Fill the disk with rock, one particle per covered half-resolution cell
/// (every `solidLatticeStep`-th cell per axis). Cells outside the grid get
/// nothing.
fn emit_rock(sim: &mut SimulationCore, x: f32, y: f32, radius: f32, heat: f32) -> usize {
    if !x.is_finite() || !y.is_finite() {
        return 0;
    }
    let side = sim.config.grid_side() as i64;
    // A disk wider than the grid covers all of it
    let ir = (radius.max(0.0) * 0.5).ceil().min((2 * side) as f32) as i64;
    let ix = (x * 0.5).round().clamp(-(4 * side) as f32, (4 * side) as f32) as i64;
    let iy = (y * 0.5).round().clamp(-(4 * side) as f32, (4 * side) as f32) as i64;
    let stride = sim.config.emit.solid_lattice_step.max(1) as i64;
    let clear = sim.config.emit.solid_clear_radius;
    let reach = (ir * ir) as f32;

    let mut placed = 0;
    for xx in lattice_offsets(ir, ix, side, stride) {
        for yy in lattice_offsets(ir, iy, side, stride) {
            // Lattice points sit at cell centres
            let dx = xx as f32 + 0.5;
            let dy = yy as f32 + 0.5;
            if dx * dx + dy * dy > reach {
                continue;
            }
            let gx = ((xx + ix) * 2 + 1) as f32;
            let gy = ((yy + iy) * 2 + 1) as f32;
            clear_in_radius(sim, gx, gy, clear, TypeMask::ALL);
            if allocate(sim, gx, gy, ParticleType::Solid, heat, false).is_some() {
                placed += 1;
            }
        }
    }
    placed
}

/// Offsets `-ir, -ir + stride, ..` up to `ir` whose cell `center + offset`
/// lies inside the grid.
fn lattice_offsets(ir: i64, center: i64, side: i64, stride: i64) -> impl Iterator<Item = i64> {
    let lo = (-ir).max(-center);
    let hi = ir.min(side - 1 - center);
    let first = -ir + (lo + ir + stride - 1) / stride * stride;
    (first..=hi).step_by(stride as usize)
}

pub(super) fn emit_pipe(sim: &mut SimulationCore, x: f32, y: f32, r: f32, ty: ParticleType) -> usize {
    emit(sim, x, y + r * 0.25, r * 0.2, ty, 0.0, true)
}

pub(super) fn reset(sim: &mut SimulationCore) {
    sim.store.reset();
    sim.heat_map.reset();
    sim.hash.clear();
    sim.hash_dirty = false;
    sim.saturated = false;
    sim.alloc_failures = 0;
    sim.sound_cache = Default::default();
    log::info!("simulation reset ({} slots)", sim.store.capacity());
}
