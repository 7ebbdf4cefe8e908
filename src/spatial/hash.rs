//! Spatial Hash - one slot per 2x2-unit cell
//!
//! Each cell remembers at most one particle index. Dense regions lose
//! particles from the index (they are still simulated, just not seen as
//! neighbors); the kernels are tuned for that.

use super::store::ParticleStore;

/// Cell marker for "no particle".
pub const EMPTY_CELL: u32 = u32::MAX;

/// World units per hash cell side.
pub const CELL_SIZE: f32 = 2.0;

pub struct SpatialHash {
    side: usize,
    cells: Vec<u32>,
}

/// Cell coordinate of a world coordinate (may be out of range).
#[inline]
pub fn cell_coord(v: f32) -> i32 {
    (v / CELL_SIZE).floor() as i32
}

impl SpatialHash {
    pub fn new(side: usize) -> Self {
        Self {
            side,
            cells: vec![EMPTY_CELL; side * side],
        }
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn in_bounds(&self, gx: i32, gy: i32) -> bool {
        gx >= 0 && gy >= 0 && (gx as usize) < self.side && (gy as usize) < self.side
    }

    /// Particle stored in cell `(gx, gy)`; `None` for empty or out-of-range cells.
    #[inline]
    pub fn get(&self, gx: i32, gy: i32) -> Option<usize> {
        if !self.in_bounds(gx, gy) {
            return None;
        }
        let slot = *fast!(self.cells, [gy as usize * self.side + gx as usize]);
        if slot == EMPTY_CELL {
            None
        } else {
            Some(slot as usize)
        }
    }

    /// Rebuild from scratch.
    ///
    /// Slots are written in ascending order, so when several alive particles
    /// share a cell the highest index wins. Dead slots and particles outside
    /// the grid are not indexed.
    pub fn rebuild(&mut self, store: &ParticleStore) {
        self.cells.fill(EMPTY_CELL);
        for idx in 0..store.capacity() {
            if !store.is_alive(idx) {
                continue;
            }
            let (x, y) = store.pos(idx);
            let gx = cell_coord(x);
            let gy = cell_coord(y);
            if self.in_bounds(gx, gy) {
                self.cells[gy as usize * self.side + gx as usize] = idx as u32;
            }
        }
    }

    /// Visit every indexed particle in the `(2 * window + 1)^2` block around
    /// `(gx, gy)`, row by row.
    #[inline]
    pub fn for_each_in_window<F: FnMut(usize)>(&self, gx: i32, gy: i32, window: i32, mut f: F) {
        let y0 = gy.saturating_sub(window).max(0);
        let y1 = gy.saturating_add(window).min(self.side as i32 - 1);
        let x0 = gx.saturating_sub(window).max(0);
        let x1 = gx.saturating_add(window).min(self.side as i32 - 1);
        if x0 > x1 || y0 > y1 {
            return;
        }
        for y in y0..=y1 {
            let row = y as usize * self.side;
            for x in x0..=x1 {
                let slot = *fast!(self.cells, [row + x as usize]);
                if slot != EMPTY_CELL {
                    f(slot as usize);
                }
            }
        }
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|&&c| c != EMPTY_CELL).count()
    }

    pub fn clear(&mut self) {
        self.cells.fill(EMPTY_CELL);
    }
}
