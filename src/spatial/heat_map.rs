//! Air heat map - ambient heat on the same 2x2-unit lattice as the hash.
//!
//! Double-buffered: the diffusion pass reads `values` and writes `next`,
//! then the two are swapped.

pub struct AirHeatMap {
    side: usize,
    pub(crate) values: Vec<f32>,
    pub(crate) next: Vec<f32>,
}

impl AirHeatMap {
    pub fn new(side: usize) -> Self {
        Self {
            side,
            values: vec![0.0; side * side],
            next: vec![0.0; side * side],
        }
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Heat of cell `(gx, gy)`; cells outside the map read as 0.
    #[inline]
    pub fn get(&self, gx: i32, gy: i32) -> f32 {
        if gx < 0 || gy < 0 || gx as usize >= self.side || gy as usize >= self.side {
            return 0.0;
        }
        *fast!(self.values, [gy as usize * self.side + gx as usize])
    }

    #[inline]
    pub fn set(&mut self, gx: usize, gy: usize, value: f32) {
        if gx < self.side && gy < self.side {
            self.values[gy * self.side + gx] = value;
        }
    }

    /// Hottest cell in the `(2 * window + 1)^2` block around `(gx, gy)`.
    /// Returns 0 when the block lies entirely outside the map.
    pub fn max_in_window(&self, gx: i32, gy: i32, window: i32) -> f32 {
        let mut best = f32::NEG_INFINITY;
        let y0 = gy.saturating_sub(window).max(0);
        let y1 = gy.saturating_add(window).min(self.side as i32 - 1);
        let x0 = gx.saturating_sub(window).max(0);
        let x1 = gx.saturating_add(window).min(self.side as i32 - 1);
        for y in y0..=y1 {
            let row = y as usize * self.side;
            for x in x0..=x1 {
                best = best.max(*fast!(self.values, [row + x as usize]));
            }
        }
        if best == f32::NEG_INFINITY {
            0.0
        } else {
            best
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Publish the freshly written buffer.
    #[inline]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.values, &mut self.next);
    }

    pub fn reset(&mut self) {
        self.values.fill(0.0);
        self.next.fill(0.0);
    }
}
