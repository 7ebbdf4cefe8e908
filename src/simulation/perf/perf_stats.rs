use wasm_bindgen::prelude::*;

/// Timings and counters of the last tick.
#[wasm_bindgen]
#[derive(Clone, Debug, Default)]
pub struct PerfStats {
    pub(super) tick_ms: f64,
    pub(super) hash_ms: f64,
    pub(super) velocity_ms: f64,
    pub(super) attributes_ms: f64,
    pub(super) position_ms: f64,
    pub(super) air_heat_ms: f64,
    pub(super) alive_count: u32,
    /// Alive particles whose type changed during the tick.
    pub(super) phase_changes: u32,
    /// Particles that died during the tick.
    pub(super) deaths: u32,
    /// Allocations refused since the previous tick.
    pub(super) allocation_failures: u32,
    pub(super) capacity: u32,
    pub(super) occupied_cells: u32,
}

impl PerfStats {
    pub(crate) fn reset(&mut self) {
        *self = PerfStats::default();
    }
}

#[wasm_bindgen]
impl PerfStats {
    #[wasm_bindgen(getter)]
    pub fn tick_ms(&self) -> f64 { self.tick_ms }
    #[wasm_bindgen(getter)]
    pub fn hash_ms(&self) -> f64 { self.hash_ms }
    #[wasm_bindgen(getter)]
    pub fn velocity_ms(&self) -> f64 { self.velocity_ms }
    #[wasm_bindgen(getter)]
    pub fn attributes_ms(&self) -> f64 { self.attributes_ms }
    #[wasm_bindgen(getter)]
    pub fn position_ms(&self) -> f64 { self.position_ms }
    #[wasm_bindgen(getter)]
    pub fn air_heat_ms(&self) -> f64 { self.air_heat_ms }
    #[wasm_bindgen(getter)]
    pub fn alive_count(&self) -> u32 { self.alive_count }
    #[wasm_bindgen(getter)]
    pub fn phase_changes(&self) -> u32 { self.phase_changes }
    #[wasm_bindgen(getter)]
    pub fn deaths(&self) -> u32 { self.deaths }
    #[wasm_bindgen(getter)]
    pub fn allocation_failures(&self) -> u32 { self.allocation_failures }
    #[wasm_bindgen(getter)]
    pub fn capacity(&self) -> u32 { self.capacity }
    #[wasm_bindgen(getter)]
    pub fn occupied_cells(&self) -> u32 { self.occupied_cells }
}
