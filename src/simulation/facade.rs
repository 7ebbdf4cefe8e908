use wasm_bindgen::prelude::*;

use crate::core::SimError;
use crate::domain::{ParticleType, TypeMask};

use super::perf_stats::PerfStats;
use super::SimulationCore;

fn js_err(err: SimError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn particle_type(id: u8) -> Result<ParticleType, JsValue> {
    ParticleType::try_from(id).map_err(js_err)
}

/// Where the renderer finds the particle buffers in wasm memory.
#[wasm_bindgen]
pub struct BufferLayout {
    position_ptr: u32,
    position_len: u32,
    velocity_ptr: u32,
    velocity_len: u32,
    attributes_ptr: u32,
    attributes_len: u32,
    heat_map_ptr: u32,
    heat_map_len: u32,
}

#[wasm_bindgen]
impl BufferLayout {
    #[wasm_bindgen(getter)]
    pub fn position_ptr(&self) -> u32 { self.position_ptr }
    #[wasm_bindgen(getter)]
    pub fn position_len(&self) -> u32 { self.position_len }
    #[wasm_bindgen(getter)]
    pub fn velocity_ptr(&self) -> u32 { self.velocity_ptr }
    #[wasm_bindgen(getter)]
    pub fn velocity_len(&self) -> u32 { self.velocity_len }
    #[wasm_bindgen(getter)]
    pub fn attributes_ptr(&self) -> u32 { self.attributes_ptr }
    #[wasm_bindgen(getter)]
    pub fn attributes_len(&self) -> u32 { self.attributes_len }
    #[wasm_bindgen(getter)]
    pub fn heat_map_ptr(&self) -> u32 { self.heat_map_ptr }
    #[wasm_bindgen(getter)]
    pub fn heat_map_len(&self) -> u32 { self.heat_map_len }
}

/// JS handle to one level's particle simulation.
///
/// Query methods return `-1` sentinels (or an empty array) when nothing is
/// found instead of throwing.
#[wasm_bindgen]
pub struct Simulation {
    core: SimulationCore,
}

#[wasm_bindgen]
impl Simulation {
    /// Default configuration: 8192 slots in a 1024-unit world.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            core: SimulationCore::new(),
        }
    }

    /// Build from a (partial) JSON `SimConfig`.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(json: String) -> Result<Simulation, JsValue> {
        let core = SimulationCore::from_config_json(&json).map_err(js_err)?;
        Ok(Self { core })
    }

    /// Effective configuration as JSON.
    pub fn config_json(&self) -> String {
        self.core.config().to_json()
    }

    #[wasm_bindgen(getter)]
    pub fn capacity(&self) -> u32 { self.core.capacity() as u32 }

    #[wasm_bindgen(getter)]
    pub fn world_size(&self) -> f32 { self.core.world_size() }

    #[wasm_bindgen(getter)]
    pub fn frame(&self) -> u64 { self.core.frame() }

    #[wasm_bindgen(getter)]
    pub fn alive_count(&self) -> u32 { self.core.alive_count() as u32 }

    /// Alive particles per type id.
    pub fn count_by_type(&self) -> Vec<u32> {
        self.core.count_by_type().to_vec()
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.core.set_seed(seed);
    }

    /// Enable or disable per-tick perf metrics (adds timing overhead when enabled)
    pub fn enable_perf_metrics(&mut self, enabled: bool) {
        self.core.enable_perf_metrics(enabled);
    }

    /// Last tick perf snapshot (zeros when perf disabled)
    pub fn get_perf_stats(&self) -> PerfStats {
        self.core.get_perf_stats()
    }

    // === Matter ===

    /// Place one particle at an exact point. Returns the slot, or -1 when the
    /// pool is full.
    pub fn allocate(&mut self, x: f32, y: f32, ty: u8, heat: f32, downward: bool) -> Result<i32, JsValue> {
        let ty = particle_type(ty)?;
        Ok(self
            .core
            .allocate(x, y, ty, heat, downward)
            .map_or(-1, |idx| idx as i32))
    }

    /// Emit with the placement protocol of the type. Returns particles created.
    pub fn emit(&mut self, x: f32, y: f32, radius: f32, ty: u8, heat: f32, downward: bool) -> Result<u32, JsValue> {
        let ty = particle_type(ty)?;
        Ok(self.core.emit(x, y, radius, ty, heat, downward) as u32)
    }

    pub fn emit_pipe(&mut self, x: f32, y: f32, r: f32, ty: u8) -> Result<u32, JsValue> {
        let ty = particle_type(ty)?;
        Ok(self.core.emit_pipe(x, y, r, ty) as u32)
    }

    /// Clear one type in a radius. Returns particles removed.
    pub fn delete(&mut self, x: f32, y: f32, radius: f32, ty: u8) -> Result<u32, JsValue> {
        let ty = particle_type(ty)?;
        Ok(self.core.delete(x, y, radius, ty) as u32)
    }

    /// Clear every type whose bit is set in `mask` (bit n = type id n).
    pub fn clear_in_radius(&mut self, x: f32, y: f32, radius: f32, mask: u8) -> u32 {
        self.core
            .clear_in_radius(x, y, radius, TypeMask::from_bits(mask)) as u32
    }

    pub fn free(&mut self, index: u32) {
        self.core.free(index as usize);
    }

    pub fn reset(&mut self) {
        self.core.reset();
    }

    // === Stepping ===

    pub fn tick(&mut self, dt: f32, player_x: f32, player_y: f32) {
        self.core.tick(dt, player_x, player_y);
    }

    // === Queries ===

    /// `[x, y, type, heat, radius, vx, vy, distance]` of the nearest solid
    /// contact, or all `-1` when nothing is in range.
    pub fn query_nearest(&mut self, x: f32, y: f32) -> Vec<f32> {
        match self.core.nearest(x, y) {
            Some(hit) => vec![
                hit.x,
                hit.y,
                hit.ty.to_lane(),
                hit.heat,
                hit.radius,
                hit.vx,
                hit.vy,
                hit.distance,
            ],
            None => vec![-1.0; 8],
        }
    }

    pub fn query_count_in_radius(&self, x: f32, y: f32, radius: f32, ty: u8) -> Result<u32, JsValue> {
        let ty = particle_type(ty)?;
        Ok(self.core.count_type_near(x, y, radius, ty) as u32)
    }

    /// Flat `[density, speed, dominantType]` per audio lattice point. May
    /// return the previous sample.
    pub fn query_sample(&mut self, x: f32, y: f32) -> Vec<f32> {
        self.core.sample_sound(x, y).to_flat()
    }

    // === Save / load ===

    pub fn serialize_positions(&self) -> Vec<f32> {
        self.core.store().position.clone()
    }

    pub fn serialize_velocities(&self) -> Vec<f32> {
        self.core.store().velocity.clone()
    }

    pub fn serialize_attributes(&self) -> Vec<f32> {
        self.core.store().attributes.clone()
    }

    /// Load buffers; short ones are zero-padded. Returns the padded lane count.
    pub fn deserialize(&mut self, position: Vec<f32>, velocity: Vec<f32>, attributes: Vec<f32>) -> u32 {
        self.core.deserialize(&position, &velocity, &attributes).padded as u32
    }

    /// Level-file JSON `{ prtPos, prtVel, prtAttr }`.
    pub fn to_json(&self) -> Result<String, JsValue> {
        self.core.to_json().map_err(js_err)
    }

    pub fn load_json(&mut self, json: String) -> Result<(), JsValue> {
        self.core.load_json(&json).map_err(js_err)?;
        Ok(())
    }

    // === Renderer access ===

    pub fn buffer_layout(&self) -> BufferLayout {
        let store = self.core.store();
        BufferLayout {
            position_ptr: self.core.position_ptr() as u32,
            position_len: store.position.len() as u32,
            velocity_ptr: self.core.velocity_ptr() as u32,
            velocity_len: store.velocity.len() as u32,
            attributes_ptr: self.core.attributes_ptr() as u32,
            attributes_len: store.attributes.len() as u32,
            heat_map_ptr: self.core.heat_map_ptr() as u32,
            heat_map_len: self.core.heat_map_len() as u32,
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    pub fn core(&self) -> &SimulationCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut SimulationCore {
        &mut self.core
    }
}
