//! Simulation - owned particle context and its per-frame pipeline
//!
//! `SimulationCore` owns the particle pool, the spatial hash and the air heat
//! map for the currently loaded level. Everything that mutates them goes
//! through its methods; the stages themselves live in `systems/`.
//!
//! Tick order:
//! hash (if dirty) -> velocities -> attributes -> positions -> air heat -> hash

use crate::core::random;
use crate::core::SimResult;
use crate::domain::{ParticleType, SimConfig, TypeMask};
use crate::spatial::{AirHeatMap, LoadFit, ParticleStore, SpatialHash};
use crate::systems::{NearestParticle, SoundField};

#[path = "perf/perf_timer.rs"]
mod perf_timer;
#[path = "perf/perf_stats.rs"]
mod perf_stats;
#[path = "step/step.rs"]
mod step;
#[path = "commands/commands.rs"]
mod commands;
#[path = "persistence/persistence.rs"]
mod persistence;
#[path = "init/init.rs"]
mod init;
#[path = "init/settings.rs"]
mod settings;
mod facade;

pub use facade::{BufferLayout, Simulation};
pub use perf_stats::PerfStats;
pub use persistence::ParticleSnapshot;

use perf_timer::PerfTimer;

/// The simulation context for one loaded level.
pub struct SimulationCore {
    config: SimConfig,
    store: ParticleStore,
    hash: SpatialHash,
    heat_map: AirHeatMap,

    // Stage outputs, swapped with the committed buffers every tick
    velocity_out: Vec<f32>,
    attributes_out: Vec<f32>,

    /// Set by anything that changes the pool between ticks.
    hash_dirty: bool,
    frame: u64,
    rng_state: u32,

    /// Last allocation found the pool full.
    saturated: bool,
    alloc_failures: u32,

    /// Empty until the first audio sample.
    sound_cache: SoundField,

    // Perf metrics
    perf_enabled: bool,
    perf_stats: PerfStats,
}

impl Default for SimulationCore {
    fn default() -> Self {
        init::create_simulation_core(SimConfig::default())
    }
}

impl SimulationCore {
    /// Core with the default 8192-slot, 1024-unit configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(init::create_simulation_core(config))
    }

    pub fn from_config_json(json: &str) -> SimResult<Self> {
        let config = SimConfig::from_json(json)?;
        log::info!(
            "simulation config loaded: {} slots, world {}",
            config.capacity,
            config.world_size
        );
        Ok(init::create_simulation_core(config))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn world_size(&self) -> f32 {
        self.config.world_size
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn hash(&self) -> &SpatialHash {
        &self.hash
    }

    pub fn heat_map(&self) -> &AirHeatMap {
        &self.heat_map
    }

    pub fn alive_count(&self) -> usize {
        self.store.alive_count()
    }

    pub fn count_by_type(&self) -> [u32; 5] {
        self.store.count_by_type()
    }

    // === Settings ===

    pub fn set_seed(&mut self, seed: u32) {
        settings::set_seed(self, seed);
    }

    /// Enable or disable per-tick perf metrics (adds timing overhead when enabled)
    pub fn enable_perf_metrics(&mut self, enabled: bool) {
        settings::enable_perf_metrics(self, enabled);
    }

    /// Last tick perf snapshot (zeros when perf disabled)
    pub fn get_perf_stats(&self) -> PerfStats {
        settings::get_perf_stats(self)
    }

    // === Mutation between ticks ===

    /// Place one particle exactly at `(x, y)`. `None` when the pool is full.
    pub fn allocate(
        &mut self,
        x: f32,
        y: f32,
        ty: ParticleType,
        heat: f32,
        downward: bool,
    ) -> Option<usize> {
        commands::allocate(self, x, y, ty, heat, downward)
    }

    pub fn free(&mut self, index: usize) {
        commands::free(self, index)
    }

    /// Turn alive particles of `mask` within `radius` into dead rock fragments.
    pub fn clear_in_radius(&mut self, x: f32, y: f32, radius: f32, mask: TypeMask) -> usize {
        commands::clear_in_radius(self, x, y, radius, mask)
    }

    /// Emit matter with the placement protocol of its type. Returns the number
    /// of particles created.
    pub fn emit(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        ty: ParticleType,
        heat: f32,
        downward: bool,
    ) -> usize {
        commands::emit(self, x, y, radius, ty, heat, downward)
    }

    /// One frame of a pipe of radius `r` centred on `(x, y)`.
    pub fn emit_pipe(&mut self, x: f32, y: f32, r: f32, ty: ParticleType) -> usize {
        commands::emit_pipe(self, x, y, r, ty)
    }

    /// Remove one type of matter in a radius (bombs, fireballs, eraser).
    pub fn delete(&mut self, x: f32, y: f32, radius: f32, ty: ParticleType) -> usize {
        commands::clear_in_radius(self, x, y, radius, TypeMask::only(ty))
    }

    /// Free every slot and cool the air.
    pub fn reset(&mut self) {
        commands::reset(self)
    }

    // === Stepping ===

    /// Advance one frame.
    pub fn tick(&mut self, dt: f32, player_x: f32, player_y: f32) {
        step::tick(self, dt, player_x, player_y);
    }

    /// Rebuild the hash if the pool changed since the last build.
    pub fn commit(&mut self) {
        if self.hash_dirty {
            self.hash.rebuild(&self.store);
            self.hash_dirty = false;
        }
    }

    // === Queries ===

    pub fn nearest(&mut self, x: f32, y: f32) -> Option<NearestParticle> {
        self.commit();
        crate::systems::nearest_particle(&self.store, &self.hash, &self.config.queries, x, y)
    }

    pub fn count_type_near(&self, x: f32, y: f32, radius: f32, ty: ParticleType) -> usize {
        crate::systems::count_type_near(&self.store, x, y, radius, ty)
    }

    /// Audio lattice around a focus point. Refreshed on the first call and
    /// then with probability `soundRefreshChance`; otherwise the last field is
    /// returned as is.
    pub fn sample_sound(&mut self, x: f32, y: f32) -> &SoundField {
        let refresh = self.sound_cache.is_empty()
            || random::next_unit(&mut self.rng_state) < self.config.queries.sound_refresh_chance;
        if refresh {
            self.sample_sound_now(x, y);
        }
        &self.sound_cache
    }

    /// Fresh audio lattice, also stored as the cached field.
    pub fn sample_sound_now(&mut self, x: f32, y: f32) -> SoundField {
        self.commit();
        let field =
            crate::systems::sample_sound_field(&self.store, &self.hash, &self.config.queries, x, y);
        self.sound_cache = field.clone();
        field
    }

    // === Save / load ===

    /// Copies of the `2N` position, `2N` velocity and `5N` attribute buffers.
    pub fn serialize(&self) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        self.store.to_flat()
    }

    /// Load flat buffers; short ones are zero-padded, long ones truncated.
    pub fn deserialize(&mut self, position: &[f32], velocity: &[f32], attributes: &[f32]) -> LoadFit {
        persistence::load_flat(self, position, velocity, attributes)
    }

    pub fn snapshot(&self) -> ParticleSnapshot {
        persistence::snapshot(self)
    }

    pub fn load_snapshot(&mut self, snapshot: &ParticleSnapshot) -> LoadFit {
        persistence::load_flat(self, &snapshot.prt_pos, &snapshot.prt_vel, &snapshot.prt_attr)
    }

    pub fn to_json(&self) -> SimResult<String> {
        persistence::to_json(self)
    }

    pub fn load_json(&mut self, json: &str) -> SimResult<LoadFit> {
        persistence::load_json(self, json)
    }

    // === Zero-copy views for the renderer ===

    pub fn position_ptr(&self) -> *const f32 {
        self.store.position.as_ptr()
    }

    pub fn velocity_ptr(&self) -> *const f32 {
        self.store.velocity.as_ptr()
    }

    pub fn attributes_ptr(&self) -> *const f32 {
        self.store.attributes.as_ptr()
    }

    pub fn heat_map_ptr(&self) -> *const f32 {
        self.heat_map.as_slice().as_ptr()
    }

    pub fn heat_map_len(&self) -> usize {
        self.heat_map.as_slice().len()
    }
}

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;
