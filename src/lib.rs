//! Lavaflow Engine - particle fluids for the Lavaflow platformer, in WASM
//!
//! A fixed pool of water, lava, rock, fire and bio particles that push on
//! each other, trade heat, freeze, spread and burn out. Runs natively (tests,
//! tools) and in the browser through `wasm-bindgen`.
//!
//! Architecture:
//! - core/        - bounds-check macro, errors, RNG
//! - domain/      - particle types and tuning config
//! - spatial/     - particle pool, spatial hash, air heat map
//! - systems/     - per-stage kernels and queries
//! - simulation/  - owned context, tick pipeline, JS facade

// Macros first so every module below can use `fast!`
#[macro_use]
pub mod core;
pub mod domain;
pub mod spatial;
pub mod systems;
pub mod simulation;

use wasm_bindgen::prelude::*;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

// Thread pool for the rayon stages on wasm
#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
pub use wasm_bindgen_rayon::init_thread_pool;

// Better error messages in debug mode
#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Initialize the engine: panic hook and browser console logging.
#[wasm_bindgen]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    #[cfg(target_arch = "wasm32")]
    {
        // A second init() finds the logger already set
        let _ = console_log::init_with_level(log::Level::Info);
        web_sys::console::log_1(&"Lavaflow particle engine initialized".into());
    }

    log::info!("lavaflow-engine {} ready", env!("CARGO_PKG_VERSION"));
}

/// Get engine version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Re-export main types
pub use crate::core::{SimError, SimResult};
pub use domain::{ParticleType, SimConfig, TypeMask};
pub use simulation::{ParticleSnapshot, PerfStats, Simulation, SimulationCore};
pub use systems::{NearestParticle, SoundField, SoundSample};

// Particle type ids for JS
#[wasm_bindgen]
pub fn ty_water() -> u8 { domain::TY_WATER }
#[wasm_bindgen]
pub fn ty_lava() -> u8 { domain::TY_LAVA }
#[wasm_bindgen]
pub fn ty_solid() -> u8 { domain::TY_SOLID }
#[wasm_bindgen]
pub fn ty_fire() -> u8 { domain::TY_FIRE }
#[wasm_bindgen]
pub fn ty_bio() -> u8 { domain::TY_BIO }
