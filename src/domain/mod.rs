//! Domain model: particle types, per-type tables and tuning.

pub mod config;
pub mod particle_type;

pub use config::{AirConfig, EmitConfig, ForceConfig, HeatConfig, QueryConfig, SimConfig};
pub use particle_type::{
    ParticleType, TypeDefaults, TypeMask, DEFAULT_TYPE_TABLE, TYPE_COUNT, TY_BIO, TY_FIRE,
    TY_LAVA, TY_SOLID, TY_WATER,
};
