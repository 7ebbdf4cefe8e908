//! Spatial layer: particle pool, neighbor hash, and air heat map.

pub mod hash;
pub mod heat_map;
pub mod store;

pub use hash::{cell_coord, SpatialHash, CELL_SIZE, EMPTY_CELL};
pub use heat_map::AirHeatMap;
pub use store::{
    LoadFit, ParticleStore, ATTR_STRIDE, A_HEAT, A_LIFE, A_RADIUS, A_TYPE, A_VISC,
    PLACEHOLDER_LIFE, POS_STRIDE,
};
