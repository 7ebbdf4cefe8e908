//! Core utilities shared by every stage.

#[macro_use]
pub mod utils {
    #[macro_use]
    pub mod safety;
}

pub mod error;
pub mod random;

pub use error::{SimError, SimResult};

/// Smallest distance/radius used as a divisor.
pub const MIN_DIST_EPS: f32 = 1e-4;
