//! Per-stage kernels. Every stage reads committed buffers and writes a
//! separate output, so the rayon and serial builds agree bit for bit.

pub mod air_heat;
pub mod attributes;
pub mod position;
pub mod queries;
pub mod velocity;

pub use attributes::AttributePass;
pub use queries::{count_type_near, nearest_particle, sample_sound_field, NearestParticle, SoundField, SoundSample};
pub use velocity::VelocityPass;
