use thiserror::Error;

/// Errors raised at the engine boundary (config, snapshots, raw ids from JS).
///
/// Simulation stages and queries never fail; they degrade to no-ops instead.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown particle type id: {0}")]
    UnknownParticleType(u8),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
