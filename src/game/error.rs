use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the simulation core.
/// Per-tick failures are logged and the tick skipped; only construction errors are fatal.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid vehicle asset: {0}")]
    InvalidAsset(String),
    #[error("non-finite {what} after physics step")]
    NonFiniteState { what: &'static str },
    #[error("invalid frame time {0}s")]
    InvalidFrameTime(f32),
}
