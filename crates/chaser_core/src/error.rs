use thiserror::Error;

/// Errors surfaced by the core's configuration and snapshot layer.
///
/// Per-turn ingestion never fails: missing or malformed perception input is
/// treated as "no new information" and at most logged, so the belief state
/// stays usable on the next turn.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid map dimensions: {width}x{height}")]
    InvalidDims { width: i32, height: i32 },
}

pub type Result<T> = std::result::Result<T, CoreError>;
