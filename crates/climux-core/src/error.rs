//! Error types for climux.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClimuxError {
    #[error("Connection limit reached: max {0} concurrent peers")]
    AtCapacity(usize),

    #[error("Server is disabled by configuration")]
    Disabled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
