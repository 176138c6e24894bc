use std::io;

use thiserror::Error;

pub type CResult<T> = Result<T, CoreError>;

/// Errors shared by every crate in the workspace. Protocol and SQL layers
/// define their own richer kinds and convert at the boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    IoError(#[from] io::Error),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("spill file error: {0}")]
    SpillError(String),
}
