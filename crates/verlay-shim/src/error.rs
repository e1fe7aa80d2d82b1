//! Error types for shim operations.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShimError {
    /// The path a link should occupy holds something that is not a symlink.
    /// Fatal for this one link; a broader rehash carries on around it.
    #[error("shim path '{0}' is occupied by a non-symlink")]
    LinkConflict(PathBuf),

    #[error("shim operation failed at '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ShimError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ShimError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShimError>;
