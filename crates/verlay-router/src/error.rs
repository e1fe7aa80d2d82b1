//! Error types for routing and execution.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use verlay_resolver::ResolveError;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("{tool}@{version} is not installed; run `verlay install {tool} {version}`")]
    NotInstalled { tool: String, version: String },

    /// The install directory exists but holds no runnable binary.
    #[error("no '{tool}' executable under '{dir}'")]
    ExecutableNotFound { tool: String, dir: PathBuf },

    #[error("'{path}' exists but is not executable")]
    NotExecutable { path: PathBuf },

    #[error("failed to spawn '{tool}'")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting on '{tool}'")]
    Wait {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("execution of '{tool}' was cancelled")]
    Cancelled { tool: String },

    #[error("'{path}' is not a valid executable for command '{name}'")]
    InvalidExecutable { name: String, path: PathBuf },

    #[error("command '{0}' is not registered")]
    UnknownCommand(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
