//! Resolution results.

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

/// The precedence tier that actually produced a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Env,
    Project,
    Global,
    Latest,
    Manual,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Env => "env",
            Source::Project => "project",
            Source::Global => "global",
            Source::Latest => "latest",
            Source::Manual => "manual",
        })
    }
}

/// One answer to "which version of `tool` runs here".
///
/// Immutable once created; re-resolution supersedes rather than mutates.
#[derive(Debug, Clone)]
pub struct VersionResolution {
    pub tool: String,
    /// The raw string the winning tier supplied, absent for `latest`.
    pub requested: Option<String>,
    pub version: String,
    pub source: Source,
    /// Directory whose project config decided the version, if any.
    pub project_path: Option<PathBuf>,
    /// File the version string came from, if any.
    pub config_path: Option<PathBuf>,
    pub installed: bool,
    pub resolved_at: SystemTime,
}
