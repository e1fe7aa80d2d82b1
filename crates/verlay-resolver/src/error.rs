//! Error types for version resolution.

use thiserror::Error;
use verlay_core::ConfigError;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// A tier named a concrete version that is absent from storage. Never
    /// silently substituted; the message carries the remediation command.
    #[error("{tool}@{version} is not installed; run `verlay install {tool} {version}`")]
    NotInstalled { tool: String, version: String },

    /// No tier names the tool and nothing is installed to fall back on.
    #[error("no version of '{tool}' is configured and none are installed")]
    Unresolvable { tool: String },

    /// A configured version string matched no resolution strategy: not an
    /// installed literal, not a known alias, and no installed version
    /// satisfies it as a constraint.
    #[error("version spec '{spec}' for '{tool}' matched no installed version")]
    InvalidVersionSpec { tool: String, spec: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ResolveError {
    pub fn not_installed(tool: &str, version: &str) -> Self {
        ResolveError::NotInstalled {
            tool: tool.to_string(),
            version: version.to_string(),
        }
    }
}
