//! Symlink dispatch table for installed tool versions.
//!
//! # Architecture
//!
//! The shim directory is the on-disk dispatch table: `<shim>/<tool>` and
//! `<shim>/<tool>-<version>` point at the version-specific binary chosen by
//! resolution. This crate splits the problem in two:
//!
//! - [`plan_links`]: a pure function from `(tool, version, binary)` to the
//!   desired link set. No filesystem access, trivially testable.
//! - The reconciliation operations in [`manager`]: diff desired against
//!   actual and apply minimal filesystem changes, idempotently, so the table
//!   converges even after interrupted runs.
//!
//! Mechanism, not policy: which version a link should target is decided by
//! the resolver, never here.

pub use self::error::{Result, ShimError};
pub use self::manager::{
    cleanup_broken_symlinks, create_tool_symlinks, list_symlinks, remove_tool_symlinks,
    validate_symlinks,
};
pub use self::plan::{LinkSpec, plan_links};

mod error;
mod manager;
mod plan;
