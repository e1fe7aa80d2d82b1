//! Version parsing, ordering, and constraint evaluation.
//!
//! # Version Schemes
//!
//! - **SemVer**: Semantic Versioning 2.0 (`1.2.3`, `1.0.0-alpha`), a leading
//!   `v` is tolerated (`v1.2.3`).
//! - **Raw**: anything else (`nightly`, `system`, `8u392`). Raw versions are
//!   opaque strings: they never satisfy a semver constraint and only
//!   participate in "latest" selection when no semver candidate exists.
//!
//! The original string form is preserved in both cases; it is what storage
//! directories and config files carry.

pub use self::constraint::Constraint;
pub use self::version::{Version, latest};

mod constraint;
mod version;
