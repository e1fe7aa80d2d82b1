//! Command routing and execution.
//!
//! # Architecture
//!
//! [`Router::route`] turns `(tool, args)` into a fully-specified invocation:
//! the resolver picks the version, the executable is located strictly inside
//! that version's install directory (never on PATH, which would defeat
//! pinning), and the child environment is layered on top of the ambient one.
//! [`Router::execute`] runs it with the caller's stdio and propagates the
//! exit code; a child failing is the child's business, only failure to spawn
//! is a router error.
//!
//! Per-tool usage statistics live in the process-scoped [`CommandRegistry`];
//! they are best-effort bookkeeping, updated after every attempt.

pub use self::cancel::CancellationToken;
pub use self::error::RouterError;
pub use self::registry::{CommandInfo, CommandRegistry};
pub use self::route::{RouteResult, Router, locate_executable};

mod cancel;
mod error;
mod exec;
mod registry;
mod route;
