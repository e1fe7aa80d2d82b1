//! Bounded in-process caching.
//!
//! # Architecture
//!
//! Two layers, used together by the version resolver:
//!
//! - [`Cache`]: the bounded store. TTL expiry is lazy (an expired entry is
//!   dropped, and counted a miss, only when a read discovers it) and eviction
//!   is LRU by last access time.
//! - [`FastCache`]: a thin overwrite-only map with no TTL, sitting in front
//!   of a [`Cache`] to short-circuit repeated lookups within one process.
//!
//! Neither layer ever surfaces an error; a miss is a valid outcome.

pub use self::fast::FastCache;
pub use self::store::{Cache, CacheStats};

mod fast;
mod store;
