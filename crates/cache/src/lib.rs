//! In-memory time-to-live caches.
//!
//! - [`TtlCache`] maps keys to values, populating misses through a [`Loader`]
//!   and evicting stale entries from a background sweep task.
//! - [`ArrayTtlCache`] reuses the same engine with list-valued slots.
//!
//! Both must be built inside a tokio runtime since the sweep runs as a task.

pub mod array_cache;
pub mod builder;
pub mod entry;
pub mod errors;
pub mod hooks;
pub mod ttl_cache;

pub use array_cache::ArrayTtlCache;
pub use builder::CacheBuilder;
pub use errors::CacheError;
pub use hooks::{DefaultLoader, EvictHook, Loader, NoopEvict};
pub use ttl_cache::{TtlCache, SWEEP_DIVISOR};
