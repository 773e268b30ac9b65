//! Service layer: file-backed state shared by long-running processes.
//! - `storage::LockedJsonStore` mirrors one JSON file in memory, guards
//!   read-modify-write cycles with an advisory lock and debounces writes.

pub mod errors;
pub mod storage;

pub use errors::StoreError;
pub use storage::{LockedJsonStore, StoreOptions};
