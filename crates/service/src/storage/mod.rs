//! Storage abstractions for service layer
//!
//! Contains file-backed stores that persist small JSON documents without a
//! database.

pub mod locked_json_store;

pub use locked_json_store::{LockedJsonStore, StoreOptions};
