//! Shared helpers used across the workspace: logging setup, filesystem
//! sanity checks and composite cache keys.

pub mod env;
pub mod keys;
pub mod utils;
