//! filecache - file-backed cache engine
//!
//! Persists opaque payloads under identifiers with expiry, tag-based
//! invalidation and a frozen read-optimized mode.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;

pub use cache::{BackendOptions, FileBackend, SerializationFormat};
pub use error::{CacheError, CacheResult};
