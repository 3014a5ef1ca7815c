//! Storage layer
//!
//! A minimal key-value primitive: one opaque string value per key, read and
//! replaced as a whole. The recipe store keeps its entire collection under a
//! single key on top of this.
//!
//! ## Backends
//!
//! - **FileStorage**: one JSON file per key, atomic replace on write
//! - **MemoryStorage**: process-local map with failure injection, for tests

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;

pub use backend::KeyValueStorage;
pub use error::{StorageError, StorageResult};
pub use file::{validate_key, FileStorage};
pub use memory::MemoryStorage;
