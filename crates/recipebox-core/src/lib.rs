//! recipebox core library
//!
//! This crate provides the storage core for recipebox, a personal recipe
//! collection kept on local storage.
//!
//! # Architecture
//!
//! - **Storage**: a key-value primitive holding one string per key
//! - **Store**: the recipe collection serialized as one JSON array under a
//!   single key; every change is a whole-collection read-modify-write
//!
//! # Quick Start
//!
//! ```text
//! let store = RecipeStore::open().await?;
//!
//! // Add a recipe
//! let mut soup = Recipe::new("Soup", "Starter");
//! soup.set_ingredients("leeks, potatoes");
//! store.add(soup).await?;
//!
//! // Query recipes
//! let recipes = store.load_all().await?;
//! let soup = store.find_by_key("Soup").await?;
//! ```
//!
//! # Modules
//!
//! - `store`: The recipe store (main entry point)
//! - `models`: Recipe record and edit types
//! - `codec`: Collection payload encoding
//! - `search`: Ranked recipe search
//! - `events`: Change notifications
//! - `storage`: Key-value backends
//! - `config`: Application configuration

pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod search;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use events::{EventReceiver, StoreEvent};
pub use models::{CategoryCount, Recipe, RecipeEdit};
pub use search::SearchHit;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use store::{RecipeStore, StoreStats};
