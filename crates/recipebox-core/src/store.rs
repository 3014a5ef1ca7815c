//! Recipe store
//!
//! The `RecipeStore` owns the recipe collection. It is the only component
//! that touches storage: the whole collection lives as one JSON array under
//! a single key, and every mutation is a full read-modify-write of that
//! value.
//!
//! ## Consistency
//!
//! - Mutations through one store handle are serialized by an internal lock,
//!   so two concurrent edits cannot overwrite each other. Writers in other
//!   processes are not coordinated; the last write wins.
//! - A payload that fails to parse is reported as [`StoreError::DecodeError`]
//!   and is never overwritten by a mutation.
//! - A failed write leaves the previous payload in place.
//!
//! ## Usage
//!
//! ```ignore
//! let store = RecipeStore::open().await?;
//!
//! let mut soup = Recipe::new("Soup", "Starter");
//! soup.set_ingredients("water, salt");
//! store.add(soup).await?;
//!
//! let soup = store.toggle_favorite("Soup").await?;
//! assert!(soup.is_favorite);
//! ```

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::codec::{self, Decoded};
use crate::config::{Config, DEFAULT_STORAGE_KEY};
use crate::error::{StoreError, StoreResult};
use crate::events::{EventBus, EventReceiver, StoreEvent};
use crate::models::{normalize_image, CategoryCount, Recipe, RecipeEdit};
use crate::search::{self, SearchHit};
use crate::storage::{FileStorage, KeyValueStorage, StorageError};

/// Snapshot of what the store holds, for status output
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// Backend name ("file", "memory")
    pub backend: String,
    /// Storage key holding the collection
    pub key: String,
    /// Number of recipes
    pub recipes: usize,
    /// Number of favorites
    pub favorites: usize,
    /// Number of distinct categories
    pub categories: usize,
    /// Size of the stored payload in bytes, if anything is stored
    pub payload_bytes: Option<u64>,
}

/// Persistent recipe collection behind a key-value storage backend
pub struct RecipeStore<S = FileStorage> {
    storage: S,
    key: String,
    reject_duplicate_titles: bool,
    write_lock: Mutex<()>,
    events: EventBus,
}

impl RecipeStore<FileStorage> {
    /// Open the file-backed store described by the default configuration
    pub async fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(&config).await
    }

    /// Open the file-backed store with a specific configuration
    ///
    /// Records written before ids existed are given one here, and the
    /// collection is rewritten once so those ids stay stable. A corrupt or
    /// unreadable payload does not prevent opening; it is reported by the
    /// first operation that reads it.
    pub async fn open_with_config(config: &Config) -> Result<Self> {
        let store = Self::new(FileStorage::from_config(config), &config.storage_key)
            .reject_duplicate_titles(config.reject_duplicate_titles);

        match store.backfill_ids().await {
            Ok(0) => {}
            Ok(count) => info!(count, "assigned ids to stored recipes"),
            Err(e @ StoreError::WriteFailed(_)) => {
                return Err(e).context("Failed to store backfilled recipe ids");
            }
            Err(e) => warn!(error = %e, "could not inspect stored recipes"),
        }

        Ok(store)
    }
}

impl<S: KeyValueStorage> RecipeStore<S> {
    /// Create a store over `storage`, keeping the collection under `key`
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            reject_duplicate_titles: false,
            write_lock: Mutex::new(()),
            events: EventBus::default(),
        }
    }

    /// Create a store over `storage` using the default `"recipes"` key
    pub fn with_storage(storage: S) -> Self {
        Self::new(storage, DEFAULT_STORAGE_KEY)
    }

    /// Refuse `add` and `update` when the title is already taken
    pub fn reject_duplicate_titles(mut self, reject: bool) -> Self {
        self.reject_duplicate_titles = reject;
        self
    }

    /// Storage key holding the collection
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Receive an event after every committed write
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    // ==================== Reads ====================

    /// Load the whole collection
    ///
    /// Nothing stored yet is an empty collection. A payload that cannot be
    /// parsed is a `DecodeError`, distinct from the empty case.
    pub async fn load_all(&self) -> StoreResult<Vec<Recipe>> {
        Ok(self.read().await?.recipes)
    }

    /// Load the whole collection, degrading any failure to empty
    ///
    /// For callers that only render; the failure is logged, not returned.
    pub async fn load_all_or_empty(&self) -> Vec<Recipe> {
        match self.load_all().await {
            Ok(recipes) => recipes,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to load recipes, showing none");
                Vec::new()
            }
        }
    }

    /// First recipe whose title equals `key`
    pub async fn find_by_key(&self, key: &str) -> StoreResult<Option<Recipe>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .find(|r| r.matches_title(key)))
    }

    /// Recipe with the given id
    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        Ok(self.load_all().await?.into_iter().find(|r| r.id == id))
    }

    /// Map a user-supplied key onto exactly one recipe
    ///
    /// Tried in order: full UUID, exact title, id prefix. A title or prefix
    /// shared by several recipes is an `AmbiguousKey` error.
    pub async fn resolve(&self, key: &str) -> StoreResult<Recipe> {
        let recipes = self.load_all().await?;

        if let Ok(id) = Uuid::parse_str(key) {
            if let Some(recipe) = recipes.iter().find(|r| r.id == id) {
                return Ok(recipe.clone());
            }
        }

        let by_title: Vec<&Recipe> = recipes.iter().filter(|r| r.matches_title(key)).collect();
        match by_title.len() {
            0 => {}
            1 => return Ok(by_title[0].clone()),
            count => {
                return Err(StoreError::AmbiguousKey {
                    key: key.to_string(),
                    count,
                })
            }
        }

        let prefix = key.to_ascii_lowercase();
        let by_prefix: Vec<&Recipe> = if prefix.is_empty() {
            Vec::new()
        } else {
            recipes
                .iter()
                .filter(|r| r.id.to_string().starts_with(&prefix))
                .collect()
        };
        match by_prefix.len() {
            0 => Err(StoreError::NotFound(key.to_string())),
            1 => Ok(by_prefix[0].clone()),
            count => Err(StoreError::AmbiguousKey {
                key: key.to_string(),
                count,
            }),
        }
    }

    /// Recipes matching `query`, best match first
    pub async fn search(&self, query: &str) -> StoreResult<Vec<SearchHit>> {
        let hits = search::search(self.load_all().await?, query);
        debug!(query, hits = hits.len(), "searched recipes");
        Ok(hits)
    }

    /// Recipes marked as favorite
    pub async fn favorites(&self) -> StoreResult<Vec<Recipe>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|r| r.is_favorite)
            .collect())
    }

    /// Recipes in `category`, compared case-insensitively
    pub async fn by_category(&self, category: &str) -> StoreResult<Vec<Recipe>> {
        let wanted = category.trim().to_lowercase();
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|r| r.category.trim().to_lowercase() == wanted)
            .collect())
    }

    /// Distinct categories with their recipe counts, sorted by name
    ///
    /// Categories differing only in case are merged under the first spelling
    /// seen.
    pub async fn categories(&self) -> StoreResult<Vec<CategoryCount>> {
        Ok(count_categories(&self.load_all().await?))
    }

    /// Number of stored recipes
    pub async fn count(&self) -> StoreResult<usize> {
        Ok(self.load_all().await?.len())
    }

    /// Summary of the stored collection
    pub async fn stats(&self) -> StoreResult<StoreStats> {
        let recipes = self.load_all().await?;
        let payload_bytes = self
            .storage
            .item_size(&self.key)
            .await
            .map_err(StoreError::StorageUnavailable)?;

        Ok(StoreStats {
            backend: self.storage.name().to_string(),
            key: self.key.clone(),
            recipes: recipes.len(),
            favorites: recipes.iter().filter(|r| r.is_favorite).count(),
            categories: count_categories(&recipes).len(),
            payload_bytes,
        })
    }

    // ==================== Writes ====================

    /// Replace the whole stored collection
    pub async fn save_all(&self, recipes: &[Recipe]) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write(recipes).await?;
        self.events.emit(StoreEvent::Replaced {
            count: recipes.len(),
        });
        Ok(())
    }

    /// Add a new recipe
    pub async fn add(&self, mut recipe: Recipe) -> StoreResult<Recipe> {
        recipe.title = recipe.title.trim().to_string();
        validate_title(&recipe.title)?;
        recipe.image = normalize_image(recipe.image.take());

        let reject_duplicates = self.reject_duplicate_titles;
        self.mutate(move |recipes| {
            if recipes.iter().any(|r| r.id == recipe.id) {
                return Err(StoreError::InvalidRecipe(format!(
                    "id {} is already in use",
                    recipe.id
                )));
            }
            if reject_duplicates {
                check_title_free(recipes, &recipe.title, None)?;
            }

            recipes.push(recipe.clone());
            Ok((StoreEvent::Added { id: recipe.id }, recipe))
        })
        .await
    }

    /// Apply an edit to the recipe with the given id
    pub async fn update(&self, id: Uuid, mut edit: RecipeEdit) -> StoreResult<Recipe> {
        if let Some(title) = edit.title.as_mut() {
            *title = title.trim().to_string();
            validate_title(title)?;
        }

        let reject_duplicates = self.reject_duplicate_titles;
        self.mutate(move |recipes| {
            if reject_duplicates {
                if let Some(title) = edit.title.as_deref() {
                    check_title_free(recipes, title, Some(id))?;
                }
            }

            let recipe = recipes
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            recipe.apply(edit);
            Ok((StoreEvent::Updated { id }, recipe.clone()))
        })
        .await
    }

    /// Flip the favorite flag on every recipe titled `key`
    ///
    /// Returns the first updated recipe.
    pub async fn toggle_favorite(&self, key: &str) -> StoreResult<Recipe> {
        self.toggle_where(key, |r| r.matches_title(key)).await
    }

    /// Flip the favorite flag on the recipe with the given id
    pub async fn toggle_favorite_by_id(&self, id: Uuid) -> StoreResult<Recipe> {
        self.toggle_where(&id.to_string(), |r| r.id == id).await
    }

    /// Remove every recipe titled `key`; returns how many were removed
    pub async fn delete_by_key(&self, key: &str) -> StoreResult<usize> {
        let removed = self.delete_where(key, |r| r.matches_title(key)).await?;
        Ok(removed.len())
    }

    /// Remove the recipe with the given id and return it
    pub async fn delete_by_id(&self, id: Uuid) -> StoreResult<Recipe> {
        let mut removed = self.delete_where(&id.to_string(), |r| r.id == id).await?;
        // Ids are unique after decoding, so exactly one record went
        Ok(removed.remove(0))
    }

    /// Give every stored record a stable id and timestamps
    ///
    /// Returns how many records were repaired; writes only if there were any.
    pub async fn backfill_ids(&self) -> StoreResult<usize> {
        let _guard = self.write_lock.lock().await;
        let Decoded {
            recipes,
            backfilled,
        } = self.read().await?;

        if backfilled > 0 {
            self.write(&recipes).await?;
            self.events.emit(StoreEvent::Replaced {
                count: recipes.len(),
            });
        }
        Ok(backfilled)
    }

    async fn toggle_where<F>(&self, key: &str, matches: F) -> StoreResult<Recipe>
    where
        F: Fn(&Recipe) -> bool + Send + Sync,
    {
        self.mutate(|recipes| {
            let mut ids = Vec::new();
            let mut first = None;

            for recipe in recipes.iter_mut().filter(|r| matches(&**r)) {
                recipe.toggle_favorite();
                ids.push(recipe.id);
                if first.is_none() {
                    first = Some(recipe.clone());
                }
            }

            let first = first.ok_or_else(|| StoreError::NotFound(key.to_string()))?;
            Ok((StoreEvent::FavoriteToggled { ids }, first))
        })
        .await
    }

    async fn delete_where<F>(&self, key: &str, matches: F) -> StoreResult<Vec<Recipe>>
    where
        F: Fn(&Recipe) -> bool + Send + Sync,
    {
        self.mutate(|recipes| {
            let (removed, kept): (Vec<Recipe>, Vec<Recipe>) =
                recipes.drain(..).partition(|r| matches(r));
            *recipes = kept;

            if removed.is_empty() {
                return Err(StoreError::NotFound(key.to_string()));
            }

            let ids = removed.iter().map(|r| r.id).collect();
            Ok((StoreEvent::Deleted { ids }, removed))
        })
        .await
    }

    /// Serialized read-modify-write of the whole collection
    ///
    /// `apply` edits the loaded collection in place. If it returns an error
    /// nothing is written.
    async fn mutate<T, F>(&self, apply: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Vec<Recipe>) -> StoreResult<(StoreEvent, T)> + Send,
    {
        let _guard = self.write_lock.lock().await;

        let mut recipes = self.read().await?.recipes;
        let (event, value) = apply(&mut recipes)?;

        self.write(&recipes).await?;
        debug!(key = %self.key, ?event, "committed change");
        self.events.emit(event);
        Ok(value)
    }

    async fn read(&self) -> StoreResult<Decoded> {
        let payload = match self.storage.get_item(&self.key).await {
            Ok(payload) => payload,
            Err(StorageError::InvalidUtf8 { source, .. }) => {
                return Err(StoreError::DecodeError {
                    key: self.key.clone(),
                    source: Box::new(source),
                })
            }
            Err(e) => return Err(StoreError::StorageUnavailable(e)),
        };

        let Some(payload) = payload else {
            debug!(key = %self.key, "no stored recipes");
            return Ok(Decoded {
                recipes: Vec::new(),
                backfilled: 0,
            });
        };

        let decoded = codec::decode(&payload).map_err(|source| StoreError::DecodeError {
            key: self.key.clone(),
            source: Box::new(source),
        })?;
        debug!(key = %self.key, recipes = decoded.recipes.len(), "loaded recipes");
        Ok(decoded)
    }

    async fn write(&self, recipes: &[Recipe]) -> StoreResult<()> {
        let payload = codec::encode(recipes).map_err(StoreError::Encode)?;
        self.storage
            .set_item(&self.key, &payload)
            .await
            .map_err(StoreError::WriteFailed)?;
        debug!(key = %self.key, recipes = recipes.len(), "saved recipes");
        Ok(())
    }
}

fn validate_title(title: &str) -> StoreResult<()> {
    if title.is_empty() {
        return Err(StoreError::InvalidRecipe("title must not be empty".to_string()));
    }
    Ok(())
}

/// Error if a recipe other than `except` already uses `title`
fn check_title_free(recipes: &[Recipe], title: &str, except: Option<Uuid>) -> StoreResult<()> {
    match recipes
        .iter()
        .find(|r| r.matches_title(title) && Some(r.id) != except)
    {
        Some(existing) => Err(StoreError::DuplicateTitle {
            title: title.to_string(),
            existing: existing.id,
        }),
        None => Ok(()),
    }
}

fn count_categories(recipes: &[Recipe]) -> Vec<CategoryCount> {
    let mut groups: BTreeMap<String, CategoryCount> = BTreeMap::new();

    for recipe in recipes {
        let name = recipe.category.trim();
        groups
            .entry(name.to_lowercase())
            .or_insert_with(|| CategoryCount {
                name: name.to_string(),
                count: 0,
            })
            .count += 1;
    }

    groups.into_values().collect()
}
