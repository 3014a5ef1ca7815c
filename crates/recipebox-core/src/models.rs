//! Data models for recipebox
//!
//! Defines the recipe record, the partial edit applied by the edit flow,
//! and the per-category summary.
//!
//! Records serialize with camelCase field names (`isFavorite`, `createdAt`)
//! so the stored collection keeps the layout used by the mobile app.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A single recipe record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Stable identifier, independent of the editable title
    pub id: Uuid,
    /// Display title; also accepted as a lookup key
    pub title: String,
    /// Free-form classification label
    pub category: String,
    /// Ingredient list as free text
    pub ingredients: String,
    /// Preparation steps as free text
    pub instructions: String,
    /// Optional URI of an image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Whether the recipe is marked as a favorite
    #[serde(default)]
    pub is_favorite: bool,
    /// When this recipe was created
    pub created_at: DateTime<Utc>,
    /// When this recipe was last updated
    pub updated_at: DateTime<Utc>,
    /// Fields written by other versions of the app, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Recipe {
    /// Create a new recipe with a fresh identifier
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, category)
    }

    /// Create a recipe with a specific ID (for loading from storage)
    pub fn with_id(id: Uuid, title: impl Into<String>, category: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            category: category.into(),
            ingredients: String::new(),
            instructions: String::new(),
            image: None,
            is_favorite: false,
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }

    /// Update the title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    /// Update the category
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
        self.touch();
    }

    /// Update the ingredients
    pub fn set_ingredients(&mut self, ingredients: impl Into<String>) {
        self.ingredients = ingredients.into();
        self.touch();
    }

    /// Update the instructions
    pub fn set_instructions(&mut self, instructions: impl Into<String>) {
        self.instructions = instructions.into();
        self.touch();
    }

    /// Set or clear the image reference; an empty reference clears it
    pub fn set_image(&mut self, image: Option<String>) {
        self.image = normalize_image(image);
        self.touch();
    }

    /// Flip the favorite flag
    pub fn toggle_favorite(&mut self) {
        self.is_favorite = !self.is_favorite;
        self.touch();
    }

    /// Whether this record answers to the given title key
    pub fn matches_title(&self, key: &str) -> bool {
        self.title == key
    }

    /// Apply a partial edit; returns true if any field changed
    pub fn apply(&mut self, edit: RecipeEdit) -> bool {
        let mut changed = false;

        if let Some(title) = edit.title {
            changed |= self.title != title;
            self.title = title;
        }
        if let Some(category) = edit.category {
            changed |= self.category != category;
            self.category = category;
        }
        if let Some(ingredients) = edit.ingredients {
            changed |= self.ingredients != ingredients;
            self.ingredients = ingredients;
        }
        if let Some(instructions) = edit.instructions {
            changed |= self.instructions != instructions;
            self.instructions = instructions;
        }
        if let Some(image) = edit.image {
            let image = normalize_image(image);
            changed |= self.image != image;
            self.image = image;
        }
        if let Some(is_favorite) = edit.is_favorite {
            changed |= self.is_favorite != is_favorite;
            self.is_favorite = is_favorite;
        }

        if changed {
            self.touch();
        }
        changed
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Blank image references mean "no image"
pub(crate) fn normalize_image(image: Option<String>) -> Option<String> {
    image.filter(|uri| !uri.trim().is_empty())
}

/// Partial update produced by the edit flow
///
/// `None` leaves a field untouched. For `image`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeEdit {
    pub title: Option<String>,
    pub category: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    pub image: Option<Option<String>>,
    pub is_favorite: Option<bool>,
}

impl RecipeEdit {
    /// True if the edit would not touch any field
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A category together with the number of recipes filed under it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_new() {
        let recipe = Recipe::new("Soup", "Starter");
        assert_eq!(recipe.title, "Soup");
        assert_eq!(recipe.category, "Starter");
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.image.is_none());
        assert!(!recipe.is_favorite);
        assert_eq!(recipe.created_at, recipe.updated_at);
    }

    #[test]
    fn test_recipe_ids_are_unique() {
        let a = Recipe::new("Soup", "Starter");
        let b = Recipe::new("Soup", "Starter");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_toggle_favorite_updates_timestamp() {
        let mut recipe = Recipe::new("Soup", "Starter");
        let original_updated = recipe.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(10));

        recipe.toggle_favorite();
        assert!(recipe.is_favorite);
        assert!(recipe.updated_at > original_updated);

        recipe.toggle_favorite();
        assert!(!recipe.is_favorite);
    }

    #[test]
    fn test_apply_edit() {
        let mut recipe = Recipe::new("Soup", "Starter");
        recipe.set_image(Some("file:///soup.jpg".to_string()));

        let changed = recipe.apply(RecipeEdit {
            title: Some("Tomato Soup".to_string()),
            image: Some(None),
            ..Default::default()
        });

        assert!(changed);
        assert_eq!(recipe.title, "Tomato Soup");
        assert_eq!(recipe.category, "Starter");
        assert!(recipe.image.is_none());
    }

    #[test]
    fn test_apply_noop_edit() {
        let mut recipe = Recipe::new("Soup", "Starter");
        let before = recipe.clone();

        let changed = recipe.apply(RecipeEdit {
            title: Some("Soup".to_string()),
            ..Default::default()
        });

        assert!(!changed);
        assert_eq!(recipe, before);
        assert!(RecipeEdit::default().is_empty());
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let mut recipe = Recipe::new("Soup", "Starter");
        recipe.toggle_favorite();

        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["isFavorite"], true);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("is_favorite").is_none());
        // No image, no key
        assert!(json.get("image").is_none());

        let back: Recipe = serde_json::from_value(json).unwrap();
        assert_eq!(back, recipe);
    }

    #[test]
    fn test_blank_image_is_cleared() {
        let mut recipe = Recipe::new("Soup", "Starter");
        recipe.set_image(Some(String::new()));
        assert!(recipe.image.is_none());

        recipe.set_image(Some("file:///soup.jpg".to_string()));
        let changed = recipe.apply(RecipeEdit {
            image: Some(Some("  ".to_string())),
            ..Default::default()
        });
        assert!(changed);
        assert!(recipe.image.is_none());
    }

    #[test]
    fn test_unknown_fields_survive_serde() {
        let json = serde_json::json!({
            "id": "6f1c2a3b-4d5e-4f60-8a7b-9c0d1e2f3a4b",
            "title": "Soup",
            "category": "Starter",
            "ingredients": "",
            "instructions": "",
            "isFavorite": false,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "servings": 4
        });

        let recipe: Recipe = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(recipe.extra.get("servings"), Some(&Value::from(4)));
        assert!(!recipe.extra.contains_key("title"));
        assert_eq!(serde_json::to_value(&recipe).unwrap(), json);
    }
}
