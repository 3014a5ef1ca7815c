//! Collection payload encoding
//!
//! The whole collection is one JSON array. Decoding is lenient about record
//! contents written by older versions of the app: missing text fields become
//! empty, `null` flags count as false, and records without a usable `id`
//! (absent, not a UUID, or already taken by an earlier record) get a fresh one.
//! A replaced id that was not a UUID is kept under `legacyId`, and fields this
//! version does not know about are carried through untouched.
//! The number of such repairs is reported so the caller can persist them.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::Recipe;

/// Key under which a replaced non-UUID id is preserved
pub const LEGACY_ID_FIELD: &str = "legacyId";

/// Result of decoding a stored payload
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub recipes: Vec<Recipe>,
    /// Records whose id or timestamps had to be filled in
    pub backfilled: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecipe {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    ingredients: Option<String>,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    is_favorite: Option<bool>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Serialize a collection for storage
pub fn encode(recipes: &[Recipe]) -> serde_json::Result<String> {
    serde_json::to_string(recipes)
}

/// Parse a stored payload
///
/// A blank payload or a JSON `null` is an empty collection. Anything that is
/// not an array of objects is an error.
pub fn decode(payload: &str) -> serde_json::Result<Decoded> {
    if payload.trim().is_empty() {
        return Ok(Decoded {
            recipes: Vec::new(),
            backfilled: 0,
        });
    }

    let stored: Option<Vec<StoredRecipe>> = serde_json::from_str(payload)?;
    let stored = stored.unwrap_or_default();

    let now = Utc::now();
    let mut seen = HashSet::with_capacity(stored.len());
    let mut backfilled = 0;
    let mut recipes = Vec::with_capacity(stored.len());

    for mut record in stored {
        let stored_uuid = record
            .id
            .as_ref()
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());
        let parsed_id = stored_uuid.filter(|id| !seen.contains(id));

        if stored_uuid.is_none() {
            if let Some(legacy) = record.id.take().filter(|v| !v.is_null()) {
                record
                    .extra
                    .entry(LEGACY_ID_FIELD.to_string())
                    .or_insert(legacy);
            }
        }

        let needs_repair =
            parsed_id.is_none() || record.created_at.is_none() || record.updated_at.is_none();
        if needs_repair {
            backfilled += 1;
        }

        let id = parsed_id.unwrap_or_else(Uuid::new_v4);
        seen.insert(id);

        let created_at = record.created_at.unwrap_or(now);
        recipes.push(Recipe {
            id,
            title: record.title.unwrap_or_default(),
            category: record.category.unwrap_or_default(),
            ingredients: record.ingredients.unwrap_or_default(),
            instructions: record.instructions.unwrap_or_default(),
            image: record.image,
            is_favorite: record.is_favorite.unwrap_or(false),
            created_at,
            updated_at: record.updated_at.unwrap_or(created_at),
            extra: record.extra,
        });
    }

    Ok(Decoded {
        recipes,
        backfilled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_null_payloads_are_empty() {
        for payload in ["", "   ", "null", "[]"] {
            let decoded = decode(payload).unwrap();
            assert!(decoded.recipes.is_empty(), "payload {:?}", payload);
            assert_eq!(decoded.backfilled, 0);
        }
    }

    #[test]
    fn test_malformed_payloads_fail() {
        for payload in ["{", "not json", "{\"title\":\"Soup\"}", "[1, 2]", "\"recipes\""] {
            assert!(decode(payload).is_err(), "payload {:?}", payload);
        }
    }

    #[test]
    fn test_legacy_records_are_backfilled() {
        let payload = r#"[
            {"title": "Soup", "category": "Starter", "ingredients": "water", "instructions": "boil"},
            {"title": "Cake", "category": "Dessert", "isFavorite": true, "image": "file:///cake.jpg"},
            {"id": "1700000000000", "title": "Tea", "category": "Drink", "isFavorite": null}
        ]"#;

        let decoded = decode(payload).unwrap();
        assert_eq!(decoded.backfilled, 3);
        assert_eq!(decoded.recipes.len(), 3);

        let soup = &decoded.recipes[0];
        assert_eq!(soup.title, "Soup");
        assert_eq!(soup.ingredients, "water");
        assert!(!soup.is_favorite);

        let cake = &decoded.recipes[1];
        assert!(cake.is_favorite);
        assert_eq!(cake.image.as_deref(), Some("file:///cake.jpg"));
        assert!(cake.instructions.is_empty());

        // Non-UUID id replaced but kept
        let tea = &decoded.recipes[2];
        assert!(!tea.is_favorite);
        assert_ne!(decoded.recipes[0].id, tea.id);
        assert_eq!(
            tea.extra.get(LEGACY_ID_FIELD),
            Some(&Value::from("1700000000000"))
        );
        assert!(soup.extra.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let payload = r#"[{"id": 42, "title": "Soup", "category": "Starter", "servings": 4, "tags": ["warm"]}]"#;

        let decoded = decode(payload).unwrap();
        let soup = &decoded.recipes[0];
        assert_eq!(soup.extra.get("servings"), Some(&Value::from(4)));
        assert_eq!(soup.extra.get(LEGACY_ID_FIELD), Some(&Value::from(42)));

        let encoded: Value = serde_json::from_str(&encode(&decoded.recipes).unwrap()).unwrap();
        assert_eq!(encoded[0]["servings"], 4);
        assert_eq!(encoded[0]["tags"][0], "warm");
        assert_eq!(encoded[0][LEGACY_ID_FIELD], 42);
        assert_eq!(encoded[0]["id"], soup.id.to_string());

        // Decoding our own output repairs nothing further
        let again = decode(&encode(&decoded.recipes).unwrap()).unwrap();
        assert_eq!(again.backfilled, 0);
        assert_eq!(again.recipes, decoded.recipes);
    }

    #[test]
    fn test_empty_image_is_kept_as_written() {
        let payload = r#"[{"title": "Soup", "image": ""}]"#;
        let decoded = decode(payload).unwrap();
        assert_eq!(decoded.recipes[0].image.as_deref(), Some(""));
    }

    #[test]
    fn test_duplicate_ids_are_reassigned() {
        let recipe = Recipe::new("Soup", "Starter");
        let payload = encode(&[recipe.clone(), recipe.clone()]).unwrap();

        let decoded = decode(&payload).unwrap();
        assert_eq!(decoded.backfilled, 1);
        assert_eq!(decoded.recipes[0].id, recipe.id);
        assert_ne!(decoded.recipes[1].id, recipe.id);
    }

    #[test]
    fn test_current_records_need_no_repair() {
        let mut recipe = Recipe::new("Soup", "Starter");
        recipe.set_image(Some("https://example.com/soup.png".to_string()));
        recipe.toggle_favorite();

        let decoded = decode(&encode(&[recipe.clone()]).unwrap()).unwrap();
        assert_eq!(decoded.backfilled, 0);
        assert_eq!(decoded.recipes, vec![recipe]);
    }
}
