//! Recipe search
//!
//! Case-insensitive, whitespace-tokenized. A recipe matches when every term
//! occurs in its title, category or ingredients. Matches are ranked so that
//! title hits come first, then category hits, then ingredient mentions.

use std::cmp::Ordering;

use crate::models::Recipe;

/// A matching recipe with its relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub recipe: Recipe,
    pub score: f64,
}

/// Rank `recipes` against `query`
///
/// An empty query matches everything with a zero score, in title order.
pub fn search(recipes: Vec<Recipe>, query: &str) -> Vec<SearchHit> {
    let query = query.trim().to_lowercase();
    let terms: Vec<&str> = query.split_whitespace().collect();

    let mut hits: Vec<SearchHit> = recipes
        .into_iter()
        .filter_map(|recipe| {
            score(&recipe, &query, &terms).map(|score| SearchHit { recipe, score })
        })
        .collect();

    sort_hits(&mut hits);
    hits
}

/// Score one recipe, `None` if some term is missing from every field
fn score(recipe: &Recipe, query: &str, terms: &[&str]) -> Option<f64> {
    if terms.is_empty() {
        return Some(0.0);
    }

    let title = recipe.title.to_lowercase();
    let category = recipe.category.to_lowercase();
    let ingredients = recipe.ingredients.to_lowercase();

    let mut total = 0.0;

    // Whole query against the title
    if title == query {
        total += 20.0;
    } else if title.contains(query) {
        total += 10.0;
    }

    for term in terms {
        let in_title = title.contains(term);
        let in_category = category.contains(term);
        let mentions = ingredients.matches(term).count();

        if !in_title && !in_category && mentions == 0 {
            return None;
        }

        if in_title {
            total += 3.0;
        }
        if in_category {
            total += 2.0;
        }
        if mentions > 0 {
            total += 1.0 + (0.1 * mentions as f64).min(2.0);
        }
    }

    Some(total)
}

/// Highest score first, ties broken by title
fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.recipe
                    .title
                    .to_lowercase()
                    .cmp(&b.recipe.title.to_lowercase())
            })
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(title: &str, category: &str, ingredients: &str) -> Recipe {
        let mut recipe = Recipe::new(title, category);
        recipe.set_ingredients(ingredients);
        recipe
    }

    fn sample() -> Vec<Recipe> {
        vec![
            recipe("Pancakes", "Breakfast", "flour, eggs, milk, maple syrup"),
            recipe("Waffles", "Breakfast", "flour, eggs, syrup"),
            recipe("Tomato Soup", "Starter", "tomatoes, onion, stock"),
            recipe("Onion Tart", "Starter", "onion, pastry"),
        ]
    }

    fn titles(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.recipe.title.as_str()).collect()
    }

    #[test]
    fn test_exact_title_match() {
        let hits = search(sample(), "pancakes");
        assert_eq!(titles(&hits), vec!["Pancakes"]);
    }

    #[test]
    fn test_partial_title_match() {
        let hits = search(sample(), "PANCAKE");
        assert_eq!(titles(&hits), vec!["Pancakes"]);
    }

    #[test]
    fn test_ingredient_match() {
        let hits = search(sample(), "syrup");
        assert_eq!(titles(&hits), vec!["Pancakes", "Waffles"]);
    }

    #[test]
    fn test_title_hits_rank_above_ingredient_hits() {
        let hits = search(sample(), "onion");
        assert_eq!(titles(&hits), vec!["Onion Tart", "Tomato Soup"]);
    }

    #[test]
    fn test_category_match() {
        let hits = search(sample(), "starter");
        assert_eq!(titles(&hits), vec!["Onion Tart", "Tomato Soup"]);
    }

    #[test]
    fn test_all_terms_required() {
        let hits = search(sample(), "breakfast maple");
        assert_eq!(titles(&hits), vec!["Pancakes"]);

        assert!(search(sample(), "breakfast onion").is_empty());
    }

    #[test]
    fn test_no_matches() {
        assert!(search(sample(), "nonexistent").is_empty());
    }

    #[test]
    fn test_empty_query_returns_everything_sorted() {
        let hits = search(sample(), "   ");
        assert_eq!(
            titles(&hits),
            vec!["Onion Tart", "Pancakes", "Tomato Soup", "Waffles"]
        );
    }
}
