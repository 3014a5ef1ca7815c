//! Recipe command handlers

use anyhow::{bail, Context, Result};

use recipebox_core::{Recipe, RecipeEdit, RecipeStore};

use crate::editor::{confirm, edit_recipe_text, is_interactive, prompt_with_default};
use crate::output::{short_id, Output};

/// Fields supplied on the command line for `add` and `edit`
#[derive(Debug, Default, Clone)]
pub struct RecipeFields {
    pub title: Option<String>,
    pub category: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    pub image: Option<String>,
}

impl RecipeFields {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.ingredients.is_none()
            && self.instructions.is_none()
            && self.image.is_none()
    }
}

/// List recipes, optionally only favorites or one category
pub async fn list(
    store: &RecipeStore,
    favorites: bool,
    category: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut recipes = match category {
        Some(ref c) => store.by_category(c).await?,
        None => store.load_all().await?,
    };

    if favorites {
        recipes.retain(|r| r.is_favorite);
    }

    output.print_recipes(&recipes);
    Ok(())
}

/// Search recipes
pub async fn search(store: &RecipeStore, query: String, output: &Output) -> Result<()> {
    let hits = store.search(&query).await?;
    output.print_hits(&hits);
    Ok(())
}

/// Show a single recipe
pub async fn show(store: &RecipeStore, key: String, output: &Output) -> Result<()> {
    let recipe = store.resolve(&key).await?;
    output.print_recipe(&recipe);
    Ok(())
}

/// Add a new recipe
///
/// Ingredients and instructions not given as flags are collected in the
/// editor when running interactively.
pub async fn add(store: &RecipeStore, fields: RecipeFields, output: &Output) -> Result<()> {
    let Some(title) = fields.title else {
        bail!("A title is required");
    };

    let mut recipe = Recipe::new(title, fields.category.unwrap_or_default());
    recipe.set_image(fields.image);

    let mut ingredients = fields.ingredients.unwrap_or_default();
    let mut instructions = fields.instructions.unwrap_or_default();

    if (ingredients.is_empty() || instructions.is_empty())
        && is_interactive()
        && output.should_prompt()
    {
        let (edited_ingredients, edited_instructions) =
            edit_recipe_text(&recipe.title, &ingredients, &instructions)?;
        ingredients = edited_ingredients;
        instructions = edited_instructions;
    }

    recipe.set_ingredients(ingredients);
    recipe.set_instructions(instructions);

    let recipe = store.add(recipe).await.context("Failed to add recipe")?;

    output.success(&format!("Added recipe: {}", recipe.id));
    output.print_recipe(&recipe);

    Ok(())
}

/// Edit a recipe
///
/// With no field flags and a terminal attached, prompts for each field and
/// opens the editor for ingredients and instructions.
pub async fn edit(
    store: &RecipeStore,
    key: String,
    fields: RecipeFields,
    clear_image: bool,
    output: &Output,
) -> Result<()> {
    let recipe = store.resolve(&key).await?;

    let edit = if fields.is_empty() && !clear_image {
        if !is_interactive() {
            bail!("Nothing to change. Pass field flags or run in a terminal.");
        }
        prompt_edit(&recipe)?
    } else {
        RecipeEdit {
            title: fields.title,
            category: fields.category,
            ingredients: fields.ingredients,
            instructions: fields.instructions,
            image: if clear_image {
                Some(None)
            } else {
                fields.image.map(Some)
            },
            is_favorite: None,
        }
    };

    if edit.is_empty() {
        output.message("No changes.");
        return Ok(());
    }

    let recipe = store
        .update(recipe.id, edit)
        .await
        .context("Failed to update recipe")?;

    output.success("Recipe updated");
    output.print_recipe(&recipe);

    Ok(())
}

/// Toggle the favorite flag
///
/// `all` flips every recipe sharing the title `key`.
pub async fn favorite(store: &RecipeStore, key: String, all: bool, output: &Output) -> Result<()> {
    let recipe = if all {
        store.toggle_favorite(&key).await?
    } else {
        let target = store.resolve(&key).await?;
        store.toggle_favorite_by_id(target.id).await?
    };

    let state = if recipe.is_favorite {
        "Marked as favorite"
    } else {
        "Removed from favorites"
    };
    output.success(&format!("{}: {}", state, recipe.title));

    Ok(())
}

/// Delete a recipe
///
/// `all` removes every recipe sharing the title `key`. Only the recipes
/// listed for confirmation are removed.
pub async fn delete(
    store: &RecipeStore,
    key: String,
    all: bool,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let targets: Vec<Recipe> = if all {
        store
            .load_all()
            .await?
            .into_iter()
            .filter(|r| r.matches_title(&key))
            .collect()
    } else {
        vec![store.resolve(&key).await?]
    };

    if targets.is_empty() {
        bail!("No recipe titled '{}'", key);
    }

    if !yes {
        if output.should_prompt() {
            for recipe in &targets {
                println!("Delete recipe: {} - {}", short_id(recipe), recipe.title);
            }
        }
        if !confirm("Are you sure?")? {
            output.message("Cancelled.");
            return Ok(());
        }
    }

    let removed = delete_targets(store, &targets).await?;

    if all {
        output.success(&format!("Deleted {} recipe(s) titled '{}'", removed.len(), key));
    } else if let Some(recipe) = removed.first() {
        output.success(&format!("Deleted recipe: {}", recipe.title));
    } else {
        output.message("Recipe was already deleted.");
    }

    Ok(())
}

/// Delete each target by id, skipping any that are already gone
async fn delete_targets(store: &RecipeStore, targets: &[Recipe]) -> Result<Vec<Recipe>> {
    let mut removed = Vec::with_capacity(targets.len());

    for target in targets {
        match store.delete_by_id(target.id).await {
            Ok(recipe) => removed.push(recipe),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e).context("Failed to delete recipe"),
        }
    }

    Ok(removed)
}

/// Interactive edit: prompt per field, then the editor for the long text
fn prompt_edit(recipe: &Recipe) -> Result<RecipeEdit> {
    println!("Editing recipe: {}", recipe.id);
    println!("Press Enter to keep current value, or type new value.\n");

    let mut edit = RecipeEdit {
        title: prompt_with_default("Title", &recipe.title)?,
        category: prompt_with_default("Category", &recipe.category)?,
        ..RecipeEdit::default()
    };

    let current_image = recipe.image.as_deref().unwrap_or("");
    if let Some(image) = prompt_with_default("Image (\"none\" to clear)", current_image)? {
        edit.image = Some(if image == "none" { None } else { Some(image) });
    }

    if confirm("Edit ingredients and instructions?")? {
        let (ingredients, instructions) =
            edit_recipe_text(&recipe.title, &recipe.ingredients, &recipe.instructions)?;
        if ingredients != recipe.ingredients {
            edit.ingredients = Some(ingredients);
        }
        if instructions != recipe.instructions {
            edit.instructions = Some(instructions);
        }
    }

    Ok(edit)
}
