//! Category command handlers

use anyhow::Result;

use recipebox_core::RecipeStore;

use crate::output::Output;

/// List all categories with recipe counts
pub async fn list(store: &RecipeStore, output: &Output) -> Result<()> {
    let categories = store.categories().await?;
    output.print_categories(&categories);
    Ok(())
}
