//! Status command handler

use anyhow::Result;

use recipebox_core::{Config, RecipeStore};

use crate::output::Output;

/// Show where recipes are stored and what the collection holds
pub async fn show(store: &RecipeStore, config: &Config, output: &Output) -> Result<()> {
    let stats = store.stats().await?;
    let location = config.collection_path();

    output.print_stats(&stats, &location.display().to_string());

    Ok(())
}
