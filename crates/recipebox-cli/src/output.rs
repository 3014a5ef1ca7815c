//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use recipebox_core::{CategoryCount, Recipe, SearchHit, StoreStats};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single recipe in full (the detail view)
    pub fn print_recipe(&self, recipe: &Recipe) {
        match self.format {
            OutputFormat::Human => {
                let marker = if recipe.is_favorite { " ♥" } else { "" };
                println!("{}{}", recipe.title, marker);
                println!("{}", "─".repeat(recipe.title.chars().count().max(8)));
                println!("ID:          {}", recipe.id);
                println!("Category:    {}", display_category(&recipe.category));
                if let Some(image) = recipe.image.as_deref().filter(|i| !i.is_empty()) {
                    println!("Image:       {}", image);
                }
                println!("Created:     {}", recipe.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:     {}", recipe.updated_at.format("%Y-%m-%d %H:%M"));

                println!();
                println!("── Ingredients ──");
                println!("{}", or_placeholder(&recipe.ingredients));
                println!();
                println!("── Instructions ──");
                println!("{}", or_placeholder(&recipe.instructions));
            }
            OutputFormat::Json => print_json(recipe),
            OutputFormat::Quiet => {
                println!("{}", recipe.id);
            }
        }
    }

    /// Print a list of recipes (the list view)
    pub fn print_recipes(&self, recipes: &[Recipe]) {
        match self.format {
            OutputFormat::Human => {
                if recipes.is_empty() {
                    println!("No recipes found.");
                    return;
                }
                for recipe in recipes {
                    println!("{}", summary_line(recipe));
                }
                println!("\n{} recipe(s)", recipes.len());
            }
            OutputFormat::Json => print_json(&recipes),
            OutputFormat::Quiet => {
                for recipe in recipes {
                    println!("{}", recipe.id);
                }
            }
        }
    }

    /// Print ranked search results
    pub fn print_hits(&self, hits: &[SearchHit]) {
        match self.format {
            OutputFormat::Human => {
                if hits.is_empty() {
                    println!("No recipes found.");
                    return;
                }
                for hit in hits {
                    println!("{}", summary_line(&hit.recipe));
                }
                println!("\n{} match(es)", hits.len());
            }
            OutputFormat::Json => {
                let json_hits: Vec<_> = hits
                    .iter()
                    .map(|hit| serde_json::json!({"score": hit.score, "recipe": hit.recipe}))
                    .collect();
                print_json(&json_hits);
            }
            OutputFormat::Quiet => {
                for hit in hits {
                    println!("{}", hit.recipe.id);
                }
            }
        }
    }

    /// Print categories with counts
    pub fn print_categories(&self, categories: &[CategoryCount]) {
        match self.format {
            OutputFormat::Human => {
                if categories.is_empty() {
                    println!("No categories found.");
                    return;
                }
                for category in categories {
                    println!("{} ({})", display_category(&category.name), category.count);
                }
                println!("\n{} categories", categories.len());
            }
            OutputFormat::Json => print_json(&categories),
            OutputFormat::Quiet => {
                for category in categories {
                    println!("{}", category.name);
                }
            }
        }
    }

    /// Print store statistics
    pub fn print_stats(&self, stats: &StoreStats, location: &str) {
        match self.format {
            OutputFormat::Human => {
                println!("recipebox status");
                println!("================");
                println!();
                println!("Storage:");
                println!("  Backend:  {}", stats.backend);
                println!("  Key:      {}", stats.key);
                println!("  Location: {}", location);
                println!(
                    "  Size:     {}",
                    stats
                        .payload_bytes
                        .map(human_size)
                        .unwrap_or_else(|| "(nothing stored)".to_string())
                );
                println!();
                println!("Contents:");
                println!("  Recipes:    {}", stats.recipes);
                println!("  Favorites:  {}", stats.favorites);
                println!("  Categories: {}", stats.categories);
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "location": location,
                        "storage": stats,
                    })
                );
            }
            OutputFormat::Quiet => {
                println!("{}", stats.recipes);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render JSON: {}", e),
    }
}

/// One line per recipe: short id, title, category, favorite marker
fn summary_line(recipe: &Recipe) -> String {
    format!(
        "{} | {}{} | {}",
        short_id(recipe),
        truncate(&recipe.title, 40),
        if recipe.is_favorite { " ♥" } else { "" },
        truncate(display_category(&recipe.category), 20)
    )
}

pub fn short_id(recipe: &Recipe) -> String {
    recipe.id.to_string()[..8].to_string()
}

fn display_category(category: &str) -> &str {
    if category.trim().is_empty() {
        "(none)"
    } else {
        category
    }
}

fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        "(empty)"
    } else {
        text
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
