//! recipebox CLI
//!
//! Command-line interface for recipebox - a local recipe collection.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use recipebox_core::{Config, RecipeStore, StoreError};

mod commands;
mod editor;
mod output;

use commands::recipe::RecipeFields;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "recipebox")]
#[command(about = "recipebox - Keep, search and favorite your recipes")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recipes
    #[command(alias = "ls")]
    List {
        /// Only favorites
        #[arg(short, long)]
        favorites: bool,
        /// Only recipes in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Search recipes by title, category and ingredients
    Search {
        /// Search query
        query: String,
    },
    /// List categories with recipe counts
    Categories,
    /// Show recipe details
    Show {
        /// Recipe title, id or id prefix
        key: String,
    },
    /// Add a new recipe
    Add {
        /// Recipe title
        title: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Edit a recipe
    Edit {
        /// Recipe title, id or id prefix
        key: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        #[command(flatten)]
        fields: FieldArgs,
        /// Remove the image
        #[arg(long, conflicts_with = "image")]
        clear_image: bool,
    },
    /// Toggle the favorite flag
    #[command(alias = "fav")]
    Favorite {
        /// Recipe title, id or id prefix
        key: String,
        /// Toggle every recipe with this title
        #[arg(long)]
        all: bool,
    },
    /// Delete a recipe
    #[command(alias = "rm")]
    Delete {
        /// Recipe title, id or id prefix
        key: String,
        /// Delete every recipe with this title
        #[arg(long)]
        all: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show storage location and collection summary
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Args)]
struct FieldArgs {
    /// Category
    #[arg(short, long)]
    category: Option<String>,
    /// Ingredients (opens editor if not provided)
    #[arg(short, long)]
    ingredients: Option<String>,
    /// Instructions (opens editor if not provided)
    #[arg(short = 'n', long)]
    instructions: Option<String>,
    /// Image URL or path
    #[arg(long)]
    image: Option<String>,
}

impl FieldArgs {
    fn into_fields(self, title: Option<String>) -> RecipeFields {
        RecipeFields {
            title,
            category: self.category,
            ingredients: self.ingredients,
            instructions: self.instructions,
            image: self.image,
        }
    }
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, storage_key, reject_duplicate_titles, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match run(cli, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, &output);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let store = RecipeStore::open_with_config(&config).await?;

    match cli.command {
        Commands::List {
            favorites,
            category,
        } => commands::recipe::list(&store, favorites, category, output).await,
        Commands::Search { query } => commands::recipe::search(&store, query, output).await,
        Commands::Categories => commands::category::list(&store, output).await,
        Commands::Show { key } => commands::recipe::show(&store, key, output).await,
        Commands::Add { title, fields } => {
            commands::recipe::add(&store, fields.into_fields(Some(title)), output).await
        }
        Commands::Edit {
            key,
            title,
            fields,
            clear_image,
        } => {
            commands::recipe::edit(&store, key, fields.into_fields(title), clear_image, output)
                .await
        }
        Commands::Favorite { key, all } => {
            commands::recipe::favorite(&store, key, all, output).await
        }
        Commands::Delete { key, all, yes } => {
            commands::recipe::delete(&store, key, all, yes, output).await
        }
        Commands::Status => commands::status::show(&store, &config, output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

/// Print a failed command's error, with a recovery hint when one is known
fn report_error(error: &anyhow::Error, output: &Output) {
    eprintln!("{}", format_error(error, output));
}

fn format_error(error: &anyhow::Error, output: &Output) -> String {
    let hint = error
        .downcast_ref::<StoreError>()
        .and_then(StoreError::recovery_suggestion);

    if output.is_json() {
        return serde_json::json!({
            "status": "error",
            "message": format!("{:#}", error),
            "hint": hint
        })
        .to_string();
    }

    match hint.filter(|_| !output.is_quiet()) {
        Some(hint) => format!("Error: {:#}\nHint: {}", error, hint),
        None => format!("Error: {:#}", error),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// Only initializes if RECIPEBOX_LOG environment variable is set.
/// Logs to config.log_file when configured, stderr otherwise.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("RECIPEBOX_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "recipebox_core={},recipebox_cli={}",
        log_level, log_level
    ));

    // Ignore the error if a subscriber is already installed
    match &config.log_file {
        Some(log_path) => {
            let log_file = match File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                    return;
                }
            };

            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();

            info!("logging initialized to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_fields() {
        let cli = Cli::try_parse_from([
            "recipebox",
            "add",
            "Pancakes",
            "--category",
            "Breakfast",
            "--ingredients",
            "flour, eggs",
        ])
        .unwrap();

        match cli.command {
            Commands::Add { title, fields } => {
                let fields = fields.into_fields(Some(title));
                assert_eq!(fields.title.as_deref(), Some("Pancakes"));
                assert_eq!(fields.category.as_deref(), Some("Breakfast"));
                assert_eq!(fields.ingredients.as_deref(), Some("flour, eggs"));
                assert!(fields.instructions.is_none());
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_parse_aliases_and_global_flags() {
        let cli = Cli::try_parse_from(["recipebox", "rm", "Soup", "--yes", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Delete { yes: true, all: false, .. }
        ));

        let cli = Cli::try_parse_from(["recipebox", "fav", "--all", "Soup"]).unwrap();
        assert!(matches!(cli.command, Commands::Favorite { all: true, .. }));

        let cli = Cli::try_parse_from(["recipebox", "ls", "-f"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                favorites: true,
                category: None
            }
        ));
    }

    #[test]
    fn test_format_error_follows_output_mode() {
        let error = anyhow::Error::new(StoreError::AmbiguousKey {
            key: "ab".to_string(),
            count: 2,
        })
        .context("Failed to show recipe");

        let human = format_error(&error, &Output::new(OutputFormat::Human));
        assert!(human.starts_with("Error: Failed to show recipe"));
        assert!(human.contains("Hint: Use the full recipe id."));

        let quiet = format_error(&error, &Output::new(OutputFormat::Quiet));
        assert!(!quiet.contains("Hint"));

        let json: serde_json::Value =
            serde_json::from_str(&format_error(&error, &Output::new(OutputFormat::Json))).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["hint"], "Use the full recipe id.");
    }

    #[test]
    fn test_clear_image_conflicts_with_image() {
        let result = Cli::try_parse_from([
            "recipebox",
            "edit",
            "Soup",
            "--image",
            "soup.png",
            "--clear-image",
        ]);
        assert!(result.is_err());
    }
}
