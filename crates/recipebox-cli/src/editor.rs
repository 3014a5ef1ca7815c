//! Interactive editing support
//!
//! Opens $EDITOR for ingredients and instructions, and prompts on the
//! terminal for single-line fields and confirmations.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::Command;

const INGREDIENTS_HEADER: &str = "## Ingredients";
const INSTRUCTIONS_HEADER: &str = "## Instructions";

/// Open content in the user's preferred editor
///
/// Uses $EDITOR, $VISUAL, or falls back to common editors.
pub fn edit_text(initial_content: &str) -> Result<String> {
    let editor = find_editor()?;

    let temp_path = env::temp_dir().join(format!("recipebox_edit_{}.md", std::process::id()));

    fs::write(&temp_path, initial_content)
        .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;

    let status = Command::new(&editor)
        .arg(&temp_path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        let _ = fs::remove_file(&temp_path);
        bail!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        );
    }

    let content = fs::read_to_string(&temp_path)
        .with_context(|| format!("Failed to read edited file: {:?}", temp_path))?;

    let _ = fs::remove_file(&temp_path);

    Ok(content)
}

/// Edit ingredients and instructions together in one editor session
pub fn edit_recipe_text(title: &str, ingredients: &str, instructions: &str) -> Result<(String, String)> {
    let edited = edit_text(&recipe_template(title, ingredients, instructions))
        .context("Failed to edit recipe")?;
    Ok(parse_recipe_template(&edited))
}

/// Build the editor buffer for a recipe
fn recipe_template(title: &str, ingredients: &str, instructions: &str) -> String {
    format!(
        "<!-- Editing: {} -->\n<!-- Lines starting with <!-- are ignored. -->\n\n{}\n{}\n\n{}\n{}\n",
        title, INGREDIENTS_HEADER, ingredients, INSTRUCTIONS_HEADER, instructions
    )
}

/// Split an edited buffer back into (ingredients, instructions)
///
/// Text before the first header is ignored. A missing section is empty.
fn parse_recipe_template(text: &str) -> (String, String) {
    let mut ingredients = Vec::new();
    let mut instructions = Vec::new();
    let mut current: Option<&mut Vec<&str>> = None;

    for line in text.lines() {
        if line.trim_start().starts_with("<!--") {
            continue;
        }
        match line.trim() {
            INGREDIENTS_HEADER => current = Some(&mut ingredients),
            INSTRUCTIONS_HEADER => current = Some(&mut instructions),
            _ => {
                if let Some(section) = current.as_mut() {
                    section.push(line);
                }
            }
        }
    }

    (
        ingredients.join("\n").trim().to_string(),
        instructions.join("\n").trim().to_string(),
    )
}

/// Find the user's preferred editor
fn find_editor() -> Result<String> {
    if let Ok(editor) = env::var("EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }

    if let Ok(visual) = env::var("VISUAL") {
        if !visual.is_empty() {
            return Ok(visual);
        }
    }

    let common_editors = ["nano", "vim", "vi", "emacs", "code", "notepad"];

    for editor in common_editors {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR environment variable.\n\
         Example: export EDITOR=nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Whether stdin is attached to a terminal
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !is_interactive() {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Prompt with a default value, returns None if user keeps default
pub fn prompt_with_default(prompt: &str, default: &str) -> Result<Option<String>> {
    if default.is_empty() {
        print!("{}: ", prompt);
    } else {
        print!("{} [{}]: ", prompt, default);
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        Ok(None)
    } else {
        Ok(Some(input.to_string()))
    }
}
