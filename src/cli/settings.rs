//! The `settings` subcommands, for managing the program settings file
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::Path;

/// Subcommands for settings
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Open the program settings file in a text editor
    Edit,
    /// Print the path from which the settings file is read
    Path,
    /// Print the contents of a default `settings.toml`
    DumpDefault,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Edit => edit_settings_file(&get_settings_file_path()),
            Self::Path => {
                println!("{}", get_settings_file_path().display());
                Ok(())
            }
            Self::DumpDefault => {
                print!("{}", Settings::default_file_contents());
                Ok(())
            }
        }
    }
}

/// Write a default settings file at `file_path` if there isn't one already.
///
/// # Returns
///
/// True if a new file was created.
fn create_settings_file_if_missing(file_path: &Path) -> Result<bool> {
    if file_path.is_file() {
        return Ok(false);
    }

    if let Some(dir_path) = file_path.parent() {
        fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    }
    fs::write(file_path, Settings::default_file_contents())
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    Ok(true)
}

/// Let the user edit the settings file, creating it first if needed
fn edit_settings_file(file_path: &Path) -> Result<()> {
    if create_settings_file_if_missing(file_path)? {
        println!("Created settings file with default values");
    }

    println!("Opening settings file for editing: {}", file_path.display());
    edit::edit_file(file_path)
        .with_context(|| format!("Failed to open {} in an editor", file_path.display()))?;

    Ok(())
}
