//! User settings read from the config directory.
use crate::get_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::Result;
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# Program settings for regional-load.
# Uncomment a line to change the setting from its default value.
";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Path of `settings.toml` in the user's config directory
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// User-level settings shared by every run
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Log level used unless REGIONAL_LOAD_LOG_LEVEL is set
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Replace an existing output folder without passing --overwrite
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
        }
    }
}

impl Settings {
    /// Load settings from `settings.toml` in the user's config directory, falling back to the
    /// defaults when the file does not exist
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(file_path)
    }

    /// A settings file with every field commented out at its default value, preceded by the
    /// field's doc comment
    pub fn default_file_contents() -> String {
        let toml::Value::Table(defaults) = toml::Value::try_from(Settings::default())
            .expect("Settings contain only plain TOML values")
        else {
            unreachable!("Settings serialise to a table")
        };

        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for (field, value) in defaults {
            let docs = Settings::get_field_docs(&field).unwrap_or_default();
            for doc_line in docs.lines() {
                out.push_str(&format!("\n# # {}\n", doc_line.trim()));
            }
            out.push_str(&format!("# {field} = {value}\n"));
        }

        out
    }
}
