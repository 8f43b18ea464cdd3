//! Convert zonal hourly load data into regional load profiles for future years.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod aggregate;
pub mod allocation;
pub mod cli;
pub mod config;
pub mod error;
pub mod exogenous;
pub mod id;
pub mod input;
pub mod load;
pub mod log;
pub mod output;
pub mod pipeline;
pub mod population;
pub mod region;
pub mod scaling;
pub mod settings;
pub mod timestamp;
pub mod zone;

#[cfg(test)]
mod fixture;

/// Get the folder in which the program's configuration files are stored
pub fn get_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("regional-load");
    path
}
