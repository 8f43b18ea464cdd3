//! Defines the `RunConfig` struct, which represents the contents of a run configuration file.
use crate::aggregate::DEFAULT_ENERGY_TOLERANCE;
use crate::input::{input_err_msg, is_sorted_and_unique, read_toml};
use crate::region::RegionOrder;
use crate::scaling::DEFAULT_GROWTH_FACTOR;
use crate::zone::ZoneVocabulary;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::warn;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_growth_factor, f64, DEFAULT_GROWTH_FACTOR);
define_param_default!(default_energy_tolerance, f64, DEFAULT_ENERGY_TOLERANCE);

/// An optional year whose total energy base year profiles are matched to before growth
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IntermediateConfig {
    /// The intermediate year
    pub year: u32,
    /// Zonal load data for the intermediate year
    pub load_file: PathBuf,
}

/// Represents the contents of the entire run configuration file.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Years for which load profiles are produced
    pub target_years: Vec<u32>,
    /// Annual load growth factor
    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,
    /// Largest permitted change in total energy when aggregating zones into regions
    #[serde(default = "default_energy_tolerance")]
    pub energy_tolerance: f64,
    /// County memberships and populations
    pub population_file: PathBuf,
    /// Daily exogenous load profiles for each target year
    pub exogenous_load_file: PathBuf,
    /// Order of region columns in output files. If omitted, regions are sorted by name.
    #[serde(default)]
    pub region_order: Option<RegionOrder>,
    /// Zonal load data for each base year
    #[serde(deserialize_with = "deserialise_load_files")]
    pub load_files: IndexMap<u32, PathBuf>,
    /// Optional intermediate year
    #[serde(default)]
    pub intermediate: Option<IntermediateConfig>,
    /// The load zones. Defaults to ERCOT's weather zones.
    #[serde(default)]
    pub zones: ZoneVocabulary,
}

/// Deserialise the table of base year load files, whose keys are years
fn deserialise_load_files<'de, D>(deserialiser: D) -> Result<IndexMap<u32, PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: IndexMap<String, PathBuf> = Deserialize::deserialize(deserialiser)?;
    raw.into_iter()
        .map(|(year, path)| {
            let year = year
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("'{year}' is not a valid base year")))?;
            Ok((year, path))
        })
        .collect()
}

/// Check that the `target_years` parameter is valid
fn check_target_years(years: &[u32]) -> Result<()> {
    ensure!(!years.is_empty(), "`target_years` is empty");

    ensure!(
        is_sorted_and_unique(years),
        "`target_years` must be composed of unique values in order"
    );

    Ok(())
}

/// Check that the `growth_factor` parameter is valid
fn check_growth_factor(value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "growth_factor must be a finite number greater than zero"
    );

    Ok(())
}

/// Check that the `energy_tolerance` parameter is valid
fn check_energy_tolerance(value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "energy_tolerance must be a finite number greater than or equal to zero"
    );

    Ok(())
}

impl RunConfig {
    /// Read a run configuration file.
    ///
    /// Relative paths in the file are interpreted relative to the folder containing it.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to the TOML file
    ///
    /// # Returns
    ///
    /// The file contents as a [`RunConfig`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(file_path: P) -> Result<RunConfig> {
        let file_path = file_path.as_ref();
        let mut config: RunConfig = read_toml(file_path)?;

        config
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        if let Some(base_dir) = file_path.parent() {
            config.resolve_paths(base_dir);
        }

        Ok(config)
    }

    /// The base years, in the order given in the file
    pub fn base_years(&self) -> impl Iterator<Item = u32> + '_ {
        self.load_files.keys().copied()
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        // target_years
        check_target_years(&self.target_years)?;

        // growth_factor
        check_growth_factor(self.growth_factor)?;

        // energy_tolerance
        check_energy_tolerance(self.energy_tolerance)?;

        // load_files
        ensure!(
            !self.load_files.is_empty(),
            "At least one base year must be given in `load_files`"
        );

        // intermediate
        if let Some(intermediate) = &self.intermediate {
            for base_year in self.base_years().filter(|year| *year >= intermediate.year) {
                warn!(
                    "Intermediate year {} is not later than base year {base_year}, so it will \
                    not be used for that base year",
                    intermediate.year
                );
            }
        }

        Ok(())
    }

    /// Make relative paths relative to `base_dir`
    fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        };

        resolve(&mut self.population_file);
        resolve(&mut self.exogenous_load_file);
        self.load_files.values_mut().for_each(resolve);
        if let Some(intermediate) = &mut self.intermediate {
            resolve(&mut intermediate.load_file);
        }
    }
}
