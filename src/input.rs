//! Common routines for handling input data.
use crate::config::RunConfig;
use crate::pipeline::PipelineInputs;
use crate::scaling::{IntermediateReference, YearScaler};
use anyhow::{Context, Result, ensure};
use csv::StringRecord;
use itertools::Itertools;
use log::{info, warn};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use unicase::UniCase;

pub mod exogenous;
pub mod load;
pub mod population;
use exogenous::read_exogenous_loads;
use load::read_zone_load_table;
use population::read_population_data;

/// A CSV file's header row together with its data rows
#[derive(Debug)]
pub struct CsvTable {
    /// Column names
    pub headers: StringRecord,
    /// Data rows
    pub rows: Vec<StringRecord>,
}

impl CsvTable {
    /// Find the index of a column by name, ignoring case and surrounding whitespace
    pub fn find_column(&self, name: &str) -> Option<usize> {
        let name = UniCase::new(name.trim());
        self.headers
            .iter()
            .position(|header| UniCase::new(header.trim()) == name)
    }

    /// Find the index of a required column
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.find_column(name)
            .with_context(|| format!("Missing required column '{name}'"))
    }
}

/// Read a CSV file with a header row, where the columns are not known in advance.
///
/// Whitespace around fields is trimmed. The file must contain at least one data row.
pub fn read_csv_table(file_path: &Path) -> Result<CsvTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?;
    let headers = reader
        .headers()
        .with_context(|| input_err_msg(file_path))?
        .clone();
    let rows: Vec<_> = reader
        .records()
        .try_collect()
        .with_context(|| input_err_msg(file_path))?;
    ensure!(
        !rows.is_empty(),
        "CSV file {} cannot be empty",
        file_path.display()
    );

    Ok(CsvTable { headers, rows })
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Parse a numeric cell, allowing thousands separators (e.g. "1,234.5")
pub fn parse_number(value: &str) -> Result<f64> {
    let cleaned = value.trim().replace(',', "");
    ensure!(!cleaned.is_empty(), "Missing numeric value");
    cleaned
        .parse()
        .with_context(|| format!("'{value}' is not a number"))
}

/// Check whether an iterator contains values that are sorted and unique
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().tuple_windows().all(|(a, b)| a < b)
}

/// Read every input file named in the run configuration, apart from the base year load tables.
///
/// Base year load tables are read one at a time while the pipeline runs, so that a bad file only
/// affects its own base year.
pub fn load_inputs(config: &RunConfig) -> Result<PipelineInputs> {
    let population = read_population_data(
        &config.population_file,
        &config.zones,
        config.region_order.as_ref(),
    )?;
    info!(
        "Read population data for {} counties in {} regions",
        population.n_counties(),
        population.regions().len()
    );

    let exogenous_loads = read_exogenous_loads(&config.exogenous_load_file)?;
    for year in &config.target_years {
        if exogenous_loads.get(*year).is_err() {
            warn!(
                "Exogenous load file has no profile for target year {year}; outputs for this \
                year will fail"
            );
        }
    }

    let intermediate = config
        .intermediate
        .as_ref()
        .map(|intermediate| -> Result<_> {
            let table = read_zone_load_table(&intermediate.load_file, &config.zones)?;
            Ok(IntermediateReference {
                year: intermediate.year,
                total_energy: table.total_energy(),
            })
        })
        .transpose()
        .context("Failed to read intermediate year load data")?;

    Ok(PipelineInputs {
        population,
        exogenous_loads,
        scaler: YearScaler::new(config.growth_factor, intermediate)?,
        energy_tolerance: config.energy_tolerance,
        target_years: config.target_years.clone(),
    })
}
