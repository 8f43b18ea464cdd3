//! The module responsible for writing output data to disk.
use crate::aggregate::RegionLoadTable;
use anyhow::{Context, Result, ensure};
use std::fs;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which run-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "regional_load_results";

/// Column headings which precede the region columns in load profile files
const ROW_LABEL_COLUMNS: [&str; 4] = ["time_index", "month", "day", "period"];

/// Get the default output folder for the run configuration file at `config_path`.
///
/// This is a subfolder of [`OUTPUT_DIRECTORY_ROOT`] named after the configuration file.
pub fn get_output_dir(config_path: &Path) -> Result<PathBuf> {
    let config_name = config_path
        .file_stem()
        .context("Could not determine name of run configuration file")?
        .to_str()
        .context("Invalid chars in run configuration file name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, config_name].iter().collect())
}

/// Create a new output directory.
///
/// If the directory already exists and is not empty, it is only reused if `allow_overwrite` is
/// true, in which case its contents are deleted first.
///
/// # Returns
///
/// True if an existing folder was overwritten, false otherwise.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let mut overwritten = false;
    if output_dir.is_dir() {
        let is_empty = output_dir
            .read_dir()
            .with_context(|| format!("Could not read {}", output_dir.display()))?
            .next()
            .is_none();
        if is_empty {
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder {} already exists and is not empty. Use --overwrite to replace its \
            contents.",
            output_dir.display()
        );
        fs::remove_dir_all(output_dir)?;
        overwritten = true;
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwritten)
}

/// The path of the load profile file for a base year and target year.
///
/// Files are grouped by base year and, where profiles were matched to an intermediate year,
/// by that year too.
pub fn profile_file_path(
    output_dir: &Path,
    base_year: u32,
    intermediate_year: Option<u32>,
    target_year: u32,
) -> PathBuf {
    let mut path = output_dir.join(format!("load_base_{base_year}"));
    if let Some(intermediate_year) = intermediate_year {
        path.push(format!("load_intermediate_{intermediate_year}"));
    }
    path.push(format!("load_base{base_year}_model{target_year}.csv"));
    path
}

/// Write a regional load profile to a CSV file, creating parent folders as needed.
///
/// Each row is labelled with its position in the year and its calendar month, day and hour
/// (`period`), followed by one column per region.
pub fn write_load_profile(file_path: &Path, table: &RegionLoadTable) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    writer.write_record(
        ROW_LABEL_COLUMNS
            .iter()
            .map(ToString::to_string)
            .chain(table.ids().map(ToString::to_string)),
    )?;

    let columns: Vec<_> = table.iter().map(|(_, values)| values).collect();
    for (time_index, hour) in table.hours().iter().enumerate() {
        let labels = [time_index, hour.month as usize, hour.day as usize, hour.period as usize];
        writer.write_record(
            labels
                .iter()
                .map(ToString::to_string)
                .chain(columns.iter().map(|values| values[time_index].to_string())),
        )?;
    }
    writer.flush()?;

    Ok(())
}
