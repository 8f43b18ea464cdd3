//! Code for reading zonal hourly load tables.
use super::{CsvTable, input_err_msg, parse_number, read_csv_table};
use crate::error::LoadError;
use crate::load::RawZoneLoadTable;
use crate::zone::{ZoneID, ZoneVocabulary};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use std::path::Path;

/// Accepted names for the column of hour-ending labels
const HOUR_ENDING_COLUMNS: [&str; 2] = ["Hour Ending", "HourEnding"];

/// Read a zonal load table from a CSV file.
///
/// The file must have an "Hour Ending" column and one column for every zone in `zones`. Columns
/// which the vocabulary marks as ignored (e.g. system totals) are discarded.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
/// * `zones` - The zones expected in the file
///
/// # Returns
///
/// The load table with zones in vocabulary order, or an error.
pub fn read_zone_load_table(file_path: &Path, zones: &ZoneVocabulary) -> Result<RawZoneLoadTable> {
    let table = read_csv_table(file_path)?;
    read_zone_load_table_from_csv(&table, zones).with_context(|| input_err_msg(file_path))
}

fn find_hour_ending_column(table: &CsvTable) -> Result<usize> {
    HOUR_ENDING_COLUMNS
        .iter()
        .find_map(|name| table.find_column(name))
        .ok_or_else(|| {
            LoadError::SchemaMismatch(format!(
                "Load table has no hour-ending column (expected one of: {})",
                HOUR_ENDING_COLUMNS.join(", ")
            ))
            .into()
        })
}

/// Work out which column holds each zone's load
fn map_zone_columns(
    table: &CsvTable,
    hour_column: usize,
    zones: &ZoneVocabulary,
) -> Result<IndexMap<ZoneID, usize>> {
    let mut columns = IndexMap::new();
    for (idx, header) in table.headers.iter().enumerate() {
        if idx == hour_column {
            continue;
        }
        if zones.is_ignored_column(header) {
            debug!("Discarding load table column '{header}'");
            continue;
        }

        let Some(zone) = zones.resolve(header) else {
            return Err(LoadError::SchemaMismatch(format!(
                "Load table column '{header}' is not a known zone"
            ))
            .into());
        };
        if let Some(existing) = columns.insert(zone.clone(), idx) {
            return Err(LoadError::SchemaMismatch(format!(
                "Zone {zone} appears in both column '{}' and column '{header}'",
                &table.headers[existing]
            ))
            .into());
        }
    }

    let missing = zones.iter().filter(|zone| !columns.contains_key(*zone)).join(", ");
    if !missing.is_empty() {
        return Err(LoadError::SchemaMismatch(format!(
            "Load table is missing zone(s): {missing}"
        ))
        .into());
    }

    // Use vocabulary order
    Ok(zones
        .iter()
        .map(|zone| (zone.clone(), columns[zone]))
        .collect())
}

fn read_zone_load_table_from_csv(
    table: &CsvTable,
    zones: &ZoneVocabulary,
) -> Result<RawZoneLoadTable> {
    let hour_column = find_hour_ending_column(table)?;
    let zone_columns = map_zone_columns(table, hour_column, zones)?;

    let mut hour_ending = Vec::with_capacity(table.rows.len());
    let mut loads: IndexMap<_, _> = zone_columns
        .keys()
        .map(|zone| (zone.clone(), Vec::with_capacity(table.rows.len())))
        .collect();
    for (row_idx, row) in table.rows.iter().enumerate() {
        // Row numbers are 1-based and the header is row 1
        let row_number = row_idx + 2;
        let label = row
            .get(hour_column)
            .with_context(|| format!("Row {row_number} is missing its hour-ending label"))?;
        hour_ending.push(label.to_string());

        for (zone, &idx) in &zone_columns {
            let cell = row
                .get(idx)
                .with_context(|| format!("Row {row_number} has no value for zone {zone}"))?;
            let value = parse_number(cell)
                .with_context(|| format!("Invalid load for zone {zone} in row {row_number}"))?;
            ensure!(
                value.is_finite() && value >= 0.0,
                "Load for zone {zone} in row {row_number} must be a non-negative number"
            );
            loads[zone].push(value);
        }
    }

    Ok(RawZoneLoadTable { hour_ending, loads })
}
