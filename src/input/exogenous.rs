//! Code for reading daily exogenous (EV charging) load profiles.
use super::{CsvTable, input_err_msg, parse_number, read_csv_table};
use crate::error::LoadError;
use crate::exogenous::ExogenousLoadProfiles;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use std::path::Path;

/// Read exogenous load profiles from a CSV file.
///
/// There is one column per year, headed by the year, with one row for each hour of the day.
/// Columns whose headers are not years (e.g. an hour index) are ignored.
pub fn read_exogenous_loads(file_path: &Path) -> Result<ExogenousLoadProfiles> {
    let table = read_csv_table(file_path)?;
    read_exogenous_loads_from_csv(&table).with_context(|| input_err_msg(file_path))
}

fn read_exogenous_loads_from_csv(table: &CsvTable) -> Result<ExogenousLoadProfiles> {
    let mut profiles = IndexMap::new();
    for (idx, header) in table.headers.iter().enumerate() {
        let Ok(year) = header.trim().parse::<u32>() else {
            continue;
        };

        let mut profile = Vec::with_capacity(table.rows.len());
        for (row_idx, row) in table.rows.iter().enumerate() {
            let cell = row
                .get(idx)
                .with_context(|| format!("Row {} has too few fields", row_idx + 2))?;
            let value = parse_number(cell)
                .with_context(|| format!("Invalid exogenous load for {year} in hour {row_idx}"))?;
            ensure!(
                value.is_finite() && value >= 0.0,
                "Exogenous load for {year} in hour {row_idx} must be a non-negative number"
            );
            profile.push(value);
        }

        ensure!(
            profiles.insert(year, profile).is_none(),
            "Exogenous load table has more than one column for {year}"
        );
    }

    if profiles.is_empty() {
        Err(LoadError::ProfileLengthMismatch(
            "Exogenous load table has no year columns".into(),
        ))?;
    }

    ExogenousLoadProfiles::new(profiles)
}
