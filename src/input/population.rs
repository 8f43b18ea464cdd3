//! Code for reading the county population table.
use super::{CsvTable, input_err_msg, parse_number, read_csv_table};
use crate::error::LoadError;
use crate::id::{CountyID, IDLookup, normalise_name};
use crate::population::{CountyMembership, PopulationData};
use crate::region::{RegionID, RegionOrder, resolve_region_order};
use crate::zone::{ZoneMembership, ZoneVocabulary};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, warn};
use std::path::Path;

const COUNTY_COLUMN: &str = "county";
const ZONE_COLUMN: &str = "cdr_zone";
const REGION_COLUMN: &str = "model_region";

/// Read county memberships and populations from a CSV file.
///
/// The file has `county`, `cdr_zone` and `model_region` columns, plus one column of populations
/// per year, headed by the year. Counties whose zone is excluded (e.g. "non-load") or not
/// recognised are dropped.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
/// * `zones` - Vocabulary used to interpret zone names
/// * `region_order` - Canonical order for regions, if any. Otherwise regions are sorted by name.
pub fn read_population_data(
    file_path: &Path,
    zones: &ZoneVocabulary,
    region_order: Option<&RegionOrder>,
) -> Result<PopulationData> {
    let table = read_csv_table(file_path)?;
    read_population_data_from_csv(&table, zones, region_order)
        .with_context(|| input_err_msg(file_path))
}

fn require_column(table: &CsvTable, name: &str) -> Result<usize> {
    table.find_column(name).ok_or_else(|| {
        LoadError::SchemaMismatch(format!("Population table has no '{name}' column")).into()
    })
}

/// Find the columns whose headers are years
fn year_columns(table: &CsvTable) -> Result<IndexMap<u32, usize>> {
    let mut columns = IndexMap::new();
    for (idx, header) in table.headers.iter().enumerate() {
        let Ok(year) = header.trim().parse::<u32>() else {
            continue;
        };
        if columns.insert(year, idx).is_some() {
            Err(LoadError::SchemaMismatch(format!(
                "Population table has more than one column for {year}"
            )))?;
        }
    }
    if columns.is_empty() {
        Err(LoadError::SchemaMismatch(
            "Population table has no year columns".into(),
        ))?;
    }

    Ok(columns)
}

/// Resolves region names from the population table to IDs, ignoring case and whitespace.
///
/// With a configured order, names must be in it. Otherwise the first spelling seen for a region
/// becomes its ID.
enum RegionNames<'a> {
    Ordered(&'a RegionOrder),
    Discovered(IDLookup<RegionID>),
}

impl RegionNames<'_> {
    fn resolve(&mut self, name: &str) -> Result<RegionID> {
        match self {
            Self::Ordered(order) => order.resolve(name).cloned().ok_or_else(|| {
                LoadError::SchemaMismatch(format!("Region '{name}' is not in the region order"))
                    .into()
            }),
            Self::Discovered(lookup) => {
                if let Some(id) = lookup.get(name) {
                    return Ok(id.clone());
                }

                let id = RegionID::from(normalise_name(name));
                ensure!(!id.0.is_empty(), "Region name cannot be empty");
                lookup.insert(name, id.clone())?;
                Ok(id)
            }
        }
    }
}

fn read_population_data_from_csv(
    table: &CsvTable,
    zones: &ZoneVocabulary,
    region_order: Option<&RegionOrder>,
) -> Result<PopulationData> {
    let county_column = require_column(table, COUNTY_COLUMN)?;
    let zone_column = require_column(table, ZONE_COLUMN)?;
    let region_column = require_column(table, REGION_COLUMN)?;
    let year_columns = year_columns(table)?;

    let mut counties = Vec::new();
    let mut populations: IndexMap<_, _> = year_columns
        .keys()
        .map(|year| (*year, Vec::new()))
        .collect();
    let mut unknown_zones = Vec::new();
    let mut region_names = match region_order {
        Some(order) => RegionNames::Ordered(order),
        None => RegionNames::Discovered(IDLookup::default()),
    };
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_number = row_idx + 2;
        let cell = |idx: usize| {
            row.get(idx)
                .with_context(|| format!("Row {row_number} has too few fields"))
        };

        let county = normalise_name(cell(county_column)?);
        let zone_name = cell(zone_column)?;
        let zone = match zones.classify(zone_name) {
            ZoneMembership::Zone(zone) => zone,
            ZoneMembership::NonLoad => {
                debug!("Excluding county {county}, which has no load zone");
                continue;
            }
            ZoneMembership::Unknown => {
                unknown_zones.push(format!("{county} ({zone_name})"));
                continue;
            }
        };
        let region = region_names
            .resolve(cell(region_column)?)
            .with_context(|| format!("Invalid region for county {county}"))?;

        for (year, &idx) in &year_columns {
            let value = parse_number(cell(idx)?)
                .with_context(|| format!("Invalid population for county {county} in {year}"))?;
            populations[year].push(value);
        }
        counties.push(CountyMembership {
            county: CountyID::from(county),
            zone,
            region,
        });
    }

    if !unknown_zones.is_empty() {
        warn!(
            "Excluding {} counties with unrecognised zones: {}",
            unknown_zones.len(),
            unknown_zones.iter().join(", ")
        );
    }

    let regions = resolve_region_order(counties.iter().map(|c| &c.region), region_order)?;
    PopulationData::new(counties, populations, regions)
}
