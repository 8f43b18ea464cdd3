//! Population-weighted shares used to split load between counties and regions.
use crate::error::LoadError;
use crate::population::{CountyRecord, PopulationTable};
use crate::region::RegionID;
use anyhow::Result;
use indexmap::IndexMap;
use std::fmt::Display;
use std::hash::Hash;

/// Sum population by group, in order of first appearance
fn group_totals<'a, K, F>(table: &'a PopulationTable, group_of: F) -> IndexMap<&'a K, f64>
where
    K: Eq + Hash,
    F: Fn(&'a CountyRecord) -> &'a K,
{
    let mut totals = IndexMap::new();
    for county in &table.counties {
        *totals.entry(group_of(county)).or_insert(0.0) += county.population;
    }

    totals
}

/// Each county's fraction of the total population of its group.
///
/// The returned values are aligned with `table.counties`.
///
/// # Arguments
///
/// * `table` - County populations
/// * `group_kind` - What the groups are (for error messages)
/// * `group_of` - Gets the group a county belongs to
pub fn county_share_of_group<'a, K, F>(
    table: &'a PopulationTable,
    group_kind: &'static str,
    group_of: F,
) -> Result<Vec<f64>>
where
    K: Eq + Hash + Display + 'a,
    F: Fn(&'a CountyRecord) -> &'a K + Copy,
{
    let totals = group_totals(table, group_of);
    if let Some((group, _)) = totals.iter().find(|(_, total)| **total == 0.0) {
        Err(LoadError::EmptyGroup {
            group_kind,
            group: group.to_string(),
        })?;
    }

    Ok(table
        .counties
        .iter()
        .map(|county| county.population / totals[group_of(county)])
        .collect())
}

/// Each group's fraction of the total population.
///
/// The fractions sum to one.
pub fn group_share_of_whole<'a, K, F>(
    table: &'a PopulationTable,
    group_of: F,
) -> Result<IndexMap<K, f64>>
where
    K: Eq + Hash + Clone + 'a,
    F: Fn(&'a CountyRecord) -> &'a K,
{
    let totals = group_totals(table, group_of);
    let grand_total: f64 = totals.values().sum();
    if grand_total == 0.0 {
        Err(LoadError::EmptyGroup {
            group_kind: "population table",
            group: table.year.to_string(),
        })?;
    }

    Ok(totals
        .into_iter()
        .map(|(group, total)| (group.clone(), total / grand_total))
        .collect())
}

/// The two sets of shares needed to turn zonal load into regional load
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRatios {
    /// Each county's share of its zone's population (aligned with the population table)
    pub zone_shares: Vec<f64>,
    /// Each region's share of the total population
    pub region_shares: IndexMap<RegionID, f64>,
}

impl AllocationRatios {
    /// Calculate allocation ratios from county populations
    pub fn from_population(table: &PopulationTable) -> Result<Self> {
        Ok(Self {
            zone_shares: county_share_of_group(table, "zone", |county| &county.zone)?,
            region_shares: group_share_of_whole(table, |county| &county.region)?,
        })
    }
}
