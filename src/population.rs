//! County populations, which determine how load is shared out between counties and regions.
use crate::error::LoadError;
use crate::id::CountyID;
use crate::region::RegionID;
use crate::zone::ZoneID;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::HashSet;

/// The zone and region that a county belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct CountyMembership {
    /// The county's name
    pub county: CountyID,
    /// The zone whose load data covers the county
    pub zone: ZoneID,
    /// The model region the county is part of
    pub region: RegionID,
}

/// A county's membership and its population for a particular year
#[derive(Debug, Clone, PartialEq)]
pub struct CountyRecord {
    /// The county's name
    pub county: CountyID,
    /// The zone whose load data covers the county
    pub zone: ZoneID,
    /// The model region the county is part of
    pub region: RegionID,
    /// Population in the year of interest
    pub population: f64,
}

/// County populations for a single year.
///
/// Counties without a load zone have already been removed.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationTable {
    /// The year to which the populations apply
    pub year: u32,
    /// One record per county
    pub counties: Vec<CountyRecord>,
}

/// County memberships together with population for every tracked year
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationData {
    counties: Vec<CountyMembership>,
    populations: IndexMap<u32, Vec<f64>>,
    regions: Vec<RegionID>,
}

impl PopulationData {
    /// Create a new [`PopulationData`].
    ///
    /// # Arguments
    ///
    /// * `counties` - The zone and region of each county
    /// * `populations` - For each year, the population of each county (aligned with `counties`)
    /// * `regions` - All regions, in output order
    pub fn new(
        counties: Vec<CountyMembership>,
        populations: IndexMap<u32, Vec<f64>>,
        regions: Vec<RegionID>,
    ) -> Result<Self> {
        ensure!(!counties.is_empty(), "No counties with a load zone were found");
        ensure!(!populations.is_empty(), "No population data found");

        let mut seen = HashSet::new();
        for membership in &counties {
            ensure!(
                seen.insert(&membership.county),
                "County {} appears more than once",
                membership.county
            );
        }

        for (year, values) in &populations {
            ensure!(
                values.len() == counties.len(),
                "Expected {} population values for {year}, found {}",
                counties.len(),
                values.len()
            );
            for (membership, value) in counties.iter().zip(values) {
                ensure!(
                    value.is_finite() && *value >= 0.0,
                    "Population of {} in {year} must be a non-negative number",
                    membership.county
                );
            }
        }

        let regions_with_counties: HashSet<_> = counties.iter().map(|c| &c.region).collect();
        for region in &regions {
            ensure!(
                regions_with_counties.contains(region),
                "Region {region} has no counties"
            );
        }
        ensure!(
            regions.len() == regions_with_counties.len(),
            "Output region order does not include every region"
        );

        Ok(Self {
            counties,
            populations,
            regions,
        })
    }

    /// The years for which population data is available
    pub fn years(&self) -> impl Iterator<Item = u32> + '_ {
        self.populations.keys().copied()
    }

    /// All regions, in output order
    pub fn regions(&self) -> &[RegionID] {
        &self.regions
    }

    /// The number of counties
    pub fn n_counties(&self) -> usize {
        self.counties.len()
    }

    /// Get county populations for the given year
    pub fn for_year(&self, year: u32) -> Result<PopulationTable> {
        let Some(values) = self.populations.get(&year) else {
            return Err(LoadError::SchemaMismatch(format!(
                "No population data for {year} (available years: {})",
                self.years().join(", ")
            ))
            .into());
        };

        Ok(PopulationTable {
            year,
            counties: self
                .counties
                .iter()
                .zip(values)
                .map(|(membership, population)| CountyRecord {
                    county: membership.county.clone(),
                    zone: membership.zone.clone(),
                    region: membership.region.clone(),
                    population: *population,
                })
                .collect(),
        })
    }
}
