//! Redistribution of zonal load to counties and then to model regions.
use crate::error::LoadError;
use crate::id::IDLike;
use crate::load::{LoadTable, ZoneLoadTable};
use crate::population::{CountyRecord, PopulationTable};
use crate::region::RegionID;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;

/// The default largest permitted change in total energy caused by aggregation
pub const DEFAULT_ENERGY_TOLERANCE: f64 = 1e-4;

/// Load for each model region
pub type RegionLoadTable = LoadTable<RegionID>;

/// Sum the load series of the counties in one region.
///
/// Each county receives its zone's load multiplied by its share of the zone's population.
fn region_series(
    zone_loads: &ZoneLoadTable,
    counties: &[(&CountyRecord, f64)],
) -> Result<Vec<f64>> {
    let mut series = vec![0.0; zone_loads.n_rows()];
    for (county, share) in counties {
        let Some(zone_load) = zone_loads.column(&county.zone) else {
            return Err(LoadError::SchemaMismatch(format!(
                "County {} belongs to zone {}, which is not in the load table",
                county.county, county.zone
            ))
            .into());
        };

        for (total, load) in series.iter_mut().zip(zone_load) {
            *total += load * share;
        }
    }

    Ok(series)
}

/// Convert zonal load into load for each model region.
///
/// # Arguments
///
/// * `zone_loads` - Load for each zone
/// * `population` - County populations (without non-load counties)
/// * `zone_shares` - Each county's share of its zone's population, aligned with `population`
/// * `region_order` - The order of the output columns; every county's region must be included
pub fn aggregate_to_regions(
    zone_loads: &ZoneLoadTable,
    population: &PopulationTable,
    zone_shares: &[f64],
    region_order: &[RegionID],
) -> Result<RegionLoadTable> {
    ensure!(
        zone_shares.len() == population.counties.len(),
        "Got {} zone shares for {} counties",
        zone_shares.len(),
        population.counties.len()
    );

    let counties_by_region = population
        .counties
        .iter()
        .zip(zone_shares.iter().copied())
        .into_group_map_by(|(county, _)| county.region.clone());

    if let Some(region) = counties_by_region
        .keys()
        .find(|region| !region_order.contains(region))
    {
        Err(LoadError::SchemaMismatch(format!(
            "Region {region} is missing from the output region order"
        )))?;
    }

    let columns = region_order
        .iter()
        .map(|region| {
            let counties = counties_by_region
                .get(region)
                .map(Vec::as_slice)
                .unwrap_or_default();
            debug!("Region {region} has {} counties", counties.len());
            Ok((region.clone(), region_series(zone_loads, counties)?))
        })
        .collect::<Result<IndexMap<_, _>>>()?;

    LoadTable::new(zone_loads.hours().to_vec(), columns)
}

/// Check that aggregating into regions has not changed the total energy.
///
/// # Returns
///
/// The absolute difference between the totals, or an error if it exceeds `tolerance`.
pub fn check_energy_conserved<Z: IDLike, R: IDLike>(
    zone_loads: &LoadTable<Z>,
    region_loads: &LoadTable<R>,
    tolerance: f64,
) -> Result<f64> {
    let zone_total = zone_loads.total_energy();
    let region_total = region_loads.total_energy();
    let gap = (region_total - zone_total).abs();

    // NB: Written so that NaN totals fail the check
    if !(gap <= tolerance) {
        Err(LoadError::EnergyConservationViolation {
            gap,
            zone_total,
            region_total,
            tolerance,
        })?;
    }

    Ok(gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::county_share_of_group;
    use crate::fixture::{assert_error, population_table, zone_loads};
    use crate::zone::ZoneID;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn regions() -> Vec<RegionID> {
        vec!["R1".into(), "R2".into()]
    }

    fn shares(population_table: &PopulationTable) -> Vec<f64> {
        county_share_of_group(population_table, "zone", |c| &c.zone).unwrap()
    }

    #[rstest]
    fn test_aggregate_to_regions(population_table: PopulationTable, zone_loads: ZoneLoadTable) {
        let shares = shares(&population_table);
        let regions =
            aggregate_to_regions(&zone_loads, &population_table, &shares, &regions()).unwrap();

        assert_eq!(
            regions.ids().collect_vec(),
            [&RegionID::new("R1"), &RegionID::new("R2")]
        );
        assert_eq!(regions.hours(), zone_loads.hours());

        let zone_a = zone_loads.column(&ZoneID::new("A")).unwrap();
        let zone_b = zone_loads.column(&ZoneID::new("B")).unwrap();
        let r1 = regions.column(&"R1".into()).unwrap();
        let r2 = regions.column(&"R2".into()).unwrap();
        for i in 0..regions.n_rows() {
            assert_approx_eq!(f64, r1[i], zone_a[i] / 3.0 + zone_b[i], ulps = 4);
            assert_approx_eq!(f64, r2[i], zone_a[i] * 2.0 / 3.0, ulps = 4);
        }

        let gap =
            check_energy_conserved(&zone_loads, &regions, DEFAULT_ENERGY_TOLERANCE).unwrap();
        assert!(gap < DEFAULT_ENERGY_TOLERANCE);
    }

    #[rstest]
    fn test_aggregate_to_regions_column_order(
        population_table: PopulationTable,
        zone_loads: ZoneLoadTable,
    ) {
        let shares = shares(&population_table);
        let order = vec!["R2".into(), "R1".into()];
        let regions =
            aggregate_to_regions(&zone_loads, &population_table, &shares, &order).unwrap();
        assert_eq!(
            regions.ids().collect_vec(),
            [&RegionID::new("R2"), &RegionID::new("R1")]
        );
    }

    #[rstest]
    fn test_aggregate_to_regions_missing_region(
        population_table: PopulationTable,
        zone_loads: ZoneLoadTable,
    ) {
        let shares = shares(&population_table);
        assert_error!(
            aggregate_to_regions(&zone_loads, &population_table, &shares, &["R1".into()]),
            "Schema mismatch: Region R2 is missing from the output region order"
        );
    }

    #[rstest]
    fn test_aggregate_to_regions_unknown_zone(
        mut population_table: PopulationTable,
        zone_loads: ZoneLoadTable,
    ) {
        let shares = shares(&population_table);
        population_table.counties[2].zone = "C".into();
        assert_error!(
            aggregate_to_regions(&zone_loads, &population_table, &shares, &regions()),
            "Schema mismatch: County county3 belongs to zone C, which is not in the load table"
        );
    }

    #[rstest]
    fn test_check_energy_conserved_violation(
        population_table: PopulationTable,
        zone_loads: ZoneLoadTable,
    ) {
        // Shares which don't sum to one per zone lose energy
        let shares = vec![0.5, 0.25, 1.0];
        let regions =
            aggregate_to_regions(&zone_loads, &population_table, &shares, &regions()).unwrap();
        let err = check_energy_conserved(&zone_loads, &regions, DEFAULT_ENERGY_TOLERANCE)
            .unwrap_err();
        let Some(LoadError::EnergyConservationViolation { gap, .. }) =
            err.downcast_ref::<LoadError>()
        else {
            panic!("Unexpected error: {err}");
        };
        let zone_a_total = zone_loads.column_total(&"A".into()).unwrap();
        assert_approx_eq!(f64, *gap, zone_a_total * 0.25, epsilon = 1e-6);
    }

    #[rstest]
    fn test_check_energy_conserved_within_tolerance(zone_loads: ZoneLoadTable) {
        // Only one column is nudged, so the total changes by 5e-5
        let nudged = zone_loads.map_columns(|zone, values| {
            let mut values = values.to_vec();
            if *zone == ZoneID::new("A") {
                values[0] += 5e-5;
            }
            values
        });
        assert!(check_energy_conserved(&zone_loads, &nudged, DEFAULT_ENERGY_TOLERANCE).is_ok());
        assert!(check_energy_conserved(&zone_loads, &nudged, 1e-6).is_err());
    }
}
