//! Load from outside the base profile (electric vehicle charging), shared between regions by
//! population.
use crate::aggregate::RegionLoadTable;
use crate::error::LoadError;
use crate::load::{DAYS_PER_YEAR, HOURS_PER_DAY};
use crate::region::RegionID;
use anyhow::Result;
use indexmap::IndexMap;
use itertools::Itertools;

/// System-wide exogenous load for each hour of the day, for each target year
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExogenousLoadProfiles(IndexMap<u32, Vec<f64>>);

impl ExogenousLoadProfiles {
    /// Create a new [`ExogenousLoadProfiles`], checking each profile has one value per hour
    pub fn new(profiles: IndexMap<u32, Vec<f64>>) -> Result<Self> {
        for (year, profile) in &profiles {
            check_daily_profile(*year, profile)?;
        }

        Ok(Self(profiles))
    }

    /// The years for which a profile is available
    pub fn years(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }

    /// Get the daily profile for a year
    pub fn get(&self, year: u32) -> Result<&[f64]> {
        let Some(profile) = self.0.get(&year) else {
            return Err(LoadError::ProfileLengthMismatch(format!(
                "No exogenous load profile for {year} (available years: {})",
                self.years().join(", ")
            ))
            .into());
        };

        Ok(profile)
    }
}

fn check_daily_profile(year: u32, profile: &[f64]) -> Result<()> {
    if profile.len() != HOURS_PER_DAY {
        Err(LoadError::ProfileLengthMismatch(format!(
            "Profile for {year} has {} values, expected one per hour of the day ({HOURS_PER_DAY})",
            profile.len()
        )))?;
    }

    Ok(())
}

/// Repeat a daily profile for the given number of days
pub fn tile_daily_profile(profile: &[f64], n_days: usize) -> Vec<f64> {
    profile
        .iter()
        .copied()
        .cycle()
        .take(profile.len() * n_days)
        .collect()
}

/// Add exogenous load to every region in proportion to its share of the population.
///
/// The daily profile is repeated for every day of a (non-leap) year, so the table must already
/// have had any leap day removed.
///
/// # Arguments
///
/// * `table` - Scaled regional load for the target year
/// * `target_year` - The year of `table` (for error messages)
/// * `daily_profile` - System-wide exogenous load for each hour of the day
/// * `region_shares` - Each region's share of the total population
pub fn inject_exogenous_load(
    table: &RegionLoadTable,
    target_year: u32,
    daily_profile: &[f64],
    region_shares: &IndexMap<RegionID, f64>,
) -> Result<RegionLoadTable> {
    check_daily_profile(target_year, daily_profile)?;
    let tiled = tile_daily_profile(daily_profile, DAYS_PER_YEAR);
    if tiled.len() != table.n_rows() {
        Err(LoadError::ProfileLengthMismatch(format!(
            "Exogenous profile for {target_year} covers {} hours ({DAYS_PER_YEAR} days) but the \
            load table has {} rows",
            tiled.len(),
            table.n_rows()
        )))?;
    }

    if let Some(region) = table.ids().find(|id| !region_shares.contains_key(*id)) {
        Err(LoadError::SchemaMismatch(format!(
            "No population share for region {region}"
        )))?;
    }

    Ok(table.map_columns(|region, values| {
        let share = region_shares[region];
        values
            .iter()
            .zip(&tiled)
            .map(|(value, extra)| value + extra * share)
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, region_loads};
    use crate::load::HOURS_PER_YEAR;
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::rstest;

    fn daily_profile() -> Vec<f64> {
        (0..HOURS_PER_DAY).map(|hour| hour as f64 * 10.0).collect()
    }

    #[test]
    fn test_tile_daily_profile() {
        let tiled = tile_daily_profile(&[1.0, 2.0, 3.0], 3);
        assert_eq!(tiled, [1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    }

    #[rstest]
    fn test_inject_single_region_gets_everything(region_loads: RegionLoadTable) {
        let shares = indexmap! {"R1".into() => 1.0, "R2".into() => 0.0};
        let profile = daily_profile();
        let injected = inject_exogenous_load(&region_loads, 2030, &profile, &shares).unwrap();

        let tiled = tile_daily_profile(&profile, DAYS_PER_YEAR);
        let before_r1 = region_loads.column(&"R1".into()).unwrap();
        let after_r1 = injected.column(&"R1".into()).unwrap();
        for ((before, after), extra) in before_r1.iter().zip(after_r1).zip(&tiled) {
            assert_approx_eq!(f64, after - before, *extra, epsilon = 1e-9);
        }
        assert_eq!(
            injected.column(&"R2".into()),
            region_loads.column(&"R2".into())
        );
    }

    #[rstest]
    fn test_inject_split_by_share(region_loads: RegionLoadTable) {
        let shares = indexmap! {"R1".into() => 0.25, "R2".into() => 0.75};
        let profile = vec![4.0; HOURS_PER_DAY];
        let injected = inject_exogenous_load(&region_loads, 2030, &profile, &shares).unwrap();

        let added = injected.total_energy() - region_loads.total_energy();
        assert_approx_eq!(f64, added, 4.0 * HOURS_PER_YEAR as f64, epsilon = 1e-6);
        let added_r1 = injected.column_total(&"R1".into()).unwrap()
            - region_loads.column_total(&"R1".into()).unwrap();
        assert_approx_eq!(f64, added_r1, HOURS_PER_YEAR as f64, epsilon = 1e-6);
    }

    #[rstest]
    fn test_inject_zero_profile(region_loads: RegionLoadTable) {
        let shares = indexmap! {"R1".into() => 0.5, "R2".into() => 0.5};
        let injected =
            inject_exogenous_load(&region_loads, 2030, &[0.0; HOURS_PER_DAY], &shares).unwrap();
        assert_eq!(injected, region_loads);
    }

    #[rstest]
    fn test_inject_bad_profile_length(region_loads: RegionLoadTable) {
        let shares = indexmap! {"R1".into() => 0.5, "R2".into() => 0.5};
        assert_error!(
            inject_exogenous_load(&region_loads, 2030, &[1.0; 23], &shares),
            "Exogenous profile length mismatch: Profile for 2030 has 23 values, expected one per \
            hour of the day (24)"
        );
    }

    #[rstest]
    fn test_inject_leap_year_table(region_loads: RegionLoadTable) {
        let shares = indexmap! {"R1".into() => 0.5, "R2".into() => 0.5};
        let mut hours = region_loads.hours().to_vec();
        hours.extend_from_slice(&region_loads.hours()[..HOURS_PER_DAY]);
        let leap = RegionLoadTable::new(
            hours,
            indexmap! {"R1".into() => vec![0.0; 8784], "R2".into() => vec![0.0; 8784]},
        )
        .unwrap();
        assert_error!(
            inject_exogenous_load(&leap, 2030, &daily_profile(), &shares),
            "Exogenous profile length mismatch: Exogenous profile for 2030 covers 8760 hours (365 \
            days) but the load table has 8784 rows"
        );
    }

    #[rstest]
    fn test_inject_missing_share(region_loads: RegionLoadTable) {
        let shares = indexmap! {"R1".into() => 1.0};
        assert_error!(
            inject_exogenous_load(&region_loads, 2030, &daily_profile(), &shares),
            "Schema mismatch: No population share for region R2"
        );
    }

    #[test]
    fn test_profiles_get() {
        let profiles = ExogenousLoadProfiles::new(indexmap! {2030 => daily_profile()}).unwrap();
        assert_eq!(profiles.get(2030).unwrap(), daily_profile());
        assert_error!(
            profiles.get(2035),
            "Exogenous profile length mismatch: No exogenous load profile for 2035 (available \
            years: 2030)"
        );
    }

    #[test]
    fn test_profiles_new_bad_length() {
        assert_error!(
            ExogenousLoadProfiles::new(indexmap! {2030 => vec![1.0; 25]}),
            "Exogenous profile length mismatch: Profile for 2030 has 25 values, expected one per \
            hour of the day (24)"
        );
    }
}
