//! Functionality for turning zonal load data into regional load profiles for target years.
//!
//! Each base year is processed independently. A base year passes through these stages:
//!
//! 1. Normalising: hour-ending labels are converted to calendar components.
//! 2. Allocating: county shares of zone and total population are calculated.
//! 3. Aggregating: zonal load is shared out between counties and summed by region.
//! 4. Validating: total energy is checked and any leap day is removed.
//!
//! Then, for every target year:
//!
//! 5. Scaling: the profile is matched to the intermediate year (if any) and grown.
//! 6. Injecting: exogenous load is added to each region.
//!
//! A failure in stages 1-4 means no profiles are produced for that base year, whereas a failure
//! in stages 5-6 only affects a single target year.
use crate::aggregate::{RegionLoadTable, aggregate_to_regions, check_energy_conserved};
use crate::allocation::AllocationRatios;
use crate::config::RunConfig;
use crate::exogenous::{ExogenousLoadProfiles, inject_exogenous_load};
use crate::input::load::read_zone_load_table;
use crate::load::{RawZoneLoadTable, ZoneLoadTable, check_hourly_row_count};
use crate::output::{profile_file_path, write_load_profile};
use crate::population::PopulationData;
use crate::region::RegionID;
use crate::scaling::YearScaler;
use crate::timestamp::normalise_labels;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use strum::Display;

/// The stages through which load data passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    /// Reading input data
    Init,
    /// Interpreting hour-ending labels
    Normalizing,
    /// Calculating population shares
    Allocating,
    /// Converting zonal load into regional load
    Aggregating,
    /// Checking energy is conserved and removing leap days
    Validating,
    /// Scaling to a target year
    Scaling,
    /// Adding exogenous load
    Injecting,
    /// A profile has been produced
    Done,
}

/// Log that a unit of work has entered a stage
fn enter_stage(base_year: u32, target_year: Option<u32>, stage: Stage) {
    match target_year {
        Some(target_year) => debug!("Base year {base_year}, target year {target_year}: {stage}"),
        None => debug!("Base year {base_year}: {stage}"),
    }
}

/// Inputs shared by every base year and target year
#[derive(Debug)]
pub struct PipelineInputs {
    /// County memberships and populations
    pub population: PopulationData,
    /// Daily exogenous load for each target year
    pub exogenous_loads: ExogenousLoadProfiles,
    /// How profiles are scaled to target years
    pub scaler: YearScaler,
    /// Largest permitted change in energy when aggregating zones into regions
    pub energy_tolerance: f64,
    /// Years for which profiles are produced
    pub target_years: Vec<u32>,
}

/// A validated regional load profile for a base year, ready to be scaled to target years
#[derive(Debug, Clone, PartialEq)]
pub struct BaseYearProfile {
    /// The base year
    pub base_year: u32,
    /// Total energy of the whole base year, before any leap day was removed
    pub base_total: f64,
    /// Regional load for a 365-day year
    pub regional_loads: RegionLoadTable,
    /// Each region's share of the total population in the base year
    pub region_shares: IndexMap<RegionID, f64>,
}

/// Take a base year's zonal load data through normalisation, allocation, aggregation and
/// validation.
///
/// # Arguments
///
/// * `base_year` - The year of the load data
/// * `raw` - Zonal load data as read from file
/// * `inputs` - Shared inputs
pub fn prepare_base_year(
    base_year: u32,
    raw: RawZoneLoadTable,
    inputs: &PipelineInputs,
) -> Result<BaseYearProfile> {
    enter_stage(base_year, None, Stage::Normalizing);
    check_hourly_row_count(raw.hour_ending.len())?;
    let report = normalise_labels(&raw.hour_ending);
    let duplicates = report.duplicate_hours();
    if !duplicates.is_empty() {
        warn!(
            "Base year {base_year}: {} hour(s) appear twice (clock change); both rows are kept: {}",
            duplicates.len(),
            duplicates.iter().join(", ")
        );
    }
    let hours = report.into_hours()?;
    let n_other_year = hours
        .iter()
        .filter(|hour| i64::from(hour.year) != i64::from(base_year))
        .count();
    if n_other_year > 0 {
        warn!("Base year {base_year}: {n_other_year} row(s) are dated in a different year");
    }
    let zone_loads = ZoneLoadTable::new(hours, raw.loads)?;

    enter_stage(base_year, None, Stage::Allocating);
    let population = inputs.population.for_year(base_year)?;
    let ratios = AllocationRatios::from_population(&population)?;

    enter_stage(base_year, None, Stage::Aggregating);
    let regional_loads = aggregate_to_regions(
        &zone_loads,
        &population,
        &ratios.zone_shares,
        inputs.population.regions(),
    )?;

    enter_stage(base_year, None, Stage::Validating);
    let gap = check_energy_conserved(&zone_loads, &regional_loads, inputs.energy_tolerance)?;
    debug!("Base year {base_year}: energy changed by {gap} after aggregation");
    let base_total = zone_loads.total_energy();
    let n_rows = regional_loads.n_rows();
    let regional_loads = regional_loads.without_leap_day()?;
    if regional_loads.n_rows() != n_rows {
        info!("Base year {base_year}: removed 29 February");
    }

    Ok(BaseYearProfile {
        base_year,
        base_total,
        regional_loads,
        region_shares: ratios.region_shares,
    })
}

impl BaseYearProfile {
    /// Scale this profile to a target year and add exogenous load
    pub fn for_target_year(
        &self,
        target_year: u32,
        inputs: &PipelineInputs,
    ) -> Result<RegionLoadTable> {
        enter_stage(self.base_year, Some(target_year), Stage::Scaling);
        let scaled = inputs.scaler.scale(
            &self.regional_loads,
            self.base_year,
            self.base_total,
            target_year,
        )?;

        enter_stage(self.base_year, Some(target_year), Stage::Injecting);
        let daily_profile = inputs.exogenous_loads.get(target_year)?;
        let profile =
            inject_exogenous_load(&scaled, target_year, daily_profile, &self.region_shares)?;

        enter_stage(self.base_year, Some(target_year), Stage::Done);
        Ok(profile)
    }
}

/// A unit of work which failed
#[derive(Debug)]
pub struct UnitFailure {
    /// The base year concerned
    pub base_year: u32,
    /// The target year concerned, or `None` if the whole base year failed
    pub target_year: Option<u32>,
    /// What went wrong
    pub error: anyhow::Error,
}

/// The outcome of processing every base year
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Files written for each base year
    pub written: IndexMap<u32, Vec<PathBuf>>,
    /// Units of work which failed
    pub failures: Vec<UnitFailure>,
}

impl RunSummary {
    /// Whether every unit of work succeeded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The total number of files written
    pub fn n_written(&self) -> usize {
        self.written.values().map(Vec::len).sum()
    }

    fn record_failure(&mut self, base_year: u32, target_year: Option<u32>, error: anyhow::Error) {
        match target_year {
            Some(target_year) => error!(
                "Failed to produce profile for base year {base_year}, target year \
                {target_year}: {error:#}"
            ),
            None => error!("Failed to process base year {base_year}: {error:#}"),
        }

        self.failures.push(UnitFailure {
            base_year,
            target_year,
            error,
        });
    }

    /// Log the number of files written and failures for each base year
    fn log(&self, base_years: impl Iterator<Item = u32>) {
        for base_year in base_years {
            let n_written = self.written.get(&base_year).map_or(0, Vec::len);
            let n_failed = self
                .failures
                .iter()
                .filter(|failure| failure.base_year == base_year)
                .count();
            info!("Base year {base_year}: {n_written} profile(s) written, {n_failed} failure(s)");
        }
    }
}

/// Read a base year's load file and prepare its regional profile
fn load_base_year(
    base_year: u32,
    load_file: &Path,
    config: &RunConfig,
    inputs: &PipelineInputs,
) -> Result<BaseYearProfile> {
    enter_stage(base_year, None, Stage::Init);
    let raw = read_zone_load_table(load_file, &config.zones)?;
    info!(
        "Base year {base_year}: read {} rows of load data for {} zones",
        raw.hour_ending.len(),
        raw.loads.len()
    );

    prepare_base_year(base_year, raw, inputs)
}

/// Produce a load profile for every base year and target year, writing each to `output_dir`.
///
/// Failures are logged and recorded in the returned summary rather than stopping the run.
pub fn run(config: &RunConfig, inputs: &PipelineInputs, output_dir: &Path) -> RunSummary {
    let mut summary = RunSummary::default();
    for (&base_year, load_file) in &config.load_files {
        info!("Base year: {base_year}");
        inputs.scaler.log_plan(base_year);
        summary.written.insert(base_year, Vec::new());

        let profile = match load_base_year(base_year, load_file, config, inputs) {
            Ok(profile) => profile,
            Err(error) => {
                summary.record_failure(base_year, None, error);
                continue;
            }
        };

        let intermediate_year = inputs.scaler.intermediate_year(base_year);
        for &target_year in &inputs.target_years {
            let file_path =
                profile_file_path(output_dir, base_year, intermediate_year, target_year);
            let result = profile
                .for_target_year(target_year, inputs)
                .and_then(|table| {
                    write_load_profile(&file_path, &table)
                        .with_context(|| format!("Could not write {}", file_path.display()))
                });

            match result {
                Ok(()) => {
                    info!("Wrote {}", file_path.display());
                    summary.written[&base_year].push(file_path);
                }
                Err(error) => summary.record_failure(base_year, Some(target_year), error),
            }
        }
    }

    summary.log(config.base_years());
    summary
}

/// Check every base year up to and including validation, without writing any output
pub fn validate(config: &RunConfig, inputs: &PipelineInputs) -> RunSummary {
    let mut summary = RunSummary::default();
    for (&base_year, load_file) in &config.load_files {
        summary.written.insert(base_year, Vec::new());
        match load_base_year(base_year, load_file, config, inputs) {
            Ok(profile) => info!(
                "Base year {base_year} is valid ({} regions, total energy {})",
                profile.regional_loads.ids().count(),
                profile.base_total
            ),
            Err(error) => summary.record_failure(base_year, None, error),
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::fixture::{population_data, raw_zone_loads, zone_loads, zone_vocabulary};
    use crate::load::{HOURS_PER_DAY, HOURS_PER_YEAR};
    use crate::scaling::IntermediateReference;
    use crate::zone::{ZoneID, ZoneVocabulary};
    use float_cmp::{approx_eq, assert_approx_eq};
    use indexmap::indexmap;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn exogenous_loads(years: &[u32], value: f64) -> ExogenousLoadProfiles {
        ExogenousLoadProfiles::new(
            years
                .iter()
                .map(|year| (*year, vec![value; HOURS_PER_DAY]))
                .collect(),
        )
        .unwrap()
    }

    #[fixture]
    fn inputs(population_data: PopulationData) -> PipelineInputs {
        PipelineInputs {
            population: population_data,
            exogenous_loads: exogenous_loads(&[2021, 2030], 0.0),
            scaler: YearScaler::new(1.0, None).unwrap(),
            energy_tolerance: 1e-4,
            target_years: vec![2021, 2030],
        }
    }

    #[rstest]
    fn test_end_to_end(inputs: PipelineInputs, zone_loads: ZoneLoadTable) {
        let profile = prepare_base_year(2021, raw_zone_loads(2021), &inputs).unwrap();
        let table = profile.for_target_year(2021, &inputs).unwrap();
        assert_eq!(table.n_rows(), HOURS_PER_YEAR);

        let a = zone_loads.column(&"A".into()).unwrap();
        let b = zone_loads.column(&"B".into()).unwrap();
        let r1 = table.column(&"R1".into()).unwrap();
        let r2 = table.column(&"R2".into()).unwrap();
        for i in 0..HOURS_PER_YEAR {
            assert_approx_eq!(f64, r1[i], a[i] / 3.0 + b[i], epsilon = 1e-9);
            assert_approx_eq!(f64, r2[i], 2.0 * a[i] / 3.0, epsilon = 1e-9);
        }
        assert!(approx_eq!(
            f64,
            table.total_energy(),
            zone_loads.total_energy(),
            epsilon = 1e-4
        ));
    }

    #[rstest]
    fn test_exogenous_load_goes_to_only_populated_region(mut inputs: PipelineInputs) {
        // County 2 (the only one in R2) has no people, so R1 gets all the exogenous load
        inputs.population = PopulationData::new(
            crate::fixture::county_memberships(),
            indexmap! {2021 => vec![10.0, 0.0, 30.0]},
            vec!["R1".into(), "R2".into()],
        )
        .unwrap();
        inputs.exogenous_loads = exogenous_loads(&[2021], 5.0);

        let profile = prepare_base_year(2021, raw_zone_loads(2021), &inputs).unwrap();
        let table = profile.for_target_year(2021, &inputs).unwrap();
        let r1_before = profile.regional_loads.column(&"R1".into()).unwrap();
        let r2_before = profile.regional_loads.column(&"R2".into()).unwrap();
        let r1_after = table.column(&"R1".into()).unwrap();
        let r2_after = table.column(&"R2".into()).unwrap();
        for i in 0..HOURS_PER_YEAR {
            assert_approx_eq!(f64, r1_after[i], r1_before[i] + 5.0);
            assert_approx_eq!(f64, r2_after[i], r2_before[i]);
        }
    }

    #[rstest]
    fn test_leap_year_base(inputs: PipelineInputs) {
        let raw = raw_zone_loads(2020);
        let raw_total = raw.total_energy();
        let leap_day_total: f64 = raw
            .hour_ending
            .iter()
            .positions(|label| label.starts_with("02/29/"))
            .map(|i| raw.loads.values().map(|values| values[i]).sum::<f64>())
            .sum();

        let profile = prepare_base_year(2020, raw, &inputs).unwrap();
        assert_eq!(profile.regional_loads.n_rows(), HOURS_PER_YEAR);
        assert_approx_eq!(f64, profile.base_total, raw_total, epsilon = 1e-6);
        assert_approx_eq!(
            f64,
            profile.regional_loads.total_energy(),
            raw_total - leap_day_total,
            epsilon = 1e-4
        );
        assert!(
            profile
                .regional_loads
                .hours()
                .iter()
                .all(|hour| !hour.is_leap_day())
        );
    }

    #[rstest]
    fn test_growth_with_intermediate(mut inputs: PipelineInputs) {
        let raw = raw_zone_loads(2021);
        let base_total = raw.total_energy();
        inputs.scaler = YearScaler::new(
            1.02,
            Some(IntermediateReference {
                year: 2025,
                total_energy: 2.0 * base_total,
            }),
        )
        .unwrap();

        let profile = prepare_base_year(2021, raw, &inputs).unwrap();
        let table = profile.for_target_year(2030, &inputs).unwrap();
        assert_approx_eq!(
            f64,
            table.total_energy(),
            2.0 * base_total * 1.02f64.powi(5),
            epsilon = 1e-3
        );
    }

    #[rstest]
    fn test_malformed_timestamp(inputs: PipelineInputs) {
        let mut raw = raw_zone_loads(2021);
        raw.hour_ending[100] = "not a time".into();
        let err = prepare_base_year(2021, raw, &inputs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::MalformedTimestamp { .. })
        ));
    }

    #[rstest]
    fn test_wrong_row_count(inputs: PipelineInputs) {
        let mut raw = raw_zone_loads(2021);
        raw.hour_ending.pop();
        for values in raw.loads.values_mut() {
            values.pop();
        }
        let err = prepare_base_year(2021, raw, &inputs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::SchemaMismatch(_))
        ));
    }

    #[rstest]
    fn test_missing_population_year(inputs: PipelineInputs) {
        let err = prepare_base_year(2019, raw_zone_loads(2019), &inputs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::SchemaMismatch(_))
        ));
    }

    #[rstest]
    fn test_empty_zone(mut inputs: PipelineInputs) {
        inputs.population = PopulationData::new(
            crate::fixture::county_memberships(),
            indexmap! {2021 => vec![10.0, 20.0, 0.0]},
            vec!["R1".into(), "R2".into()],
        )
        .unwrap();
        let err = prepare_base_year(2021, raw_zone_loads(2021), &inputs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::EmptyGroup { .. })
        ));
    }

    #[rstest]
    fn test_missing_exogenous_year(inputs: PipelineInputs) {
        let profile = prepare_base_year(2021, raw_zone_loads(2021), &inputs).unwrap();
        let err = profile.for_target_year(2035, &inputs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::ProfileLengthMismatch(_))
        ));
    }

    /// Write a raw zone load table to a CSV file in the same form as real data files
    fn write_load_file(path: &Path, raw: &RawZoneLoadTable) {
        let mut file = File::create(path).unwrap();
        writeln!(file, "Hour Ending,{},TOTAL", raw.loads.keys().join(",")).unwrap();
        for (i, label) in raw.hour_ending.iter().enumerate() {
            let values = raw.loads.values().map(|values| values[i]).collect_vec();
            let total: f64 = values.iter().sum();
            writeln!(file, "{label},{},{total}", values.iter().join(",")).unwrap();
        }
    }

    fn config(dir: &Path, zones: ZoneVocabulary, base_years: &[u32]) -> RunConfig {
        RunConfig {
            target_years: vec![2021, 2030],
            growth_factor: 1.0,
            energy_tolerance: 1e-4,
            population_file: dir.join("population.csv"),
            exogenous_load_file: dir.join("ev.csv"),
            region_order: None,
            load_files: base_years
                .iter()
                .map(|year| (*year, dir.join(format!("load_{year}.csv"))))
                .collect(),
            intermediate: None,
            zones,
        }
    }

    #[rstest]
    fn test_run(mut inputs: PipelineInputs, zone_vocabulary: ZoneVocabulary) {
        let dir = tempdir().unwrap();
        write_load_file(&dir.path().join("load_2021.csv"), &raw_zone_loads(2021));
        write_load_file(&dir.path().join("load_2020.csv"), &raw_zone_loads(2020));

        // No exogenous load for 2030, so that target year fails for every base year
        inputs.exogenous_loads = exogenous_loads(&[2021], 1.0);
        let config = config(dir.path(), zone_vocabulary, &[2021, 2020, 2019]);
        let output_dir = dir.path().join("output");
        let summary = run(&config, &inputs, &output_dir);

        assert!(!summary.is_success());
        assert_eq!(summary.n_written(), 2);
        assert!(
            output_dir
                .join("load_base_2021")
                .join("load_base2021_model2021.csv")
                .is_file()
        );
        assert!(
            output_dir
                .join("load_base_2020")
                .join("load_base2020_model2021.csv")
                .is_file()
        );

        let failed_units = summary
            .failures
            .iter()
            .map(|failure| (failure.base_year, failure.target_year))
            .collect_vec();
        assert_eq!(
            failed_units,
            [(2021, Some(2030)), (2020, Some(2030)), (2019, None)]
        );
    }

    #[rstest]
    fn test_validate(inputs: PipelineInputs, zone_vocabulary: ZoneVocabulary) {
        let dir = tempdir().unwrap();
        let mut raw = raw_zone_loads(2021);
        raw.loads.shift_remove(&ZoneID::new("B"));
        write_load_file(&dir.path().join("load_2021.csv"), &raw_zone_loads(2021));
        write_load_file(&dir.path().join("load_2020.csv"), &raw);

        let config = config(dir.path(), zone_vocabulary, &[2021, 2020]);
        let summary = validate(&config, &inputs);
        assert_eq!(summary.n_written(), 0);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].base_year, 2020);
        assert!(matches!(
            summary.failures[0].error.downcast_ref::<LoadError>(),
            Some(LoadError::SchemaMismatch(_))
        ));
    }
}
