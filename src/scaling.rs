//! Rescaling of a base year's regional load profile to future years.
//!
//! Scaling happens in two stages:
//!
//! 1. If an intermediate year later than the base year is supplied, the profile is multiplied by
//!    a constant so that its total energy matches that of the intermediate year. This keeps the
//!    base year's shape while anchoring its level to a more recent year.
//! 2. The profile is grown by a compound annual factor for every year between the anchor year
//!    (the intermediate year if stage 1 applied, otherwise the base year) and the target year.
//!    Target years before the anchor year shrink the profile.
use crate::aggregate::RegionLoadTable;
use crate::error::LoadError;
use anyhow::{Result, ensure};
use log::info;

/// The default annual load growth factor
pub const DEFAULT_GROWTH_FACTOR: f64 = 1.018;

/// A reference year whose total annual energy a base profile should be matched to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntermediateReference {
    /// The reference year
    pub year: u32,
    /// Total energy in the reference year, across all zones and hours
    pub total_energy: f64,
}

/// Scales regional load profiles to target years
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearScaler {
    growth_factor: f64,
    intermediate: Option<IntermediateReference>,
}

impl YearScaler {
    /// Create a new [`YearScaler`]
    pub fn new(growth_factor: f64, intermediate: Option<IntermediateReference>) -> Result<Self> {
        ensure!(
            growth_factor.is_finite() && growth_factor > 0.0,
            "Growth factor must be a finite number greater than zero"
        );

        Ok(Self {
            growth_factor,
            intermediate,
        })
    }

    /// The intermediate reference which applies to the base year, if any
    fn intermediate_for(&self, base_year: u32) -> Option<&IntermediateReference> {
        self.intermediate
            .as_ref()
            .filter(|intermediate| base_year < intermediate.year)
    }

    /// The year from which growth is compounded for profiles with the given base year
    pub fn anchor_year(&self, base_year: u32) -> u32 {
        self.intermediate_for(base_year)
            .map_or(base_year, |intermediate| intermediate.year)
    }

    /// The intermediate year which profiles with the given base year are matched to, if any
    pub fn intermediate_year(&self, base_year: u32) -> Option<u32> {
        self.intermediate_for(base_year)
            .map(|intermediate| intermediate.year)
    }

    /// The multiplier which matches the base year's energy to the intermediate year's.
    ///
    /// This is 1 if there is no intermediate year or it is not later than the base year.
    ///
    /// # Arguments
    ///
    /// * `base_year` - The year of the profile
    /// * `base_total` - Total energy of the whole base year
    pub fn intermediate_factor(&self, base_year: u32, base_total: f64) -> Result<f64> {
        let Some(intermediate) = self.intermediate_for(base_year) else {
            return Ok(1.0);
        };

        if base_total == 0.0 {
            Err(LoadError::DegenerateEnergyTotal {
                base_year,
                intermediate_year: intermediate.year,
            })?;
        }

        Ok(intermediate.total_energy / base_total)
    }

    /// The compound growth multiplier from the anchor year to the target year
    pub fn growth_multiplier(&self, base_year: u32, target_year: u32) -> f64 {
        let n_years = i64::from(target_year) - i64::from(self.anchor_year(base_year));
        self.growth_factor.powf(n_years as f64)
    }

    /// Log how profiles for the given base year will be scaled
    pub fn log_plan(&self, base_year: u32) {
        match (self.intermediate, self.intermediate_for(base_year)) {
            (_, Some(intermediate)) => info!(
                "Base year {base_year} will be matched to the energy of {} and grown from there",
                intermediate.year
            ),
            (Some(intermediate), None) => info!(
                "Base year {base_year} is not earlier than intermediate year {}, so will be \
                grown from the base year",
                intermediate.year
            ),
            (None, None) => info!("Base year {base_year} will be grown from the base year"),
        }
    }

    /// Scale a base year profile to a target year.
    ///
    /// # Arguments
    ///
    /// * `profile` - Regional load for the base year
    /// * `base_year` - The year of `profile`
    /// * `base_total` - Total energy of the whole base year (before any leap day was removed)
    /// * `target_year` - The year to scale to
    pub fn scale(
        &self,
        profile: &RegionLoadTable,
        base_year: u32,
        base_total: f64,
        target_year: u32,
    ) -> Result<RegionLoadTable> {
        let factor = self.intermediate_factor(base_year, base_total)?
            * self.growth_multiplier(base_year, target_year);

        Ok(profile.scaled(factor))
    }
}
