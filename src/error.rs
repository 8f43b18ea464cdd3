//! The conditions which abort a unit of work in the load profile pipeline.
//!
//! These are raised through [`anyhow`], so callers which need to classify a failure can use
//! `err.downcast_ref::<LoadError>()`.
use derive_more::Display;

/// A structural problem with the input data.
///
/// None of these are transient, so they are never retried.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum LoadError {
    /// An hour-ending label could not be converted into calendar components
    #[display("Malformed timestamp '{label}': {reason}")]
    MalformedTimestamp {
        /// The offending label, as it appeared in the input
        label: String,
        /// Why it was rejected
        reason: String,
    },
    /// A group's total population is zero, so shares of it are undefined
    #[display("Total population of {group_kind} '{group}' is zero")]
    EmptyGroup {
        /// What kind of group this is (e.g. "zone")
        group_kind: &'static str,
        /// The name of the group
        group: String,
    },
    /// An input table does not have the expected shape or vocabulary
    #[display("Schema mismatch: {_0}")]
    SchemaMismatch(String),
    /// Aggregating into regions changed the total energy by more than the tolerance
    #[display(
        "Total energy changed by {gap} after aggregating zones into regions \
        (zones: {zone_total}, regions: {region_total}, tolerance: {tolerance})"
    )]
    EnergyConservationViolation {
        /// Absolute difference between the totals
        gap: f64,
        /// Total energy across all zones
        zone_total: f64,
        /// Total energy across all regions
        region_total: f64,
        /// The largest permitted gap
        tolerance: f64,
    },
    /// The base year profile has no energy, so it cannot be matched to a reference total
    #[display(
        "Cannot rescale to intermediate year {intermediate_year}: total energy of base year \
        {base_year} is zero"
    )]
    DegenerateEnergyTotal {
        /// The base year of the profile
        base_year: u32,
        /// The year whose total energy was to be matched
        intermediate_year: u32,
    },
    /// An exogenous daily profile does not line up with the rows of a load table
    #[display("Exogenous profile length mismatch: {_0}")]
    ProfileLengthMismatch(String),
}

impl std::error::Error for LoadError {}
