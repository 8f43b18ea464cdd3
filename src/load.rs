//! Hourly load tables, indexed by zone or by region.
use crate::error::LoadError;
use crate::id::IDLike;
use crate::timestamp::HourStamp;
use crate::zone::ZoneID;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;

/// The number of hours in a day
pub const HOURS_PER_DAY: usize = 24;

/// The number of days in a (non-leap) year
pub const DAYS_PER_YEAR: usize = 365;

/// The number of hourly rows in a non-leap year
pub const HOURS_PER_YEAR: usize = HOURS_PER_DAY * DAYS_PER_YEAR;

/// The number of hourly rows in a leap year
pub const HOURS_PER_LEAP_YEAR: usize = HOURS_PER_YEAR + HOURS_PER_DAY;

/// Zonal load data as read from file, before the hour-ending labels have been interpreted
#[derive(Debug, Clone, PartialEq)]
pub struct RawZoneLoadTable {
    /// The "Hour Ending" label for each row
    pub hour_ending: Vec<String>,
    /// Load for each zone, one value per row
    pub loads: IndexMap<ZoneID, Vec<f64>>,
}

impl RawZoneLoadTable {
    /// Total energy across all zones and rows
    pub fn total_energy(&self) -> f64 {
        self.loads.values().flatten().sum()
    }
}

/// An hourly load table with one column per ID (zone or region).
///
/// All columns have one value per row and the rows are in time order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTable<ID: IDLike> {
    hours: Vec<HourStamp>,
    columns: IndexMap<ID, Vec<f64>>,
}

/// Load for each zone
pub type ZoneLoadTable = LoadTable<ZoneID>;

impl<ID: IDLike> LoadTable<ID> {
    /// Create a new [`LoadTable`], checking that every column has one value per row
    pub fn new(hours: Vec<HourStamp>, columns: IndexMap<ID, Vec<f64>>) -> Result<Self> {
        for (id, values) in &columns {
            ensure!(
                values.len() == hours.len(),
                "Column {id} has {} values but there are {} rows",
                values.len(),
                hours.len()
            );
        }

        Ok(Self { hours, columns })
    }

    /// The number of rows
    pub fn n_rows(&self) -> usize {
        self.hours.len()
    }

    /// The time of each row
    pub fn hours(&self) -> &[HourStamp] {
        &self.hours
    }

    /// Iterate over the column IDs in order
    pub fn ids(&self) -> impl Iterator<Item = &ID> {
        self.columns.keys()
    }

    /// Iterate over the columns in order
    pub fn iter(&self) -> impl Iterator<Item = (&ID, &[f64])> {
        self.columns.iter().map(|(id, values)| (id, values.as_slice()))
    }

    /// Get the values for one column
    pub fn column(&self, id: &ID) -> Option<&[f64]> {
        self.columns.get(id).map(Vec::as_slice)
    }

    /// Total energy of one column
    pub fn column_total(&self, id: &ID) -> Option<f64> {
        self.column(id).map(|values| values.iter().sum())
    }

    /// Total energy across all columns and rows
    pub fn total_energy(&self) -> f64 {
        self.columns.values().flatten().sum()
    }

    /// A copy of this table with every value multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        self.map_columns(|_, values| values.iter().map(|value| value * factor).collect())
    }

    /// Build a new table with the same rows by transforming each column
    pub fn map_columns<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&ID, &[f64]) -> Vec<f64>,
    {
        Self {
            hours: self.hours.clone(),
            columns: self
                .columns
                .iter()
                .map(|(id, values)| (id.clone(), f(id, values)))
                .collect(),
        }
    }

    /// Remove the 24 rows of 29 February, if this is a leap-year table.
    ///
    /// Tables with [`HOURS_PER_YEAR`] rows are returned unchanged. For [`HOURS_PER_LEAP_YEAR`]
    /// rows, the leap day is found from the calendar rather than assumed to be at a fixed
    /// position; it must be a single contiguous day.
    pub fn without_leap_day(self) -> Result<Self> {
        match self.n_rows() {
            HOURS_PER_YEAR => Ok(self),
            HOURS_PER_LEAP_YEAR => {
                let rows = self
                    .hours
                    .iter()
                    .positions(HourStamp::is_leap_day)
                    .collect_vec();
                let (Some(&first), Some(&last)) = (rows.first(), rows.last()) else {
                    return Err(LoadError::SchemaMismatch(format!(
                        "Table has {HOURS_PER_LEAP_YEAR} rows but none fall on 29 February"
                    ))
                    .into());
                };
                if rows.len() != HOURS_PER_DAY || last - first + 1 != HOURS_PER_DAY {
                    Err(LoadError::SchemaMismatch(format!(
                        "Expected 29 February to span {HOURS_PER_DAY} consecutive rows, found \
                        {} rows between rows {first} and {last}",
                        rows.len()
                    )))?;
                }

                Ok(self.without_rows(first..=last))
            }
            n => Err(LoadError::SchemaMismatch(format!(
                "Expected {HOURS_PER_YEAR} or {HOURS_PER_LEAP_YEAR} hourly rows, found {n}"
            )))?,
        }
    }

    fn without_rows(self, range: std::ops::RangeInclusive<usize>) -> Self {
        let keep = |i: &usize| !range.contains(i);
        Self {
            hours: (0..self.hours.len())
                .filter(keep)
                .map(|i| self.hours[i])
                .collect(),
            columns: self
                .columns
                .into_iter()
                .map(|(id, values)| {
                    let values = values
                        .into_iter()
                        .enumerate()
                        .filter(|(i, _)| keep(i))
                        .map(|(_, value)| value)
                        .collect();
                    (id, values)
                })
                .collect(),
        }
    }
}

/// Check that a table has a whole (possibly leap) year of hourly rows
pub fn check_hourly_row_count(n_rows: usize) -> Result<()> {
    if n_rows != HOURS_PER_YEAR && n_rows != HOURS_PER_LEAP_YEAR {
        Err(LoadError::SchemaMismatch(format!(
            "Expected {HOURS_PER_YEAR} or {HOURS_PER_LEAP_YEAR} hourly rows, found {n_rows}"
        )))?;
    }

    Ok(())
}
