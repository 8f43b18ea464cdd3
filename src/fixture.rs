//! Fixtures for tests

use crate::aggregate::RegionLoadTable;
use crate::load::{RawZoneLoadTable, ZoneLoadTable};
use crate::population::{CountyMembership, CountyRecord, PopulationData, PopulationTable};
use crate::timestamp::HourStamp;
use crate::zone::ZoneVocabulary;
use chrono::{Datelike, NaiveDate};
use indexmap::indexmap;
use itertools::Itertools;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// The start of every hour in the given year, in order
pub fn hours_of_year(year: i32) -> Vec<HourStamp> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .unwrap()
        .iter_days()
        .take_while(|date| date.year() == year)
        .cartesian_product(0..24)
        .map(|(date, period)| HourStamp {
            year,
            month: date.month(),
            day: date.day(),
            period,
        })
        .collect()
}

/// Hour-ending labels for every hour in the given year, as they appear in load data files
pub fn hour_ending_labels(year: i32) -> Vec<String> {
    hours_of_year(year)
        .into_iter()
        .map(|hour| {
            format!(
                "{:02}/{:02}/{} {:02}:00",
                hour.month,
                hour.day,
                hour.year,
                hour.period + 1
            )
        })
        .collect()
}

/// A load series with a daily and seasonal shape
fn load_series(n_rows: usize, base: f64) -> Vec<f64> {
    (0..n_rows)
        .map(|i| {
            let hour = (i % 24) as f64;
            let day = (i / 24) as f64;
            base + 10.0 * (hour / 24.0 * std::f64::consts::TAU).sin().abs() + day / 36.5
        })
        .collect()
}

#[fixture]
pub fn zone_vocabulary() -> ZoneVocabulary {
    ZoneVocabulary::new(
        [("A", ["zone a"]), ("B", ["zone b"])],
        ["non-load"],
        ["TOTAL"],
    )
    .unwrap()
}

/// Three counties: two in zone A and one in zone B, split across regions R1 and R2
#[fixture]
pub fn county_memberships() -> Vec<CountyMembership> {
    [
        ("county1", "A", "R1"),
        ("county2", "A", "R2"),
        ("county3", "B", "R1"),
    ]
    .into_iter()
    .map(|(county, zone, region)| CountyMembership {
        county: county.into(),
        zone: zone.into(),
        region: region.into(),
    })
    .collect()
}

#[fixture]
pub fn population_table(county_memberships: Vec<CountyMembership>) -> PopulationTable {
    PopulationTable {
        year: 2021,
        counties: county_memberships
            .into_iter()
            .zip([10.0, 20.0, 30.0])
            .map(|(membership, population)| CountyRecord {
                county: membership.county,
                zone: membership.zone,
                region: membership.region,
                population,
            })
            .collect(),
    }
}

#[fixture]
pub fn population_data(county_memberships: Vec<CountyMembership>) -> PopulationData {
    PopulationData::new(
        county_memberships,
        indexmap! {
            2020 => vec![9.0, 18.0, 27.0],
            2021 => vec![10.0, 20.0, 30.0],
        },
        vec!["R1".into(), "R2".into()],
    )
    .unwrap()
}

/// Zonal load as read from file, with a whole year of hour-ending labels
pub fn raw_zone_loads(year: i32) -> RawZoneLoadTable {
    let hour_ending = hour_ending_labels(year);
    let n_rows = hour_ending.len();
    RawZoneLoadTable {
        hour_ending,
        loads: indexmap! {
            "A".into() => load_series(n_rows, 100.0),
            "B".into() => load_series(n_rows, 40.0),
        },
    }
}

#[fixture]
pub fn zone_loads() -> ZoneLoadTable {
    let hours = hours_of_year(2021);
    let n_rows = hours.len();
    ZoneLoadTable::new(
        hours,
        indexmap! {
            "A".into() => load_series(n_rows, 100.0),
            "B".into() => load_series(n_rows, 40.0),
        },
    )
    .unwrap()
}

#[fixture]
pub fn region_loads() -> RegionLoadTable {
    let hours = hours_of_year(2021);
    let n_rows = hours.len();
    RegionLoadTable::new(
        hours,
        indexmap! {
            "R1".into() => load_series(n_rows, 70.0),
            "R2".into() => load_series(n_rows, 50.0),
        },
    )
    .unwrap()
}
