//! Conversion of "hour ending" labels into calendar components.
//!
//! Load data is labelled with the time at which each hour *ends* (e.g. "01/01/2021 01:00" is the
//! first hour of the year) and the hour after the autumn clock change is repeated with a "DST"
//! suffix. Every label is shifted back by one hour to give the start of the interval. The DST
//! marker is removed without any other special treatment, so a repeated hour yields two rows
//! with the same calendar components. These rows are kept distinct (never merged).
use crate::error::LoadError;
use anyhow::Result;
use chrono::{Datelike, NaiveDateTime, Timelike};
use itertools::Itertools;
use log::warn;
use std::fmt;

/// Suffix marking the repeated hour at the end of daylight saving time
const DST_MARKER: &str = "DST";

/// Date formats accepted in hour-ending labels
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Calendar components for the start of an hourly interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HourStamp {
    /// Calendar year
    pub year: i32,
    /// Month of year (1-12)
    pub month: u32,
    /// Day of month (1-31)
    pub day: u32,
    /// Hour of day (0-23)
    pub period: u32,
}

impl HourStamp {
    /// Whether this hour falls on 29 February
    pub fn is_leap_day(&self) -> bool {
        self.month == 2 && self.day == 29
    }
}

impl From<NaiveDateTime> for HourStamp {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            period: dt.hour(),
        }
    }
}

impl fmt::Display for HourStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} hour {}",
            self.year, self.month, self.day, self.period
        )
    }
}

/// An hour-ending label split into its parts
#[derive(Debug, PartialEq)]
struct LabelParts<'a> {
    date: &'a str,
    hour: u32,
    minute: &'a str,
    dst: bool,
}

/// Split a label into date, hour and minute, removing any DST marker
fn split_label(label: &str) -> Result<LabelParts<'_>, String> {
    let label = label.trim();
    let (body, dst) = match label.strip_suffix(DST_MARKER) {
        Some(body) => (body.trim_end(), true),
        None => (label, false),
    };

    let (date, time) = body
        .rsplit_once(char::is_whitespace)
        .ok_or("no time of day found")?;
    let (hour, minute) = time
        .split_once(':')
        .ok_or_else(|| format!("time '{time}' is not in H:MM form"))?;
    if hour.is_empty() || hour.len() > 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("hour '{hour}' is not a number"));
    }
    if minute.len() != 2 || !minute.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("minute '{minute}' is not a two-digit number"));
    }

    let hour: u32 = hour.parse().map_err(|_| format!("hour '{hour}' is invalid"))?;
    if !(1..=24).contains(&hour) {
        return Err(format!("hour ending {hour} is not between 1 and 24"));
    }

    Ok(LabelParts {
        date: date.trim_end(),
        hour,
        minute,
        dst,
    })
}

/// Rewrite an hour-ending label as the label for the start of the same hour.
///
/// The DST marker is dropped and the hour is always zero-padded, e.g. "01/01/2021 10:00" becomes
/// "01/01/2021 09:00" and "11/07/2021 02:00DST" becomes "11/07/2021 01:00".
pub fn hour_start_label(label: &str) -> Result<String, String> {
    let parts = split_label(label)?;
    Ok(format!("{} {:02}:{}", parts.date, parts.hour - 1, parts.minute))
}

/// Inverse of [`hour_start_label`]: turn an hour-start label back into an hour-ending label.
///
/// The result is in canonical form: a two-digit hour with the DST marker appended directly, so
/// "01/01/2021 1:00" and "11/07/2021 02:00 DST" come back as "01/01/2021 01:00" and
/// "11/07/2021 02:00DST".
pub fn hour_ending_label(start_label: &str, dst: bool) -> Result<String, String> {
    let (date, time) = start_label
        .trim()
        .rsplit_once(char::is_whitespace)
        .ok_or("no time of day found")?;
    let (hour, minute) = time
        .split_once(':')
        .ok_or_else(|| format!("time '{time}' is not in H:MM form"))?;
    let hour: u32 = hour
        .parse()
        .ok()
        .filter(|hour| *hour < 24)
        .ok_or_else(|| format!("hour '{hour}' is not between 0 and 23"))?;
    let marker = if dst { DST_MARKER } else { "" };

    Ok(format!("{date} {:02}:{minute}{marker}", hour + 1))
}

/// Parse a corrected (hour-start) label in any of the accepted date formats
fn parse_start_label(label: &str) -> Result<NaiveDateTime, String> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(label, &format!("{fmt} %H:%M")).ok())
        .ok_or_else(|| format!("date in '{label}' is not a valid calendar date"))
}

/// Convert one hour-ending label into calendar components
pub fn normalise_label(label: &str) -> Result<HourStamp> {
    match classify_label(label) {
        LabelOutcome::Normalised(stamp) => Ok(stamp),
        LabelOutcome::Rejected { label, reason } => {
            Err(LoadError::MalformedTimestamp { label, reason })?
        }
    }
}

/// The result of normalising a single label
#[derive(Debug, Clone, PartialEq)]
pub enum LabelOutcome {
    /// The label was converted successfully
    Normalised(HourStamp),
    /// The label could not be interpreted
    Rejected {
        /// The label as it appeared in the input
        label: String,
        /// Why it was rejected
        reason: String,
    },
}

fn classify_label(label: &str) -> LabelOutcome {
    match hour_start_label(label).and_then(|start| parse_start_label(&start)) {
        Ok(dt) => LabelOutcome::Normalised(dt.into()),
        Err(reason) => LabelOutcome::Rejected {
            label: label.to_string(),
            reason,
        },
    }
}

/// The outcome of normalising every label in a load table, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalisationReport {
    outcomes: Vec<LabelOutcome>,
}

impl NormalisationReport {
    /// The outcome for each row
    pub fn outcomes(&self) -> &[LabelOutcome] {
        &self.outcomes
    }

    /// Iterate over rejected labels as `(row, label, reason)`
    pub fn rejected(&self) -> impl Iterator<Item = (usize, &str, &str)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(row, outcome)| match outcome {
                LabelOutcome::Rejected { label, reason } => {
                    Some((row, label.as_str(), reason.as_str()))
                }
                LabelOutcome::Normalised(_) => None,
            })
    }

    /// Hours which appear more than once (the repeated hour when clocks go back)
    pub fn duplicate_hours(&self) -> Vec<HourStamp> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                LabelOutcome::Normalised(stamp) => Some(*stamp),
                LabelOutcome::Rejected { .. } => None,
            })
            .duplicates()
            .collect()
    }

    /// Get the hour stamps for every row, failing if any label was rejected.
    ///
    /// Every rejected label is logged; the returned error names the first one.
    pub fn into_hours(self) -> Result<Vec<HourStamp>> {
        let n_rejected = self.rejected().count();
        if let Some((row, label, reason)) = self.rejected().next() {
            for (row, label, reason) in self.rejected() {
                warn!("Row {row}: could not interpret hour-ending label '{label}': {reason}");
            }
            let err = LoadError::MalformedTimestamp {
                label: label.to_string(),
                reason: reason.to_string(),
            };
            return Err(anyhow::Error::new(err).context(format!(
                "{n_rejected} of {} hour-ending labels could not be interpreted (first at row \
                {row})",
                self.outcomes.len()
            )));
        }

        Ok(self
            .outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                LabelOutcome::Normalised(stamp) => Some(stamp),
                LabelOutcome::Rejected { .. } => None,
            })
            .collect())
    }
}

/// Normalise a sequence of hour-ending labels, keeping a tagged outcome for every row
pub fn normalise_labels<I, S>(labels: I) -> NormalisationReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    NormalisationReport {
        outcomes: labels
            .into_iter()
            .map(|label| classify_label(label.as_ref()))
            .collect(),
    }
}
