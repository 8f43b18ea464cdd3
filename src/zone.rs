//! Zones are the coarse geographical units in which raw load data is reported.
//!
//! Input files name zones inconsistently (e.g. "FAR_WEST" in one year's load data, "far west" in
//! the population table), so every name is resolved through a [`ZoneVocabulary`].
use crate::id::{IDLookup, define_id_type, normalise_name};
use anyhow::{Result, ensure};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::collections::HashSet;
use unicase::UniCase;

define_id_type! {ZoneID}

/// The zones in which ERCOT reports load, with the other names used for them in input files
const ERCOT_ZONES: [(&str, &[&str]); 8] = [
    ("COAST", &["coast"]),
    ("EAST", &["east"]),
    ("FWEST", &["far west", "FAR_WEST"]),
    ("NCENT", &["north central", "NORTH_C"]),
    ("NORTH", &["north"]),
    ("SCENT", &["south central", "SOUTH_C"]),
    ("SOUTH", &["south", "SOUTHERN"]),
    ("WEST", &["west"]),
];

/// Zone names in the population table which mark a county as having no load profile
const ERCOT_EXCLUDED_NAMES: [&str; 2] = ["non-load", "none"];

/// Columns of the load table which are not zones and should be discarded (system totals)
const ERCOT_IGNORED_COLUMNS: [&str; 1] = ["ERCOT"];

/// How a county's zone name from the population table was classified
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneMembership {
    /// The county belongs to a known zone
    Zone(ZoneID),
    /// The county is explicitly marked as having no load profile
    NonLoad,
    /// The name is not part of the vocabulary
    Unknown,
}

/// The fixed set of zones, plus the synonyms by which input files refer to them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ZoneVocabularyRaw")]
pub struct ZoneVocabulary {
    zones: IndexSet<ZoneID>,
    names: IDLookup<ZoneID>,
    excluded: HashSet<UniCase<String>>,
    ignored_columns: HashSet<UniCase<String>>,
}

/// A zone vocabulary as written in the run configuration file
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ZoneVocabularyRaw {
    /// Maps each zone ID to the other names used for it
    synonyms: IndexMap<String, Vec<String>>,
    #[serde(default)]
    excluded: Vec<String>,
    #[serde(default)]
    ignored_columns: Vec<String>,
}

impl TryFrom<ZoneVocabularyRaw> for ZoneVocabulary {
    type Error = anyhow::Error;

    fn try_from(raw: ZoneVocabularyRaw) -> Result<Self> {
        Self::new(
            raw.synonyms
                .iter()
                .map(|(zone, names)| (zone.as_str(), names.iter().map(String::as_str))),
            raw.excluded.iter().map(String::as_str),
            raw.ignored_columns.iter().map(String::as_str),
        )
    }
}

impl Default for ZoneVocabulary {
    fn default() -> Self {
        Self::ercot()
    }
}

impl ZoneVocabulary {
    /// Create a new vocabulary.
    ///
    /// # Arguments
    ///
    /// * `zones` - Each zone ID together with its synonyms
    /// * `excluded` - Zone names which mark a county as having no load profile
    /// * `ignored_columns` - Load table columns to discard
    pub fn new<'a, I, S, E, C>(zones: I, excluded: E, ignored_columns: C) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, S)>,
        S: IntoIterator<Item = &'a str>,
        E: IntoIterator<Item = &'a str>,
        C: IntoIterator<Item = &'a str>,
    {
        let mut ids = IndexSet::new();
        let mut names = IDLookup::default();
        for (zone, synonyms) in zones {
            let id = ZoneID::new(zone.trim());
            ensure!(!id.0.is_empty(), "Zone IDs cannot be empty");
            ensure!(ids.insert(id.clone()), "Zone {id} is defined more than once");
            names.insert(zone, id.clone())?;
            for synonym in synonyms {
                names.insert(synonym, id.clone())?;
            }
        }
        ensure!(!ids.is_empty(), "At least one zone must be defined");

        let excluded: HashSet<_> = excluded
            .into_iter()
            .map(|name| UniCase::new(normalise_name(name)))
            .collect();
        for name in &excluded {
            ensure!(
                names.get(name).is_none(),
                "Excluded zone name '{name}' is also the name of a zone"
            );
        }

        Ok(Self {
            zones: ids,
            names,
            excluded,
            ignored_columns: ignored_columns
                .into_iter()
                .map(|name| UniCase::new(normalise_name(name)))
                .collect(),
        })
    }

    /// The vocabulary for ERCOT's eight weather zones
    pub fn ercot() -> Self {
        Self::new(
            ERCOT_ZONES.iter().map(|(zone, names)| (*zone, names.iter().copied())),
            ERCOT_EXCLUDED_NAMES,
            ERCOT_IGNORED_COLUMNS,
        )
        .expect("ERCOT zone vocabulary is invalid")
    }

    /// Iterate over the zone IDs in definition order
    pub fn iter(&self) -> impl Iterator<Item = &ZoneID> {
        self.zones.iter()
    }

    /// The number of zones
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether there are no zones (never true for a validly constructed vocabulary)
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Resolve a zone name (ID or synonym) to its ID
    pub fn resolve(&self, name: &str) -> Option<&ZoneID> {
        self.names.get(name)
    }

    /// Classify the zone name given for a county in the population table
    pub fn classify(&self, name: &str) -> ZoneMembership {
        if let Some(id) = self.resolve(name) {
            ZoneMembership::Zone(id.clone())
        } else if self
            .excluded
            .contains(&UniCase::new(normalise_name(name)))
        {
            ZoneMembership::NonLoad
        } else {
            ZoneMembership::Unknown
        }
    }

    /// Whether a load table column should be discarded
    pub fn is_ignored_column(&self, name: &str) -> bool {
        self.ignored_columns
            .contains(&UniCase::new(normalise_name(name)))
    }
}
