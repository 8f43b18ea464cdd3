//! Model regions are the geographical units for which load profiles are produced.
use crate::error::LoadError;
use crate::id::{IDLookup, define_id_type, normalise_name};
use anyhow::{Result, ensure};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashSet;

define_id_type! {RegionID}

/// The canonical order of region columns in output files.
///
/// Region names are not necessarily in a meaningful order when sorted, so users can supply the
/// order explicitly. The names in the population table are matched against it ignoring case and
/// whitespace.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct RegionOrder {
    regions: Vec<RegionID>,
    names: IDLookup<RegionID>,
}

impl TryFrom<Vec<String>> for RegionOrder {
    type Error = anyhow::Error;

    fn try_from(regions: Vec<String>) -> Result<Self> {
        Self::new(regions)
    }
}

impl RegionOrder {
    /// Create a new [`RegionOrder`] from a list of region names
    pub fn new<I, S>(regions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids = Vec::new();
        let mut names = IDLookup::default();
        for name in regions {
            let name = normalise_name(name.as_ref());
            ensure!(!name.is_empty(), "Region names cannot be empty");
            ensure!(
                names.get(&name).is_none(),
                "Region {name} appears more than once in region order"
            );
            let id = RegionID::from(name);
            names.insert(&id.0, id.clone())?;
            ids.push(id);
        }
        ensure!(!ids.is_empty(), "Region order cannot be empty");

        Ok(Self {
            regions: ids,
            names,
        })
    }

    /// Look up the canonical ID for a region name
    pub fn resolve(&self, name: &str) -> Option<&RegionID> {
        self.names.get(name)
    }

    /// The regions in order
    pub fn as_slice(&self) -> &[RegionID] {
        &self.regions
    }
}

/// Get the order of the output columns for the regions which counties were assigned to.
///
/// If `configured` is `None`, regions are sorted lexicographically. Otherwise every configured
/// region must have at least one county.
pub fn resolve_region_order<'a, I>(
    found: I,
    configured: Option<&RegionOrder>,
) -> Result<Vec<RegionID>>
where
    I: IntoIterator<Item = &'a RegionID>,
{
    let found: HashSet<_> = found.into_iter().collect();
    let Some(configured) = configured else {
        return Ok(found.into_iter().sorted().cloned().collect());
    };

    let missing = configured
        .as_slice()
        .iter()
        .filter(|region| !found.contains(region))
        .join(", ");
    if !missing.is_empty() {
        Err(LoadError::SchemaMismatch(format!(
            "No counties belong to region(s): {missing}"
        )))?;
    }

    Ok(configured.as_slice().to_vec())
}
