//! Code for handling IDs
use anyhow::{Result, ensure};
use itertools::Itertools;
use std::collections::HashMap;
use unicase::UniCase;

/// A trait alias for ID types
pub trait IDLike:
    Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}
impl<T> IDLike for T where
    T: Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            Debug,
            serde::Serialize,
        )]
        /// An ID type (e.g. `ZoneID`, `RegionID`, etc.)
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }
        }
    };
}
pub(crate) use define_id_type;

define_id_type! {CountyID}

/// Canonicalise a name for lookup: surrounding whitespace is removed and internal runs of
/// whitespace collapse to a single space.
pub fn normalise_name(name: &str) -> String {
    name.split_whitespace().join(" ")
}

/// Resolves names to IDs, ignoring case and whitespace differences.
///
/// Several names (synonyms) may resolve to the same ID, but a name may not resolve to two
/// different IDs.
#[derive(Debug, Clone, PartialEq)]
pub struct IDLookup<ID: IDLike> {
    names: HashMap<UniCase<String>, ID>,
}

impl<ID: IDLike> Default for IDLookup<ID> {
    fn default() -> Self {
        Self {
            names: HashMap::new(),
        }
    }
}

impl<ID: IDLike> IDLookup<ID> {
    /// Add a name which resolves to `id`.
    ///
    /// Re-adding an existing name for the same ID is a no-op.
    pub fn insert(&mut self, name: &str, id: ID) -> Result<()> {
        let key = UniCase::new(normalise_name(name));
        if let Some(existing) = self.names.get(&key) {
            ensure!(
                *existing == id,
                "Name '{name}' refers to both {existing} and {id}"
            );
            return Ok(());
        }

        self.names.insert(key, id);
        Ok(())
    }

    /// Look up the ID for a name
    pub fn get(&self, name: &str) -> Option<&ID> {
        self.names.get(&UniCase::new(normalise_name(name)))
    }

    /// Whether the lookup has no names
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
