//! Lamp identifiers and lamp sets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one lamp as known to the bridge (e.g. `"1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LampId(String);

impl LampId {
    pub fn new(id: impl Into<String>) -> Self {
        LampId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LampId {
    fn from(id: &str) -> Self {
        LampId::new(id)
    }
}

impl From<String> for LampId {
    fn from(id: String) -> Self {
        LampId(id)
    }
}

impl From<u8> for LampId {
    fn from(id: u8) -> Self {
        LampId::new(id.to_string())
    }
}

impl fmt::Display for LampId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered set of lamps a command targets.
///
/// An empty set means "every lamp on the bridge".
///
/// # Example
///
/// ```
/// use hue_rig::LampSet;
///
/// let mut lamps = LampSet::from_ids(["1", "2"]);
/// assert!(!lamps.insert("2".into()));
/// assert!(lamps.insert("3".into()));
/// assert_eq!(lamps.len(), 3);
/// assert!(LampSet::all().is_broadcast());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LampSet {
    lamps: Vec<LampId>,
}

impl LampSet {
    /// The broadcast set.
    pub fn all() -> Self {
        Self::default()
    }

    /// A set containing one lamp.
    pub fn single(id: impl Into<LampId>) -> Self {
        LampSet {
            lamps: vec![id.into()],
        }
    }

    pub fn from_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<LampId>,
    {
        ids.into_iter().map(Into::<LampId>::into).collect()
    }

    /// Add a lamp; returns `false` if it was already present.
    pub fn insert(&mut self, id: LampId) -> bool {
        if self.lamps.contains(&id) {
            return false;
        }
        self.lamps.push(id);
        true
    }

    pub fn contains(&self, id: &LampId) -> bool {
        self.lamps.contains(id)
    }

    pub fn is_broadcast(&self) -> bool {
        self.lamps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lamps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LampId> {
        self.lamps.iter()
    }

    /// The lamp at `position` (zero based).
    pub fn get(&self, position: usize) -> Option<&LampId> {
        self.lamps.get(position)
    }
}

impl FromIterator<LampId> for LampSet {
    fn from_iter<I: IntoIterator<Item = LampId>>(iter: I) -> Self {
        let mut set = LampSet::default();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl fmt::Display for LampSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_broadcast() {
            return f.write_str("all");
        }
        let ids: Vec<&str> = self.lamps.iter().map(LampId::as_str).collect();
        f.write_str(&ids.join(","))
    }
}
