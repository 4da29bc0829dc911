//! Per-item attribute cache, override table and within-item dependencies
//!
//! The map only stores; evaluation and message publishing live in
//! [`Fit`](crate::Fit), which owns every item's map.

use crate::AttrId;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Producer of an overridden attribute value
///
/// An `Err` carries the reason the producer failed.
pub type OverrideFn = Box<dyn Fn() -> std::result::Result<f64, String>>;

/// Attribute storage of a single item
#[derive(Default)]
pub struct AttributeMap {
    values: HashMap<AttrId, f64>,
    overrides: HashMap<AttrId, OverrideFn>,
    /// attr -> same-item attrs whose cached value was computed from it
    dependents: HashMap<AttrId, HashSet<AttrId>>,
    /// attr -> same-item attrs its cached value was computed from
    sources: HashMap<AttrId, Vec<AttrId>>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached computed value, ignoring overrides
    pub fn cached(&self, attr: AttrId) -> Option<f64> {
        self.values.get(&attr).copied()
    }

    pub fn is_cached(&self, attr: AttrId) -> bool {
        self.values.contains_key(&attr)
    }

    /// Store a computed value along with the same-item attributes it read
    pub(crate) fn store(&mut self, attr: AttrId, value: f64, sources: Vec<AttrId>) {
        self.unlink(attr);
        for source in &sources {
            self.dependents.entry(*source).or_default().insert(attr);
        }
        if !sources.is_empty() {
            self.sources.insert(attr, sources);
        }
        self.values.insert(attr, value);
    }

    /// Drop a cached value; returns it if there was one
    pub(crate) fn remove(&mut self, attr: AttrId) -> Option<f64> {
        self.unlink(attr);
        self.values.remove(&attr)
    }

    /// Same-item attributes whose cached value was computed from `attr`
    pub fn dependents_of(&self, attr: AttrId) -> Vec<AttrId> {
        self.dependents
            .get(&attr)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn unlink(&mut self, attr: AttrId) {
        if let Some(sources) = self.sources.remove(&attr) {
            for source in sources {
                if let Some(set) = self.dependents.get_mut(&source) {
                    set.remove(&attr);
                    if set.is_empty() {
                        self.dependents.remove(&source);
                    }
                }
            }
        }
    }

    pub fn has_override(&self, attr: AttrId) -> bool {
        self.overrides.contains_key(&attr)
    }

    /// Run the override producer, if any
    pub(crate) fn override_value(&self, attr: AttrId) -> Option<std::result::Result<f64, String>> {
        self.overrides.get(&attr).map(|producer| producer())
    }

    pub(crate) fn set_override(&mut self, attr: AttrId, producer: OverrideFn) {
        self.overrides.insert(attr, producer);
    }

    /// Remove an override; returns whether one was installed
    pub(crate) fn clear_override(&mut self, attr: AttrId) -> bool {
        self.overrides.remove(&attr).is_some()
    }

    /// Cached attributes
    pub fn keys(&self) -> impl Iterator<Item = AttrId> + '_ {
        self.values.keys().copied()
    }

    pub fn overridden(&self) -> impl Iterator<Item = AttrId> + '_ {
        self.overrides.keys().copied()
    }

    /// Number of cached values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for AttributeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeMap")
            .field("values", &self.values)
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .field("dependents", &self.dependents)
            .finish()
    }
}
