//! Affection registry: which source modifiers reach which target attributes
//!
//! Edges are materialized when a modifier becomes active or a new target
//! appears, and removed when either side goes away. Every mutating operation
//! returns the `(target item, target attribute)` pairs it touched so the
//! caller can drop their cached values.

use crate::{AttrId, Catalog, Domain, Item, ItemId, ItemKind, ItemStore, Modifier, ModifierContext, TargetFilter};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// A modifier bound to the item carrying it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Affector {
    pub source: ItemId,
    pub modifier: Modifier,
}

/// Target attribute touched by a registry change
pub type Touched = (ItemId, AttrId);

/// Result of re-syncing a source's modifiers
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub touched: Vec<Touched>,
    /// Newly registered modifiers whose filter selected no item
    pub unresolved: Vec<Modifier>,
}

/// Read-only view of the fit used to resolve modifier targets
#[derive(Clone, Copy)]
pub struct Topology<'a> {
    items: &'a ItemStore,
    catalog: &'a Catalog,
}

impl<'a> Topology<'a> {
    pub fn new(items: &'a ItemStore, catalog: &'a Catalog) -> Self {
        Self { items, catalog }
    }

    /// Whether the item exists and its type is in the catalog
    pub fn is_loaded(&self, item: &Item) -> bool {
        self.catalog.type_def(item.type_id()).is_some()
    }

    /// Domain a modifier's domain stands for, as seen from its source
    fn placement(source: &Item, domain: Domain) -> Option<Domain> {
        match domain {
            Domain::Ship | Domain::Character => Some(domain),
            Domain::SelfItem => match source.kind() {
                ItemKind::Ship => Some(Domain::Ship),
                ItemKind::Character => Some(Domain::Character),
                _ => None,
            },
            Domain::Other | Domain::Target => None,
        }
    }

    /// Check whether a modifier carried by `source` reaches `target`
    pub fn matches(&self, source: &Item, modifier: &Modifier, target: &Item) -> bool {
        if modifier.context == ModifierContext::Gang {
            return false;
        }
        let Some(target_type) = self.catalog.type_def(target.type_id()) else {
            return false;
        };
        let in_domain = || {
            Self::placement(source, modifier.target_domain)
                .is_some_and(|d| target.domain() == Some(d))
        };
        match modifier.target_filter {
            TargetFilter::Item => match modifier.target_domain {
                Domain::SelfItem => target.id() == source.id(),
                Domain::Ship => target.kind() == ItemKind::Ship,
                Domain::Character => target.kind() == ItemKind::Character,
                Domain::Other => source.other() == Some(target.id()),
                Domain::Target => false,
            },
            TargetFilter::Domain => in_domain(),
            TargetFilter::DomainGroup(group) => in_domain() && target_type.group_id == group,
            TargetFilter::DomainSkillrq(skill) => {
                in_domain() && target_type.requires_skill(skill.resolve(source.type_id()))
            }
            TargetFilter::OwnerSkillrq(skill) => {
                Self::placement(source, modifier.target_domain) == Some(Domain::Character)
                    && target.kind().is_owner_modifiable()
                    && target_type.requires_skill(skill.resolve(source.type_id()))
            }
        }
    }

    /// Every item a modifier carried by `source` reaches
    pub fn resolve(&self, source: &Item, modifier: &Modifier) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|target| self.matches(source, modifier, target))
            .map(|target| target.id())
            .collect()
    }
}

/// Materialized dependency edges between items
#[derive(Debug, Default)]
pub struct AffectionRegistry {
    /// target item -> target attr -> affectors, in registration order
    by_target: HashMap<ItemId, HashMap<AttrId, IndexSet<Affector>>>,
    /// source item -> registered modifiers -> resolved targets
    by_source: HashMap<ItemId, IndexMap<Modifier, Vec<ItemId>>>,
}

impl AffectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the registered modifiers of `source` equal to `desired`
    ///
    /// Edges of modifiers no longer desired are removed; new ones are
    /// resolved against the current topology. Unchanged modifiers keep their
    /// edges.
    pub fn sync_source(
        &mut self,
        source: ItemId,
        desired: &IndexSet<Modifier>,
        topology: &Topology<'_>,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        let stale: Vec<Modifier> = self
            .by_source
            .get(&source)
            .map(|mods| mods.keys().filter(|m| !desired.contains(*m)).copied().collect())
            .unwrap_or_default();
        for modifier in stale {
            let targets = self
                .by_source
                .get_mut(&source)
                .and_then(|mods| mods.shift_remove(&modifier))
                .unwrap_or_default();
            for target in targets {
                self.unlink(target, Affector { source, modifier });
                report.touched.push((target, modifier.target_attr));
            }
        }

        if let Some(source_item) = topology.items.get(source) {
            for modifier in desired {
                let registered = self
                    .by_source
                    .get(&source)
                    .is_some_and(|mods| mods.contains_key(modifier));
                if registered {
                    continue;
                }
                let targets = topology.resolve(source_item, modifier);
                if targets.is_empty() && modifier.target_domain != Domain::Target {
                    report.unresolved.push(*modifier);
                }
                for target in &targets {
                    self.link(*target, Affector { source, modifier: *modifier });
                    report.touched.push((*target, modifier.target_attr));
                }
                self.by_source
                    .entry(source)
                    .or_default()
                    .insert(*modifier, targets);
            }
        }

        self.prune(source);
        report
    }

    /// Attach a new target to every registered modifier that reaches it
    pub fn register_target(&mut self, target: ItemId, topology: &Topology<'_>) -> Vec<Touched> {
        let mut touched = Vec::new();
        let Some(target_item) = topology.items.get(target) else {
            return touched;
        };
        for (source, mods) in self.by_source.iter_mut() {
            let Some(source_item) = topology.items.get(*source) else {
                continue;
            };
            for (modifier, targets) in mods.iter_mut() {
                if targets.contains(&target) || !topology.matches(source_item, modifier, target_item)
                {
                    continue;
                }
                targets.push(target);
                self.by_target
                    .entry(target)
                    .or_default()
                    .entry(modifier.target_attr)
                    .or_default()
                    .insert(Affector {
                        source: *source,
                        modifier: *modifier,
                    });
                touched.push((target, modifier.target_attr));
            }
        }
        touched
    }

    /// Remove every edge pointing at `target`
    pub fn unregister_target(&mut self, target: ItemId) -> Vec<Touched> {
        let mut touched = Vec::new();
        let Some(attrs) = self.by_target.remove(&target) else {
            return touched;
        };
        for (attr, affectors) in attrs {
            for affector in affectors {
                if let Some(targets) = self
                    .by_source
                    .get_mut(&affector.source)
                    .and_then(|mods| mods.get_mut(&affector.modifier))
                {
                    targets.retain(|t| *t != target);
                }
            }
            touched.push((target, attr));
        }
        touched
    }

    /// Remove every edge originating from `source`
    pub fn unregister_source(&mut self, source: ItemId) -> Vec<Touched> {
        let mut touched = Vec::new();
        let Some(mods) = self.by_source.remove(&source) else {
            return touched;
        };
        for (modifier, targets) in mods {
            for target in targets {
                self.unlink(target, Affector { source, modifier });
                touched.push((target, modifier.target_attr));
            }
        }
        touched
    }

    /// Affectors of a target attribute, in registration order
    pub fn affectors(&self, item: ItemId, attr: AttrId) -> Vec<Affector> {
        self.by_target
            .get(&item)
            .and_then(|attrs| attrs.get(&attr))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Target attributes reached by modifiers reading `(source, source_attr)`
    pub fn affectees(&self, source: ItemId, source_attr: AttrId) -> Vec<Touched> {
        self.by_source
            .get(&source)
            .into_iter()
            .flat_map(|mods| mods.iter())
            .filter(|(modifier, _)| modifier.source_attr == source_attr)
            .flat_map(|(modifier, targets)| targets.iter().map(move |t| (*t, modifier.target_attr)))
            .collect()
    }

    /// Modifiers currently registered for a source
    pub fn modifiers_of(&self, source: ItemId) -> impl Iterator<Item = &Modifier> {
        self.by_source.get(&source).into_iter().flat_map(|m| m.keys())
    }

    /// Total number of source to target edges
    pub fn edge_count(&self) -> usize {
        self.by_target
            .values()
            .flat_map(|attrs| attrs.values())
            .map(|set| set.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty() && self.by_source.is_empty()
    }

    fn link(&mut self, target: ItemId, affector: Affector) {
        self.by_target
            .entry(target)
            .or_default()
            .entry(affector.modifier.target_attr)
            .or_default()
            .insert(affector);
    }

    fn unlink(&mut self, target: ItemId, affector: Affector) {
        let attr = affector.modifier.target_attr;
        if let Some(attrs) = self.by_target.get_mut(&target) {
            if let Some(set) = attrs.get_mut(&attr) {
                set.shift_remove(&affector);
                if set.is_empty() {
                    attrs.remove(&attr);
                }
            }
            if attrs.is_empty() {
                self.by_target.remove(&target);
            }
        }
    }

    fn prune(&mut self, source: ItemId) {
        if self.by_source.get(&source).is_some_and(|mods| mods.is_empty()) {
            self.by_source.remove(&source);
        }
    }
}
