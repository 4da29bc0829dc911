//! The fit: items, their attribute caches and the machinery keeping them fresh
//!
//! Every mutation publishes a [`Msg`]. The fit's own calculator handles the
//! message first (updating affection edges and dropping stale cache entries),
//! then external subscribers receive it. Attribute reads recompute lazily.

mod calculate;
mod handlers;
#[cfg(test)]
mod tests;

use crate::diagnostics::Diagnostics;
use crate::{
    AffectionRegistry, AttrId, Catalog, Diagnostic, Domain, EffectId, EngineConfig, Error, Item, ItemId,
    ItemKind, ItemStore, MessageBus, Msg, Result, State, Subscriber, SubscriberId, TypeId,
};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Chance and status of a side effect on an item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideEffectStatus {
    /// Modified value of the effect's chance attribute, if it can be computed
    pub chance: Option<f64>,
    pub enabled: bool,
}

/// A set of items whose attributes affect each other
pub struct Fit {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    items: ItemStore,
    registry: AffectionRegistry,
    bus: MessageBus,
    /// Attributes currently being computed
    evaluating: IndexSet<(ItemId, AttrId)>,
    diagnostics: Diagnostics,
}

impl Fit {
    /// Create an empty fit using the default configuration
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_config(catalog, EngineConfig::default())
    }

    /// Create an empty fit with custom configuration
    pub fn with_config(catalog: Arc<Catalog>, config: EngineConfig) -> Self {
        let diagnostics = Diagnostics::with_limit(config.max_diagnostics);
        Self {
            catalog,
            config,
            items: ItemStore::new(),
            registry: AffectionRegistry::new(),
            bus: MessageBus::new(),
            evaluating: IndexSet::new(),
            diagnostics,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &AffectionRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Items

    /// Add an item of a catalog type
    ///
    /// Items whose type is missing from the catalog are accepted but stay
    /// inert: they neither modify nor get modified.
    pub fn add_item(&mut self, kind: ItemKind, type_id: TypeId) -> Result<ItemId> {
        if kind.is_unique() && self.items.first_of(kind).is_some() {
            return Err(Error::SlotOccupied(kind));
        }
        let id = self.items.create(type_id, kind);
        if self.catalog.type_def(type_id).is_none() {
            warn!(item = %id, type_id = %type_id, "item type is not in the catalog");
        }
        debug!(item = %id, ?kind, type_id = %type_id, "item added");
        self.publish(Msg::ItemAdded { item: id });
        Ok(id)
    }

    /// Load a charge into a module, replacing the current one
    ///
    /// The charge takes the module's placement and state.
    pub fn load_charge(&mut self, module: ItemId, type_id: TypeId) -> Result<ItemId> {
        let holder = self.item_ref(module)?;
        if !holder.kind().holds_charge() {
            return Err(Error::NotAChargeHolder(module));
        }
        let (domain, state, previous) = (holder.domain, holder.state, holder.child);
        if let Some(previous) = previous {
            self.remove_item(previous)?;
        }

        let charge = self.items.create(type_id, ItemKind::Charge);
        if let Some(item) = self.items.get_mut(charge) {
            item.domain = domain;
            item.parent = Some(module);
        }
        if let Some(item) = self.items.get_mut(module) {
            item.child = Some(charge);
        }
        debug!(item = %charge, module = %module, "charge loaded");
        self.publish(Msg::ItemAdded { item: charge });
        self.set_state(charge, state)?;
        Ok(charge)
    }

    /// Remove the charge of a module, returning its id
    pub fn unload_charge(&mut self, module: ItemId) -> Result<Option<ItemId>> {
        let charge = self.item_ref(module)?.child;
        if let Some(charge) = charge {
            self.remove_item(charge)?;
        }
        Ok(charge)
    }

    /// Remove an item, together with the charge it holds
    pub fn remove_item(&mut self, item: ItemId) -> Result<()> {
        let (child, parent) = {
            let it = self.item_ref(item)?;
            (it.child, it.parent)
        };
        if let Some(child) = child {
            self.remove_item(child)?;
        }
        self.publish(Msg::ItemRemoved { item });
        if let Some(parent) = parent.and_then(|p| self.items.get_mut(p)) {
            parent.child = None;
        }
        self.items.remove(item);
        debug!(item = %item, "item removed");
        Ok(())
    }

    /// Change the activation state of an item
    ///
    /// A loaded charge follows its module.
    pub fn set_state(&mut self, item: ItemId, state: State) -> Result<()> {
        let it = self.item_mut(item)?;
        let old = it.state;
        let child = it.child;
        if old != state {
            it.state = state;
            self.publish(Msg::StateChanged {
                item,
                old,
                new: state,
            });
        }
        if let Some(child) = child {
            self.set_state(child, state)?;
        }
        Ok(())
    }

    /// Move an item to another domain
    ///
    /// Only ship and character placements exist; a loaded charge moves with
    /// its module.
    pub fn set_domain(&mut self, item: ItemId, domain: Option<Domain>) -> Result<()> {
        let kind = self.item_ref(item)?.kind();
        if let Some(target) = domain {
            let placeable = !matches!(kind, ItemKind::Ship | ItemKind::Character);
            if !placeable || !matches!(target, Domain::Ship | Domain::Character) {
                return Err(Error::InvalidPlacement {
                    item,
                    domain: target,
                });
            }
        }

        let it = self.item_mut(item)?;
        let old = it.domain;
        let child = it.child;
        if old != domain {
            it.domain = domain;
            self.publish(Msg::DomainChanged {
                item,
                old,
                new: domain,
            });
        }
        if let Some(child) = child {
            self.set_domain(child, domain)?;
        }
        Ok(())
    }

    /// Enable or disable a side effect of an item
    pub fn set_side_effect(&mut self, item: ItemId, effect: EffectId, enabled: bool) -> Result<()> {
        let it = self.item_mut(item)?;
        let changed = if enabled {
            it.enabled_side_effects.insert(effect)
        } else {
            it.enabled_side_effects.shift_remove(&effect)
        };
        if changed {
            self.publish(Msg::EffectStatusChanged {
                item,
                effect,
                enabled,
            });
        }
        Ok(())
    }

    /// Side effects of an item with their chance and status
    pub fn side_effects(&mut self, item: ItemId) -> Result<IndexMap<EffectId, SideEffectStatus>> {
        let it = self.item_ref(item)?;
        let type_id = it.type_id();
        let catalog = Arc::clone(&self.catalog);
        let mut out = IndexMap::new();
        for effect in catalog.effects_of(type_id) {
            let Some(chance_attr) = effect.usage_chance_attr else {
                continue;
            };
            let enabled = self.item_ref(item)?.is_side_effect_enabled(effect.id);
            let chance = match self.attr(item, chance_attr) {
                Ok(value) => Some(value),
                Err(err @ Error::OverrideRaised { .. }) => return Err(err),
                Err(err) => {
                    self.skip_source(item, chance_attr, &err);
                    None
                }
            };
            out.insert(effect.id, SideEffectStatus { chance, enabled });
        }
        Ok(out)
    }

    pub fn item(&self, item: ItemId) -> Option<&Item> {
        self.items.get(item)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Items placed in a domain
    pub fn items_in_domain(&self, domain: Domain) -> impl Iterator<Item = &Item> {
        self.items.in_domain(domain)
    }

    pub fn ship(&self) -> Option<ItemId> {
        self.items.first_of(ItemKind::Ship).map(Item::id)
    }

    pub fn character(&self) -> Option<ItemId> {
        self.items.first_of(ItemKind::Character).map(Item::id)
    }

    /// Total number of cached attribute values across all items
    pub fn cached_entry_count(&self) -> usize {
        self.items.iter().map(|i| i.attrs.len()).sum()
    }

    // ------------------------------------------------------------------
    // Subscribers

    /// Subscribe to fit messages; delivered after the fit's own handling
    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) -> SubscriberId {
        self.bus.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> Option<Box<dyn Subscriber>> {
        self.bus.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Diagnostics

    /// Recovered conditions, oldest first
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Drain recovered conditions
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    pub(crate) fn record_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn item_ref(&self, item: ItemId) -> Result<&Item> {
        self.items.get(item).ok_or(Error::ItemNotFound(item))
    }

    fn item_mut(&mut self, item: ItemId) -> Result<&mut Item> {
        self.items.get_mut(item).ok_or(Error::ItemNotFound(item))
    }
}

impl std::fmt::Debug for Fit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fit")
            .field("items", &self.items.len())
            .field("edges", &self.registry.edge_count())
            .field("subscribers", &self.bus.len())
            .field("config", &self.config)
            .finish()
    }
}
