//! Fit members and their storage

use crate::{AttributeMap, Domain, EffectId, ItemId, State, TypeId};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// What role an item plays in a fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Ship,
    Character,
    Module,
    Rig,
    Subsystem,
    Stance,
    Charge,
    Drone,
    Fighter,
    Implant,
    Booster,
    Skill,
    EffectBeacon,
}

impl ItemKind {
    /// Domain an item of this kind is placed in when added
    ///
    /// Charges take their parent's placement instead.
    pub fn default_domain(self) -> Option<Domain> {
        match self {
            ItemKind::Module
            | ItemKind::Rig
            | ItemKind::Subsystem
            | ItemKind::Stance
            | ItemKind::EffectBeacon => Some(Domain::Ship),
            ItemKind::Implant | ItemKind::Booster | ItemKind::Skill => Some(Domain::Character),
            ItemKind::Ship
            | ItemKind::Character
            | ItemKind::Charge
            | ItemKind::Drone
            | ItemKind::Fighter => None,
        }
    }

    /// Items the character can modify through owner skill requirements
    pub fn is_owner_modifiable(self) -> bool {
        matches!(self, ItemKind::Drone | ItemKind::Fighter | ItemKind::Charge)
    }

    /// Only one item of these kinds may be in a fit
    pub fn is_unique(self) -> bool {
        matches!(self, ItemKind::Ship | ItemKind::Character | ItemKind::Stance)
    }

    pub fn holds_charge(self) -> bool {
        matches!(self, ItemKind::Module)
    }
}

/// A fit member
#[derive(Debug)]
pub struct Item {
    id: ItemId,
    type_id: TypeId,
    kind: ItemKind,
    pub(crate) state: State,
    pub(crate) domain: Option<Domain>,
    pub(crate) parent: Option<ItemId>,
    pub(crate) child: Option<ItemId>,
    pub(crate) enabled_side_effects: IndexSet<EffectId>,
    pub(crate) attrs: AttributeMap,
}

impl Item {
    pub(crate) fn new(id: ItemId, type_id: TypeId, kind: ItemKind) -> Self {
        Self {
            id,
            type_id,
            kind,
            state: State::Offline,
            domain: kind.default_domain(),
            parent: None,
            child: None,
            enabled_side_effects: IndexSet::new(),
            attrs: AttributeMap::new(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Domain the item is placed in, if any
    pub fn domain(&self) -> Option<Domain> {
        self.domain
    }

    /// Item holding this one (a module for a charge)
    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    /// Item held by this one (a charge for a module)
    pub fn child(&self) -> Option<ItemId> {
        self.child
    }

    /// The linked item reached through the "other" domain
    pub fn other(&self) -> Option<ItemId> {
        self.child.or(self.parent)
    }

    pub fn is_side_effect_enabled(&self, effect: EffectId) -> bool {
        self.enabled_side_effects.contains(&effect)
    }

    pub fn attrs(&self) -> &AttributeMap {
        &self.attrs
    }
}

/// Storage for all items of a fit
#[derive(Debug, Default)]
pub struct ItemStore {
    items: IndexMap<ItemId, Item>,
    next_id: u64,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new item and add it to the store
    pub fn create(&mut self, type_id: TypeId, kind: ItemKind) -> ItemId {
        let id = ItemId::new(self.next_id);
        self.next_id += 1;
        self.items.insert(id, Item::new(id, type_id, kind));
        id
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        self.items.shift_remove(&id)
    }

    /// First item of a kind
    pub fn first_of(&self, kind: ItemKind) -> Option<&Item> {
        self.items.values().find(|i| i.kind == kind)
    }

    /// Items placed in a domain
    pub fn in_domain(&self, domain: Domain) -> impl Iterator<Item = &Item> {
        self.items
            .values()
            .filter(move |i| i.domain == Some(domain))
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.items.values_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
