//! Immutable catalog records: attributes, effects and item types
//!
//! The catalog is built once, either by hand or through a loader, and then
//! shared read-only between fits as an `Arc<Catalog>`.

use crate::{AttrId, CategoryId, EffectBehavior, EffectId, GroupId, Modifier, State, TypeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Attribute definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub id: AttrId,
    /// Value used when an item type does not carry the attribute
    #[serde(default)]
    pub default_value: Option<f64>,
    /// Attribute on the same item capping this one
    #[serde(default)]
    pub max_attribute: Option<AttrId>,
    #[serde(default = "default_true")]
    pub high_is_good: bool,
    /// Non-stackable attributes get diminishing returns on multipliers
    #[serde(default = "default_true")]
    pub stackable: bool,
}

fn default_true() -> bool {
    true
}

impl AttributeDef {
    /// Create a stackable, high-is-good attribute without default value
    pub fn new(id: AttrId) -> Self {
        Self {
            id,
            default_value: None,
            max_attribute: None,
            high_is_good: true,
            stackable: true,
        }
    }

    pub fn with_default(mut self, value: f64) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_max_attribute(mut self, attr: AttrId) -> Self {
        self.max_attribute = Some(attr);
        self
    }

    pub fn high_is_good(mut self, high_is_good: bool) -> Self {
        self.high_is_good = high_is_good;
        self
    }

    pub fn stackable(mut self, stackable: bool) -> Self {
        self.stackable = stackable;
        self
    }
}

/// Effect category; decides when the effect's modifiers run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectCategory {
    Passive,
    Active,
    Target,
    Area,
    Online,
    Overload,
    Dungeon,
    System,
}

impl EffectCategory {
    /// Minimal item state for effects of this category
    ///
    /// `None` for categories whose modifiers are not supported.
    pub fn required_state(self) -> Option<State> {
        match self {
            EffectCategory::Passive | EffectCategory::System => Some(State::Offline),
            EffectCategory::Online => Some(State::Online),
            EffectCategory::Active | EffectCategory::Target => Some(State::Active),
            EffectCategory::Overload => Some(State::Overload),
            EffectCategory::Area | EffectCategory::Dungeon => None,
        }
    }
}

/// How completely an effect's modifiers were compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildStatus {
    #[default]
    Full,
    Partial,
    Error,
}

/// Effect definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDef {
    pub id: EffectId,
    pub category: EffectCategory,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub build_status: BuildStatus,
    /// Chance attribute of a side effect; side effects start disabled
    #[serde(default)]
    pub usage_chance_attr: Option<AttrId>,
    #[serde(default)]
    pub behavior: Option<EffectBehavior>,
}

impl EffectDef {
    pub fn new(id: EffectId, category: EffectCategory) -> Self {
        Self {
            id,
            category,
            modifiers: Vec::new(),
            build_status: BuildStatus::Full,
            usage_chance_attr: None,
            behavior: None,
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_usage_chance(mut self, attr: AttrId) -> Self {
        self.usage_chance_attr = Some(attr);
        self
    }

    pub fn with_behavior(mut self, behavior: EffectBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn is_side_effect(&self) -> bool {
        self.usage_chance_attr.is_some()
    }
}

/// Item type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub id: TypeId,
    pub group_id: GroupId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub attributes: IndexMap<AttrId, f64>,
    #[serde(default)]
    pub effects: Vec<EffectId>,
    #[serde(default)]
    pub default_effect: Option<EffectId>,
    /// Required skill type to required level
    #[serde(default)]
    pub required_skills: IndexMap<TypeId, u8>,
    /// Highest state items of this type may be put in
    #[serde(default = "default_max_state")]
    pub max_state: State,
}

fn default_max_state() -> State {
    State::Overload
}

impl TypeDef {
    pub fn new(id: TypeId, group_id: GroupId, category_id: CategoryId) -> Self {
        Self {
            id,
            group_id,
            category_id,
            attributes: IndexMap::new(),
            effects: Vec::new(),
            default_effect: None,
            required_skills: IndexMap::new(),
            max_state: State::Overload,
        }
    }

    pub fn with_attr(mut self, attr: AttrId, value: f64) -> Self {
        self.attributes.insert(attr, value);
        self
    }

    pub fn with_effect(mut self, effect: EffectId) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_default_effect(mut self, effect: EffectId) -> Self {
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
        self.default_effect = Some(effect);
        self
    }

    pub fn with_skill(mut self, skill: TypeId, level: u8) -> Self {
        self.required_skills.insert(skill, level);
        self
    }

    pub fn with_max_state(mut self, state: State) -> Self {
        self.max_state = state;
        self
    }

    /// Check whether the type requires a skill at any level
    pub fn requires_skill(&self, skill: TypeId) -> bool {
        self.required_skills.contains_key(&skill)
    }
}

/// Lookup tables for every catalog record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    attributes: IndexMap<AttrId, AttributeDef>,
    effects: IndexMap<EffectId, EffectDef>,
    types: IndexMap<TypeId, TypeDef>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an attribute definition, returning the one it replaced
    pub fn insert_attribute(&mut self, def: AttributeDef) -> Option<AttributeDef> {
        self.attributes.insert(def.id, def)
    }

    /// Insert an effect definition, returning the one it replaced
    pub fn insert_effect(&mut self, def: EffectDef) -> Option<EffectDef> {
        self.effects.insert(def.id, def)
    }

    /// Insert a type definition, returning the one it replaced
    pub fn insert_type(&mut self, def: TypeDef) -> Option<TypeDef> {
        self.types.insert(def.id, def)
    }

    pub fn with_attribute(mut self, def: AttributeDef) -> Self {
        self.insert_attribute(def);
        self
    }

    pub fn with_effect(mut self, def: EffectDef) -> Self {
        self.insert_effect(def);
        self
    }

    pub fn with_type(mut self, def: TypeDef) -> Self {
        self.insert_type(def);
        self
    }

    pub fn attr_def(&self, id: AttrId) -> Option<&AttributeDef> {
        self.attributes.get(&id)
    }

    pub fn effect(&self, id: EffectId) -> Option<&EffectDef> {
        self.effects.get(&id)
    }

    pub fn type_def(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(&id)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeDef> {
        self.attributes.values()
    }

    pub fn effects(&self) -> impl Iterator<Item = &EffectDef> {
        self.effects.values()
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// Effects of a type that exist in the catalog, in declaration order
    pub fn effects_of(&self, type_id: TypeId) -> impl Iterator<Item = &EffectDef> {
        self.types
            .get(&type_id)
            .into_iter()
            .flat_map(|t| t.effects.iter().filter_map(|id| self.effects.get(id)))
    }
}
