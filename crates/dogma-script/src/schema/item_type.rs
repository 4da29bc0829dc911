//! Item type definition schema

use dogma_core::{AttrId, CategoryId, EffectId, GroupId, State, TypeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Item type as written in a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSchema {
    pub id: TypeId,
    #[serde(default)]
    pub name: String,
    pub group_id: GroupId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub attributes: IndexMap<AttrId, f64>,
    #[serde(default)]
    pub effects: Vec<EffectId>,
    #[serde(default)]
    pub default_effect: Option<EffectId>,
    /// Required skill type to level
    #[serde(default)]
    pub required_skills: IndexMap<TypeId, u8>,
    /// Derived from the type's effects when omitted
    #[serde(default)]
    pub max_state: Option<State>,
}
