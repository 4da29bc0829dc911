//! Effect definition schema
//!
//! Modifiers may omit their required state; it is then derived from the
//! effect category when the catalog is built.

use dogma_core::{
    AttrId, Domain, EffectBehavior, EffectCategory, EffectId, Modifier, ModifierContext, Operator,
    State, TargetFilter,
};
use serde::{Deserialize, Serialize};

/// Modifier as written in a catalog file
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModifierSchema {
    pub target_filter: TargetFilter,
    pub target_domain: Domain,
    pub target_attr: AttrId,
    pub operator: Operator,
    pub source_attr: AttrId,
    #[serde(default)]
    pub state: Option<State>,
    #[serde(default)]
    pub context: ModifierContext,
}

impl ModifierSchema {
    /// Compile with the state implied by the owning effect
    pub fn compile(&self, implied: State) -> Modifier {
        Modifier {
            target_filter: self.target_filter,
            target_domain: self.target_domain,
            target_attr: self.target_attr,
            operator: self.operator,
            source_attr: self.source_attr,
            state: self.state.unwrap_or(implied),
            context: self.context,
        }
    }
}

/// Effect as written in a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSchema {
    pub id: EffectId,
    #[serde(default)]
    pub name: String,
    pub category: EffectCategory,
    #[serde(default)]
    pub modifiers: Vec<ModifierSchema>,
    #[serde(default)]
    pub usage_chance_attr: Option<AttrId>,
    #[serde(default)]
    pub behavior: Option<EffectBehavior>,
}
