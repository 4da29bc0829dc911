//! Attribute definition schema

use dogma_core::{AttrId, AttributeDef};
use serde::{Deserialize, Serialize};

/// Attribute as written in a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSchema {
    pub id: AttrId,
    /// Display name, not used by the engine
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub default_value: Option<f64>,
    #[serde(default)]
    pub max_attribute: Option<AttrId>,
    #[serde(default = "default_true")]
    pub high_is_good: bool,
    #[serde(default = "default_true")]
    pub stackable: bool,
}

fn default_true() -> bool {
    true
}

impl AttributeSchema {
    /// Convert into the engine's attribute definition
    pub fn to_def(&self) -> AttributeDef {
        AttributeDef {
            id: self.id,
            default_value: self.default_value,
            max_attribute: self.max_attribute,
            high_is_good: self.high_is_good,
            stackable: self.stackable,
        }
    }
}
