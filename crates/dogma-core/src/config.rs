//! Engine configuration

use crate::CategoryId;
use serde::{Deserialize, Serialize};

/// Category of ship items
pub const CATEGORY_SHIP: CategoryId = CategoryId(6);
/// Category of charges
pub const CATEGORY_CHARGE: CategoryId = CategoryId(8);
/// Category of skills
pub const CATEGORY_SKILL: CategoryId = CategoryId(16);
/// Category of implants and boosters
pub const CATEGORY_IMPLANT: CategoryId = CategoryId(20);
/// Category of subsystems
pub const CATEGORY_SUBSYSTEM: CategoryId = CategoryId(32);

/// Configuration for a [`Fit`](crate::Fit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Source categories whose multipliers are never stacking penalized
    pub penalty_immune_categories: Vec<CategoryId>,
    /// Maximum number of retained diagnostics (0 = unlimited)
    pub max_diagnostics: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            penalty_immune_categories: vec![
                CATEGORY_SHIP,
                CATEGORY_CHARGE,
                CATEGORY_SKILL,
                CATEGORY_IMPLANT,
                CATEGORY_SUBSYSTEM,
            ],
            max_diagnostics: 256,
        }
    }
}

impl EngineConfig {
    /// Configuration in which every source category is penalized
    pub fn without_immunity() -> Self {
        Self {
            penalty_immune_categories: Vec::new(),
            ..Self::default()
        }
    }

    pub fn is_penalty_immune(&self, category: CategoryId) -> bool {
        self.penalty_immune_categories.contains(&category)
    }
}
