//! Per-effect custom computations
//!
//! Some effects expose derived numbers beyond plain modifiers (how much
//! capacitor a transmitter moves per cycle, for instance). The strategy is
//! attached to the effect definition when the catalog is built and dispatched
//! by `match` in [`Fit::effect_output`](crate::Fit::effect_output).

use crate::AttrId;
use serde::{Deserialize, Serialize};

/// Strategy attached to an effect definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectBehavior {
    /// Moves `amount_attr` capacitor to the target every cycle of
    /// `duration_attr` milliseconds
    CapacitorTransmitter {
        amount_attr: AttrId,
        duration_attr: AttrId,
    },
}

/// Numbers produced by an effect behavior for one item
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectOutput {
    /// Amount per cycle
    pub amount: f64,
    /// Amount per second, 0 when the cycle time is unknown
    pub per_second: f64,
}

impl EffectOutput {
    /// Build an output from a per-cycle amount and a cycle time in milliseconds
    pub fn per_cycle(amount: f64, cycle_ms: Option<f64>) -> Self {
        let per_second = match cycle_ms {
            Some(ms) if ms > 0.0 => amount / (ms / 1000.0),
            _ => 0.0,
        };
        Self { amount, per_second }
    }
}
