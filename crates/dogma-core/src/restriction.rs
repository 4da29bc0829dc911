//! State restriction: items may not be put in a state their type forbids
//!
//! A reference consumer of the subscriber surface. It follows item states
//! through messages and checks them against the catalog on demand.

use crate::{Fit, ItemId, Msg, MsgKind, State, Subscriber};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An item in a state above what its type allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateViolation {
    pub item: ItemId,
    pub state: State,
    pub max_state: State,
}

/// Tracks items at or above online
#[derive(Debug, Clone, Default)]
pub struct StateRestriction {
    tracked: IndexMap<ItemId, State>,
}

impl StateRestriction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items currently tracked with their state
    pub fn tracked(&self) -> impl Iterator<Item = (ItemId, State)> + '_ {
        self.tracked.iter().map(|(id, state)| (*id, *state))
    }

    /// Report every tracked item whose state exceeds its type's maximum
    ///
    /// Items whose type is not in the catalog are not checked.
    pub fn validate(&self, fit: &Fit) -> Vec<StateViolation> {
        self.tracked
            .iter()
            .filter_map(|(id, state)| {
                let item = fit.item(*id)?;
                let max_state = fit.catalog().type_def(item.type_id())?.max_state;
                (*state > max_state).then_some(StateViolation {
                    item: *id,
                    state: *state,
                    max_state,
                })
            })
            .collect()
    }
}

impl Subscriber for StateRestriction {
    fn interests(&self) -> HashSet<MsgKind> {
        [MsgKind::StateChanged, MsgKind::ItemRemoved]
            .into_iter()
            .collect()
    }

    fn on_message(&mut self, msg: &Msg) {
        match *msg {
            Msg::StateChanged { item, new, .. } if new >= State::Online => {
                self.tracked.insert(item, new);
            }
            Msg::StateChanged { item, .. } | Msg::ItemRemoved { item } => {
                self.tracked.shift_remove(&item);
            }
            _ => {}
        }
    }
}
