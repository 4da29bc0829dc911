//! Item activation states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Activation state of an item
///
/// States are ordered; a modifier requiring `Online` applies to an item that
/// is `Online`, `Active` or `Overload`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum State {
    #[default]
    Offline,
    Online,
    Active,
    Overload,
}

impl State {
    /// All states in ascending order
    pub const ALL: [State; 4] = [State::Offline, State::Online, State::Active, State::Overload];

    /// Check whether this state satisfies a required minimum
    pub fn reaches(self, required: State) -> bool {
        self >= required
    }

    /// States that become enabled when moving from `self` to `to`
    ///
    /// Empty when `to` is not higher than `self`.
    pub fn activated_towards(self, to: State) -> Vec<State> {
        State::ALL
            .iter()
            .copied()
            .filter(|s| *s > self && *s <= to)
            .collect()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Offline => "offline",
            State::Online => "online",
            State::Active => "active",
            State::Overload => "overload",
        };
        write!(f, "{}", name)
    }
}
