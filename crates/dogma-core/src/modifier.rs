//! Compiled modifier descriptors
//!
//! A modifier says: "while the source item is at least in `state`, apply
//! `operator` with the value of the source's `source_attr` to `target_attr`
//! of every item selected by `target_filter` within `target_domain`".
//!
//! Modifiers are plain values. Two modifiers with equal fields are the same
//! modifier, so an item's effective modifiers always form a set.

use crate::{AttrId, GroupId, State, TypeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Skill reference used by skill requirement filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillRef {
    /// A concrete skill type
    Type(TypeId),
    /// The type of the modifier's source item
    SelfType,
}

impl SkillRef {
    /// Resolve against the type of the source item
    pub fn resolve(self, source_type: TypeId) -> TypeId {
        match self {
            SkillRef::Type(id) => id,
            SkillRef::SelfType => source_type,
        }
    }
}

/// How a modifier selects its targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetFilter {
    /// The single item denoted by the domain
    Item,
    /// Every item placed in the domain
    Domain,
    /// Items in the domain whose type belongs to a group
    DomainGroup(GroupId),
    /// Items in the domain whose type requires a skill
    DomainSkillrq(SkillRef),
    /// Owner-modifiable items (drones, fighters, charges) requiring a skill
    OwnerSkillrq(SkillRef),
}

/// Domain a modifier's target is looked up in, relative to its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// The source item itself
    SelfItem,
    /// The fit's character
    Character,
    /// The fit's ship
    Ship,
    /// The item linked to the source (charge to module and back)
    Other,
    /// A projected target; never resolved inside a single fit
    Target,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Domain::SelfItem => "self",
            Domain::Character => "character",
            Domain::Ship => "ship",
            Domain::Other => "other",
            Domain::Target => "target",
        };
        write!(f, "{}", name)
    }
}

/// Operator tiers applied to a base value
///
/// Declaration order matches evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operator {
    PreAssign,
    PreMul,
    PreDiv,
    ModAdd,
    ModSub,
    PostMul,
    PostDiv,
    PostPercent,
    PostAssign,
}

/// Evaluation tier of an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    PreAssign,
    PreMultiplicative,
    Additive,
    PostMultiplicative,
    PostAssign,
}

impl Operator {
    /// Get the tier this operator is evaluated in
    pub fn tier(self) -> Tier {
        match self {
            Operator::PreAssign => Tier::PreAssign,
            Operator::PreMul | Operator::PreDiv => Tier::PreMultiplicative,
            Operator::ModAdd | Operator::ModSub => Tier::Additive,
            Operator::PostMul | Operator::PostDiv | Operator::PostPercent => {
                Tier::PostMultiplicative
            }
            Operator::PostAssign => Tier::PostAssign,
        }
    }

    /// Check whether the operator takes part in stacking penalties
    pub fn is_penalizable(self) -> bool {
        self.tier() == Tier::PostMultiplicative
    }
}

/// Whether a modifier applies inside the fit or is broadcast to a gang
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModifierContext {
    #[default]
    Local,
    Gang,
}

/// A compiled modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifier {
    pub target_filter: TargetFilter,
    pub target_domain: Domain,
    pub target_attr: AttrId,
    pub operator: Operator,
    pub source_attr: AttrId,
    /// Minimal state of the source item for the modifier to apply
    pub state: State,
    #[serde(default)]
    pub context: ModifierContext,
}

impl Modifier {
    /// Create a local modifier targeting a single item
    pub fn item(
        domain: Domain,
        target_attr: AttrId,
        operator: Operator,
        source_attr: AttrId,
    ) -> Self {
        Self {
            target_filter: TargetFilter::Item,
            target_domain: domain,
            target_attr,
            operator,
            source_attr,
            state: State::Offline,
            context: ModifierContext::Local,
        }
    }

    /// Create a local modifier with an explicit filter
    pub fn filtered(
        filter: TargetFilter,
        domain: Domain,
        target_attr: AttrId,
        operator: Operator,
        source_attr: AttrId,
    ) -> Self {
        Self {
            target_filter: filter,
            ..Self::item(domain, target_attr, operator, source_attr)
        }
    }

    /// Set the required source state
    pub fn with_state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    /// Set the modifier context
    pub fn with_context(mut self, context: ModifierContext) -> Self {
        self.context = context;
        self
    }
}
