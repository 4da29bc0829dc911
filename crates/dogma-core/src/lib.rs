//! Dogma Core - Incremental attribute calculation engine
//!
//! This crate computes the attributes of items assembled into a fit, where
//! items modify each other's attributes through catalog-defined modifiers:
//! - Immutable catalog records (`Catalog`, `AttributeDef`, `EffectDef`, `TypeDef`)
//! - Compiled modifiers with operator tiers (`Modifier`, `Operator`)
//! - A per-item lazy attribute cache with overrides (`AttributeMap`)
//! - An affection registry mapping sources to targets (`AffectionRegistry`)
//! - Synchronous message-driven invalidation (`Msg`, `MessageBus`, `Subscriber`)
//! - Stacking-penalized value combination (`evaluator`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use dogma_core::{Fit, ItemKind, State};
//! use std::sync::Arc;
//!
//! let mut fit = Fit::new(Arc::new(catalog));
//! let ship = fit.add_item(ItemKind::Ship, ship_type)?;
//! let module = fit.add_item(ItemKind::Module, module_type)?;
//! fit.set_state(module, State::Active)?;
//!
//! let speed = fit.attr(ship, max_velocity)?;
//! ```

mod attribute_map;
mod behavior;
mod bus;
mod catalog;
mod config;
mod diagnostics;
mod error;
pub mod evaluator;
mod fit;
mod identity;
mod item;
pub mod journal;
mod modifier;
mod msg;
pub mod registry;
mod restriction;
mod state;

pub use attribute_map::{AttributeMap, OverrideFn};
pub use behavior::{EffectBehavior, EffectOutput};
pub use bus::{MessageBus, Subscriber, SubscriberId};
pub use catalog::{AttributeDef, BuildStatus, Catalog, EffectCategory, EffectDef, TypeDef};
pub use config::{
    EngineConfig, CATEGORY_CHARGE, CATEGORY_IMPLANT, CATEGORY_SHIP, CATEGORY_SKILL,
    CATEGORY_SUBSYSTEM,
};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};
pub use fit::{Fit, SideEffectStatus};
pub use identity::{AttrId, CategoryId, EffectId, GroupId, ItemId, TypeId};
pub use item::{Item, ItemKind, ItemStore};
pub use journal::{Journal, JournalConfig, JournalEntry, JournalStats};
pub use modifier::{Domain, Modifier, ModifierContext, Operator, SkillRef, TargetFilter, Tier};
pub use msg::{Msg, MsgKind};
pub use registry::{AffectionRegistry, Affector};
pub use restriction::{StateRestriction, StateViolation};
pub use state::State;
