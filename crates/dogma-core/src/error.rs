//! Error types for dogma-core

use crate::{AttrId, Domain, ItemId, ItemKind, TypeId};
use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("unable to find base value for attribute {attr} on eve type {type_id} ({item})")]
    MissingBaseValue {
        item: ItemId,
        type_id: TypeId,
        attr: AttrId,
    },

    #[error("override of {attr} on {item} failed: {reason}")]
    OverrideRaised {
        item: ItemId,
        attr: AttrId,
        reason: String,
    },

    #[error("{attr} on {item} depends on itself")]
    DependencyCycle { item: ItemId, attr: AttrId },

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("{type_id} of {item} is not in the catalog")]
    TypeNotLoaded { item: ItemId, type_id: TypeId },

    #[error("Attribute not found: {attr}")]
    AttributeNotFound { attr: AttrId },

    #[error("Fit already has a {0:?}")]
    SlotOccupied(ItemKind),

    #[error("{item} cannot be placed in the {domain} domain")]
    InvalidPlacement { item: ItemId, domain: Domain },

    #[error("{0} cannot hold a charge")]
    NotAChargeHolder(ItemId),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
