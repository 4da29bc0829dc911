//! Identity types for fit items and catalog records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an item instance inside a fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Create a new item ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item:{}", self.0)
    }
}

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Create a new ID
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Get the raw ID value
            pub fn raw(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }
    };
}

catalog_id!(
    /// Identifier of an item type in the catalog
    TypeId,
    "type"
);
catalog_id!(
    /// Identifier of an attribute definition
    AttrId,
    "attr"
);
catalog_id!(
    /// Identifier of an effect definition
    EffectId,
    "effect"
);
catalog_id!(
    /// Identifier of an item group (e.g. "energy weapon")
    GroupId,
    "group"
);
catalog_id!(
    /// Identifier of an item category (e.g. "ship", "charge")
    CategoryId,
    "category"
);
