//! Schema definitions for RON catalog files

pub mod attribute;
pub mod effect;
pub mod item_type;

pub use attribute::AttributeSchema;
pub use effect::{EffectSchema, ModifierSchema};
pub use item_type::TypeSchema;
