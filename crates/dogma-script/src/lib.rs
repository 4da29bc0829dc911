//! Dogma Script - RON catalog loader and schema definitions
//!
//! Loads engine data from RON files:
//! - Attribute definitions
//! - Effect definitions with compiled modifiers
//! - Item type definitions
//! - Engine configuration

mod error;
mod loader;
mod schema;

pub use error::{Error, Result};
pub use loader::{load_config_file, load_config_str, Loader};
pub use schema::{AttributeSchema, EffectSchema, ModifierSchema, TypeSchema};
