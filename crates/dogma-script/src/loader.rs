//! RON catalog loader
//!
//! A catalog file holds any of three sections:
//!
//! ```ron
//! (
//!     attributes: [ (id: 37, stackable: false) ],
//!     effects: [ (id: 1, category: Passive, modifiers: [ ... ]) ],
//!     types: [ (id: 587, group_id: 25, category_id: 6, attributes: { 37: 355.0 }) ],
//! )
//! ```
//!
//! Definitions may be spread over several files; references between them are
//! checked when [`Loader::finish`] builds the catalog.

use crate::error::{Error, Result};
use crate::schema::{AttributeSchema, EffectSchema, TypeSchema};
use dogma_core::{
    AttrId, BuildStatus, Catalog, EffectDef, EffectId, EngineConfig, State, TypeDef, TypeId,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    attributes: Vec<AttributeSchema>,
    #[serde(default)]
    effects: Vec<EffectSchema>,
    #[serde(default)]
    types: Vec<TypeSchema>,
}

/// Loader for RON catalog files
#[derive(Debug, Default)]
pub struct Loader {
    attributes: IndexMap<AttrId, AttributeSchema>,
    effects: IndexMap<EffectId, EffectSchema>,
    types: IndexMap<TypeId, TypeSchema>,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading catalog file");
        self.load_str(&content)
    }

    /// Load every section of a RON string
    pub fn load_str(&mut self, content: &str) -> Result<()> {
        let file: CatalogFile = ron::from_str(content)?;
        for attribute in file.attributes {
            self.add_attribute(attribute)?;
        }
        for effect in file.effects {
            self.add_effect(effect)?;
        }
        for item_type in file.types {
            self.add_type(item_type)?;
        }
        Ok(())
    }

    /// Load attributes from a RON string
    pub fn load_attributes_str(&mut self, content: &str) -> Result<()> {
        let attributes: Vec<AttributeSchema> = ron::from_str(content)?;
        attributes.into_iter().try_for_each(|a| self.add_attribute(a))
    }

    /// Load effects from a RON string
    pub fn load_effects_str(&mut self, content: &str) -> Result<()> {
        let effects: Vec<EffectSchema> = ron::from_str(content)?;
        effects.into_iter().try_for_each(|e| self.add_effect(e))
    }

    /// Load item types from a RON string
    pub fn load_types_str(&mut self, content: &str) -> Result<()> {
        let types: Vec<TypeSchema> = ron::from_str(content)?;
        types.into_iter().try_for_each(|t| self.add_type(t))
    }

    /// Load all RON files from a directory, in file name order
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for file_path in entries {
            if file_path.extension().map(|e| e == "ron").unwrap_or(false) {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    pub fn add_attribute(&mut self, attribute: AttributeSchema) -> Result<()> {
        if attribute.max_attribute == Some(attribute.id) {
            return Err(Error::InvalidSchema(format!(
                "{} is capped by itself",
                attribute.id
            )));
        }
        if self.attributes.contains_key(&attribute.id) {
            return Err(Error::DuplicateDefinition(attribute.id.to_string()));
        }
        self.attributes.insert(attribute.id, attribute);
        Ok(())
    }

    pub fn add_effect(&mut self, effect: EffectSchema) -> Result<()> {
        if self.effects.contains_key(&effect.id) {
            return Err(Error::DuplicateDefinition(effect.id.to_string()));
        }
        self.effects.insert(effect.id, effect);
        Ok(())
    }

    pub fn add_type(&mut self, item_type: TypeSchema) -> Result<()> {
        if self.types.contains_key(&item_type.id) {
            return Err(Error::DuplicateDefinition(item_type.id.to_string()));
        }
        self.types.insert(item_type.id, item_type);
        Ok(())
    }

    /// Number of loaded attributes, effects and types
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.attributes.len(), self.effects.len(), self.types.len())
    }

    /// Check references and build the catalog
    ///
    /// Types must only reference known attributes and effects. Modifiers
    /// referencing unknown attributes are dropped and their effect marked
    /// as partially built.
    pub fn finish(self) -> Result<Catalog> {
        let mut catalog = Catalog::new();

        for attribute in self.attributes.values() {
            if let Some(cap) = attribute.max_attribute {
                if !self.attributes.contains_key(&cap) {
                    return Err(Error::UnknownReference(format!(
                        "{} is capped by unknown {}",
                        attribute.id, cap
                    )));
                }
            }
            catalog.insert_attribute(attribute.to_def());
        }

        for effect in self.effects.values() {
            catalog.insert_effect(self.compile_effect(effect));
        }

        for item_type in self.types.values() {
            let def = self.compile_type(item_type, &catalog)?;
            catalog.insert_type(def);
        }

        debug!(
            attributes = self.attributes.len(),
            effects = self.effects.len(),
            types = self.types.len(),
            "catalog built"
        );
        Ok(catalog)
    }

    fn compile_effect(&self, effect: &EffectSchema) -> EffectDef {
        let mut def = EffectDef::new(effect.id, effect.category);
        def.usage_chance_attr = effect.usage_chance_attr;
        def.behavior = effect.behavior;

        let Some(implied) = effect.category.required_state() else {
            if !effect.modifiers.is_empty() {
                warn!(effect = %effect.id, category = ?effect.category, "effect category is not supported, modifiers dropped");
            }
            def.build_status = BuildStatus::Error;
            return def;
        };

        for modifier in &effect.modifiers {
            let known = self.attributes.contains_key(&modifier.target_attr)
                && self.attributes.contains_key(&modifier.source_attr);
            if known {
                def.modifiers.push(modifier.compile(implied));
            } else {
                warn!(effect = %effect.id, target = %modifier.target_attr, source = %modifier.source_attr, "modifier references an unknown attribute, dropped");
                def.build_status = BuildStatus::Partial;
            }
        }
        def
    }

    fn compile_type(&self, item_type: &TypeSchema, catalog: &Catalog) -> Result<TypeDef> {
        for attr in item_type.attributes.keys() {
            if !self.attributes.contains_key(attr) {
                return Err(Error::UnknownReference(format!(
                    "{} uses unknown {}",
                    item_type.id, attr
                )));
            }
        }
        for effect in item_type.effects.iter().chain(item_type.default_effect.iter()) {
            if !self.effects.contains_key(effect) {
                return Err(Error::UnknownReference(format!(
                    "{} uses unknown {}",
                    item_type.id, effect
                )));
            }
        }

        let mut effects = item_type.effects.clone();
        if let Some(default) = item_type.default_effect {
            if !effects.contains(&default) {
                effects.push(default);
            }
        }

        let max_state = item_type.max_state.unwrap_or_else(|| {
            effects
                .iter()
                .filter_map(|id| catalog.effect(*id))
                .filter_map(|e| e.category.required_state())
                .max()
                .unwrap_or(State::Offline)
        });

        Ok(TypeDef {
            id: item_type.id,
            group_id: item_type.group_id,
            category_id: item_type.category_id,
            attributes: item_type.attributes.clone(),
            effects,
            default_effect: item_type.default_effect,
            required_skills: item_type.required_skills.clone(),
            max_state,
        })
    }
}

/// Load engine configuration from a RON string
pub fn load_config_str(content: &str) -> Result<EngineConfig> {
    Ok(ron::from_str(content)?)
}

/// Load engine configuration from a RON file
pub fn load_config_file(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let content = fs::read_to_string(path)?;
    load_config_str(&content)
}
