//! Attribute reads, overrides and value computation

use super::Fit;
use crate::evaluator::{self, Contribution};
use crate::{
    AttrId, Diagnostic, DiagnosticKind, EffectBehavior, EffectId, EffectOutput, Error, ItemId,
    Msg, Result,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

impl Fit {
    /// Value of an attribute, honoring overrides
    ///
    /// Computed values are cached until something they depend on changes.
    pub fn attr(&mut self, item: ItemId, attr: AttrId) -> Result<f64> {
        let it = self.item_ref(item)?;
        if let Some(produced) = it.attrs.override_value(attr) {
            return produced.map_err(|reason| Error::OverrideRaised { item, attr, reason });
        }
        self.attr_without_override(item, attr)
    }

    /// Computed value of an attribute, ignoring any override
    pub fn attr_without_override(&mut self, item: ItemId, attr: AttrId) -> Result<f64> {
        let it = self.item_ref(item)?;
        if let Some(value) = it.attrs.cached(attr) {
            return Ok(value);
        }
        let type_id = it.type_id();
        if self.catalog.type_def(type_id).is_none() {
            return Err(Error::TypeNotLoaded { item, type_id });
        }
        if !self.evaluating.insert((item, attr)) {
            return Err(Error::DependencyCycle { item, attr });
        }
        let computed = self.calculate(item, attr);
        self.evaluating.shift_remove(&(item, attr));

        let (value, sources) = computed?;
        if let Some(it) = self.items.get_mut(item) {
            it.attrs.store(attr, value, sources);
        }
        trace!(item = %item, attr = %attr, value, "attribute computed");
        Ok(value)
    }

    /// Compute a value and the same-item attributes it read
    fn calculate(&mut self, item: ItemId, attr: AttrId) -> Result<(f64, Vec<AttrId>)> {
        let catalog = Arc::clone(&self.catalog);
        let type_id = self.item_ref(item)?.type_id();
        let type_def = catalog
            .type_def(type_id)
            .ok_or(Error::TypeNotLoaded { item, type_id })?;
        let attr_def = catalog
            .attr_def(attr)
            .ok_or(Error::AttributeNotFound { attr })?;
        let affectors = self.registry.affectors(item, attr);

        let base = match type_def.attributes.get(&attr).copied().or(attr_def.default_value) {
            Some(value) => value,
            None if affectors.is_empty() => {
                return Err(Error::MissingBaseValue {
                    item,
                    type_id,
                    attr,
                })
            }
            None => 0.0,
        };

        let mut sources = Vec::new();
        let mut contributions = Vec::with_capacity(affectors.len());
        for affector in affectors {
            let modifier = affector.modifier;
            let Some(source) = self.items.get(affector.source) else {
                continue;
            };
            if source.state() < modifier.state {
                continue;
            }
            let immune = catalog
                .type_def(source.type_id())
                .is_some_and(|t| self.config.is_penalty_immune(t.category_id));
            if affector.source == item {
                sources.push(modifier.source_attr);
            }

            match self.attr(affector.source, modifier.source_attr) {
                Ok(value) => contributions.push(Contribution {
                    operator: modifier.operator,
                    value,
                    penalized: !attr_def.stackable && !immune,
                }),
                Err(err @ Error::OverrideRaised { .. }) => return Err(err),
                Err(err) => self.skip_source(affector.source, modifier.source_attr, &err),
            }
        }

        let mut value = evaluator::combine(base, &contributions, attr_def.high_is_good);

        if let Some(cap_attr) = attr_def.max_attribute {
            sources.push(cap_attr);
            match self.attr(item, cap_attr) {
                Ok(cap) => value = value.min(cap),
                Err(err @ Error::OverrideRaised { .. }) => return Err(err),
                Err(err) => debug!(item = %item, attr = %attr, cap = %cap_attr, %err, "cap not applied"),
            }
        }

        Ok((value, sources))
    }

    /// Record a modification source that could not be read
    pub(crate) fn skip_source(&mut self, source: ItemId, attr: AttrId, err: &Error) {
        let kind = match err {
            Error::MissingBaseValue { .. } => DiagnosticKind::MissingBaseValue,
            Error::DependencyCycle { .. } => DiagnosticKind::DependencyCycle,
            Error::TypeNotLoaded { .. } => DiagnosticKind::TypeNotLoaded,
            Error::AttributeNotFound { .. } => DiagnosticKind::AttributeNotFound,
            _ => {
                warn!(item = %source, attr = %attr, %err, "modification source skipped");
                return;
            }
        };
        warn!(item = %source, attr = %attr, %kind, "{}", err);
        self.record_diagnostic(Diagnostic {
            kind,
            item: source,
            attr,
        });
    }

    /// Drop a cached value and announce the change if there was one
    ///
    /// Changes under an override are announced as masked.
    pub fn invalidate(&mut self, item: ItemId, attr: AttrId) -> Result<()> {
        self.item_ref(item)?;
        self.invalidate_attr(item, attr);
        Ok(())
    }

    /// Returns whether a cached value was dropped
    pub(crate) fn invalidate_attr(&mut self, item: ItemId, attr: AttrId) -> bool {
        let Some(it) = self.items.get_mut(item) else {
            return false;
        };
        if it.attrs.remove(attr).is_none() {
            return false;
        }
        let msg = if it.attrs.has_override(attr) {
            Msg::attr_changed_masked(item, attr)
        } else {
            Msg::attr_changed(item, attr)
        };
        self.publish(msg);
        true
    }

    /// Drop every cached value of an item
    pub fn clear_attrs(&mut self, item: ItemId) -> Result<()> {
        let attrs: Vec<AttrId> = self.item_ref(item)?.attrs.keys().collect();
        for attr in attrs {
            self.invalidate_attr(item, attr);
        }
        Ok(())
    }

    /// Replace an attribute's value with a producer
    ///
    /// Everything computed from the attribute is invalidated; the computed
    /// value stays available through [`Fit::attr_without_override`].
    pub fn set_override<F>(&mut self, item: ItemId, attr: AttrId, producer: F) -> Result<()>
    where
        F: Fn() -> f64 + 'static,
    {
        self.set_fallible_override(item, attr, move || Ok(producer()))
    }

    /// Like [`Fit::set_override`], with a producer that may fail
    pub fn set_fallible_override<F>(&mut self, item: ItemId, attr: AttrId, producer: F) -> Result<()>
    where
        F: Fn() -> std::result::Result<f64, String> + 'static,
    {
        self.item_mut(item)?.attrs.set_override(attr, Box::new(producer));
        self.publish(Msg::attr_changed(item, attr));
        Ok(())
    }

    /// Remove an override; returns whether one was installed
    pub fn clear_override(&mut self, item: ItemId, attr: AttrId) -> Result<bool> {
        let removed = self.item_mut(item)?.attrs.clear_override(attr);
        if removed {
            self.publish(Msg::attr_changed(item, attr));
        }
        Ok(removed)
    }

    /// Tell the fit an override producer may now return something else
    pub fn notify_override_may_have_changed(&mut self, item: ItemId, attr: AttrId) -> Result<()> {
        if self.item_ref(item)?.attrs.has_override(attr) {
            self.publish(Msg::attr_changed(item, attr));
        }
        Ok(())
    }

    /// Output of an effect's custom behavior on an item
    ///
    /// `None` when the effect has no behavior.
    pub fn effect_output(&mut self, item: ItemId, effect: EffectId) -> Result<Option<EffectOutput>> {
        self.item_ref(item)?;
        let Some(behavior) = self.catalog.effect(effect).and_then(|e| e.behavior) else {
            return Ok(None);
        };
        let output = match behavior {
            EffectBehavior::CapacitorTransmitter {
                amount_attr,
                duration_attr,
            } => {
                let amount = self.behavior_input(item, amount_attr)?.unwrap_or(0.0);
                let cycle = self.behavior_input(item, duration_attr)?;
                EffectOutput::per_cycle(amount, cycle)
            }
        };
        Ok(Some(output))
    }

    /// Read an attribute feeding an effect behavior
    ///
    /// Unreadable values are recorded as diagnostics and come back as `None`;
    /// a failing override is returned to the caller.
    fn behavior_input(&mut self, item: ItemId, attr: AttrId) -> Result<Option<f64>> {
        match self.attr(item, attr) {
            Ok(value) => Ok(Some(value)),
            Err(err @ Error::OverrideRaised { .. }) => Err(err),
            Err(err) => {
                self.skip_source(item, attr, &err);
                Ok(None)
            }
        }
    }
}
