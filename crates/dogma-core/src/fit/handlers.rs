//! Message publishing and the calculator's reactions to messages

use super::Fit;
use crate::registry::{SyncReport, Topology, Touched};
use crate::{AttrId, Diagnostic, DiagnosticKind, ItemId, Modifier, ModifierContext, Msg};
use indexmap::IndexSet;
use tracing::{debug, trace};

impl Fit {
    /// Handle a message internally, then hand it to subscribers
    ///
    /// Messages published while handling are delivered depth-first.
    pub(crate) fn publish(&mut self, msg: Msg) {
        trace!(?msg, "publish");
        self.handle(&msg);
        self.bus.deliver(&msg);
    }

    fn handle(&mut self, msg: &Msg) {
        match *msg {
            Msg::ItemAdded { item } => {
                let topology = Topology::new(&self.items, &self.catalog);
                let mut touched = self.registry.register_target(item, &topology);
                touched.extend(self.sync_item(item));
                self.invalidate_touched(touched);
            }
            Msg::ItemRemoved { item } => {
                let mut touched = self.registry.unregister_source(item);
                touched.extend(self.registry.unregister_target(item));
                touched.retain(|(target, _)| *target != item);
                self.invalidate_touched(touched);
            }
            Msg::StateChanged { item, .. } | Msg::EffectStatusChanged { item, .. } => {
                let touched = self.sync_item(item);
                self.invalidate_touched(touched);
            }
            Msg::DomainChanged { item, .. } => {
                let mut touched = self.registry.unregister_source(item);
                touched.extend(self.registry.unregister_target(item));
                let topology = Topology::new(&self.items, &self.catalog);
                touched.extend(self.registry.register_target(item, &topology));
                touched.extend(self.sync_item(item));
                self.invalidate_touched(touched);
            }
            Msg::AttrValueChanged { item, attr } => self.invalidate_readers(item, attr),
            // Changes under an override do not leak past it
            Msg::AttrValueChangedMasked { .. } => {}
        }
    }

    /// Re-register an item's effective modifiers
    fn sync_item(&mut self, item: ItemId) -> Vec<Touched> {
        let desired = self.effective_modifiers(item);
        let topology = Topology::new(&self.items, &self.catalog);
        let SyncReport {
            touched,
            unresolved,
        } = self.registry.sync_source(item, &desired, &topology);
        for modifier in unresolved {
            debug!(item = %item, attr = %modifier.target_attr, ?modifier, "modifier reaches no item");
            self.record_diagnostic(Diagnostic {
                kind: DiagnosticKind::UnresolvedFilterTarget,
                item,
                attr: modifier.target_attr,
            });
        }
        touched
    }

    /// Modifiers an item currently applies, given its state and side effects
    pub(crate) fn effective_modifiers(&self, item: ItemId) -> IndexSet<Modifier> {
        let mut out = IndexSet::new();
        let Some(it) = self.items.get(item) else {
            return out;
        };
        for effect in self.catalog.effects_of(it.type_id()) {
            if effect.is_side_effect() && !it.is_side_effect_enabled(effect.id) {
                continue;
            }
            if effect.category.required_state().is_none() {
                continue;
            }
            out.extend(effect.modifiers.iter().filter(|m| {
                it.state().reaches(m.state) && m.context == ModifierContext::Local
            }));
        }
        out
    }

    /// Drop values computed from `(item, attr)`, on the same item and across items
    fn invalidate_readers(&mut self, item: ItemId, attr: AttrId) {
        let mut readers: Vec<Touched> = self
            .items
            .get(item)
            .map(|it| it.attrs.dependents_of(attr))
            .unwrap_or_default()
            .into_iter()
            .map(|dependent| (item, dependent))
            .collect();
        readers.extend(self.registry.affectees(item, attr));
        for (reader, reader_attr) in readers {
            self.invalidate_attr(reader, reader_attr);
        }
    }

    /// Invalidate pairs whose modifier set changed
    ///
    /// A pair that was never cached may still have readers that skipped it
    /// while it had no value; those are invalidated directly.
    fn invalidate_touched(&mut self, touched: Vec<Touched>) {
        for (item, attr) in touched {
            if self.invalidate_attr(item, attr) {
                continue;
            }
            let overridden = match self.items.get(item) {
                Some(it) => it.attrs.has_override(attr),
                None => continue,
            };
            if !overridden {
                self.invalidate_readers(item, attr);
            }
        }
    }
}
