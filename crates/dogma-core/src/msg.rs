//! Message types published on a fit's bus

use crate::{AttrId, Domain, EffectId, ItemId, State};
use serde::{Deserialize, Serialize};

/// The kind of message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgKind {
    /// Item joined the fit
    ItemAdded,
    /// Item is about to leave the fit
    ItemRemoved,
    /// Item activation state changed
    StateChanged,
    /// Item moved to another domain
    DomainChanged,
    /// Side effect enabled or disabled
    EffectStatusChanged,
    /// Attribute value may have changed
    AttrValueChanged,
    /// Attribute value changed underneath an override
    AttrValueChangedMasked,
}

impl MsgKind {
    /// Every message kind
    pub const ALL: [MsgKind; 7] = [
        MsgKind::ItemAdded,
        MsgKind::ItemRemoved,
        MsgKind::StateChanged,
        MsgKind::DomainChanged,
        MsgKind::EffectStatusChanged,
        MsgKind::AttrValueChanged,
        MsgKind::AttrValueChangedMasked,
    ];
}

/// A message describing a change in a fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Msg {
    ItemAdded {
        item: ItemId,
    },
    ItemRemoved {
        item: ItemId,
    },
    StateChanged {
        item: ItemId,
        old: State,
        new: State,
    },
    DomainChanged {
        item: ItemId,
        old: Option<Domain>,
        new: Option<Domain>,
    },
    EffectStatusChanged {
        item: ItemId,
        effect: EffectId,
        enabled: bool,
    },
    AttrValueChanged {
        item: ItemId,
        attr: AttrId,
    },
    AttrValueChangedMasked {
        item: ItemId,
        attr: AttrId,
    },
}

impl Msg {
    /// Get the kind of this message
    pub fn kind(&self) -> MsgKind {
        match self {
            Msg::ItemAdded { .. } => MsgKind::ItemAdded,
            Msg::ItemRemoved { .. } => MsgKind::ItemRemoved,
            Msg::StateChanged { .. } => MsgKind::StateChanged,
            Msg::DomainChanged { .. } => MsgKind::DomainChanged,
            Msg::EffectStatusChanged { .. } => MsgKind::EffectStatusChanged,
            Msg::AttrValueChanged { .. } => MsgKind::AttrValueChanged,
            Msg::AttrValueChangedMasked { .. } => MsgKind::AttrValueChangedMasked,
        }
    }

    /// Get the item this message is about
    pub fn item(&self) -> ItemId {
        match *self {
            Msg::ItemAdded { item }
            | Msg::ItemRemoved { item }
            | Msg::StateChanged { item, .. }
            | Msg::DomainChanged { item, .. }
            | Msg::EffectStatusChanged { item, .. }
            | Msg::AttrValueChanged { item, .. }
            | Msg::AttrValueChangedMasked { item, .. } => item,
        }
    }

    /// Create an attribute change message
    pub fn attr_changed(item: ItemId, attr: AttrId) -> Self {
        Msg::AttrValueChanged { item, attr }
    }

    /// Create a masked attribute change message
    pub fn attr_changed_masked(item: ItemId, attr: AttrId) -> Self {
        Msg::AttrValueChangedMasked { item, attr }
    }
}
