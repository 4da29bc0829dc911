//! Recovered conditions noticed during calculation
//!
//! Problems with a single modification source never abort a calculation.
//! They are emitted through `tracing` and kept in a bounded buffer so callers
//! can inspect them after the fact.

use crate::{AttrId, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Kind of a recovered condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A source attribute had no value; the source was skipped
    MissingBaseValue,
    /// A source attribute depended on itself; the source was skipped
    DependencyCycle,
    /// A source item's type is absent from the catalog
    TypeNotLoaded,
    /// A source attribute is absent from the catalog
    AttributeNotFound,
    /// A modifier filter selected no item
    UnresolvedFilterTarget,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::MissingBaseValue => "missing base value",
            DiagnosticKind::DependencyCycle => "dependency cycle",
            DiagnosticKind::TypeNotLoaded => "type not loaded",
            DiagnosticKind::AttributeNotFound => "attribute not found",
            DiagnosticKind::UnresolvedFilterTarget => "unresolved filter target",
        };
        write!(f, "{}", name)
    }
}

/// A recovered condition and where it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub item: ItemId,
    pub attr: AttrId,
}

/// Bounded diagnostic buffer; the oldest entries are dropped first
#[derive(Debug, Clone, Default)]
pub(crate) struct Diagnostics {
    entries: VecDeque<Diagnostic>,
    /// 0 = unlimited
    limit: usize,
}

impl Diagnostics {
    pub(crate) fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        if self.limit > 0 && self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(diagnostic);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub(crate) fn take(&mut self) -> Vec<Diagnostic> {
        self.entries.drain(..).collect()
    }
}
