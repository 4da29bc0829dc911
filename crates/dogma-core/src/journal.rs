//! Message journal for auditing and debugging
//!
//! The journal is a bus subscriber that records every message it is
//! interested in, tagged with a sequence number.
//!
//! # Example
//!
//! ```rust,ignore
//! use dogma_core::{Fit, Journal};
//! use std::{cell::RefCell, rc::Rc};
//!
//! let journal = Rc::new(RefCell::new(Journal::new()));
//! fit.subscribe(Box::new(journal.clone()));
//!
//! fit.set_state(module, State::Active)?;
//! for entry in journal.borrow().entries() {
//!     println!("{} {:?}", entry.seq, entry.msg);
//! }
//! ```

use crate::{ItemId, Msg, MsgKind, Subscriber};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A recorded message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the journal, never reused
    pub seq: u64,
    pub msg: Msg,
}

/// Configuration for the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Whether recording is enabled
    pub recording_enabled: bool,
    /// Maximum number of entries to keep (0 = unlimited)
    pub max_entries: usize,
    /// Message kinds to record (empty = all)
    pub kinds: Vec<MsgKind>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            recording_enabled: true,
            max_entries: 0,
            kinds: Vec::new(),
        }
    }
}

/// The journal for recording fit messages
#[derive(Debug, Clone, Default)]
pub struct Journal {
    config: JournalConfig,
    entries: Vec<JournalEntry>,
    next_seq: u64,
}

impl Journal {
    /// Create a new journal recording every message kind
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: JournalConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn start_recording(&mut self) {
        self.config.recording_enabled = true;
    }

    pub fn stop_recording(&mut self) {
        self.config.recording_enabled = false;
    }

    pub fn is_recording(&self) -> bool {
        self.config.recording_enabled
    }

    /// Record a message
    pub fn record(&mut self, msg: Msg) {
        if !self.config.recording_enabled {
            return;
        }
        self.entries.push(JournalEntry {
            seq: self.next_seq,
            msg,
        });
        self.next_seq += 1;
        self.enforce_limits();
    }

    /// Get all retained entries
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Get entries with a sequence number at or above `seq`
    pub fn entries_since(&self, seq: u64) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |e| e.seq >= seq)
    }

    /// Get messages only
    pub fn messages(&self) -> impl Iterator<Item = &Msg> {
        self.entries.iter().map(|e| &e.msg)
    }

    /// Get messages about one item
    pub fn messages_for(&self, item: ItemId) -> impl Iterator<Item = &Msg> {
        self.messages().filter(move |m| m.item() == item)
    }

    /// Clear all entries; sequence numbers keep increasing
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get statistics about the journal
    pub fn stats(&self) -> JournalStats {
        let mut by_kind: IndexMap<MsgKind, usize> = IndexMap::new();
        for entry in &self.entries {
            *by_kind.entry(entry.msg.kind()).or_default() += 1;
        }
        JournalStats {
            total_entries: self.entries.len(),
            by_kind,
            first_seq: self.entries.first().map(|e| e.seq),
            last_seq: self.entries.last().map(|e| e.seq),
        }
    }

    fn enforce_limits(&mut self) {
        if self.config.max_entries > 0 && self.entries.len() > self.config.max_entries {
            let excess = self.entries.len() - self.config.max_entries;
            self.entries.drain(0..excess);
        }
    }
}

impl Subscriber for Journal {
    fn interests(&self) -> HashSet<MsgKind> {
        if self.config.kinds.is_empty() {
            MsgKind::ALL.into_iter().collect()
        } else {
            self.config.kinds.iter().copied().collect()
        }
    }

    fn on_message(&mut self, msg: &Msg) {
        self.record(*msg);
    }
}

/// Statistics about the journal
#[derive(Debug, Clone)]
pub struct JournalStats {
    /// Total number of retained entries
    pub total_entries: usize,
    /// Retained entries per message kind
    pub by_kind: IndexMap<MsgKind, usize>,
    /// Oldest retained sequence number
    pub first_seq: Option<u64>,
    /// Newest sequence number
    pub last_seq: Option<u64>,
}
