//! Synchronous publish/subscribe for fit messages
//!
//! Delivery is in subscription order and runs to completion before the
//! publishing call returns. Subscribers only see the message; they cannot
//! reach back into the fit while it is being mutated.

use crate::{Msg, MsgKind};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Something that reacts to fit messages
pub trait Subscriber {
    /// Message kinds this subscriber wants to receive
    fn interests(&self) -> HashSet<MsgKind>;

    /// Handle a message
    fn on_message(&mut self, msg: &Msg);
}

/// Lets a caller keep a handle to a subscriber owned by the bus
impl<S: Subscriber> Subscriber for Rc<RefCell<S>> {
    fn interests(&self) -> HashSet<MsgKind> {
        self.borrow().interests()
    }

    fn on_message(&mut self, msg: &Msg) {
        self.borrow_mut().on_message(msg);
    }
}

/// Handle returned by [`MessageBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

struct Entry {
    interests: HashSet<MsgKind>,
    subscriber: Box<dyn Subscriber>,
}

/// Ordered set of subscribers
#[derive(Default)]
pub struct MessageBus {
    subscribers: IndexMap<SubscriberId, Entry>,
    next_id: u64,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber after every existing one
    ///
    /// Interests are read once, at subscription time.
    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        let interests = subscriber.interests();
        self.subscribers.insert(
            id,
            Entry {
                interests,
                subscriber,
            },
        );
        id
    }

    /// Remove a subscriber, handing it back
    pub fn unsubscribe(&mut self, id: SubscriberId) -> Option<Box<dyn Subscriber>> {
        self.subscribers.shift_remove(&id).map(|e| e.subscriber)
    }

    /// Deliver a message to every interested subscriber
    pub fn deliver(&mut self, msg: &Msg) {
        let kind = msg.kind();
        for entry in self.subscribers.values_mut() {
            if entry.interests.contains(&kind) {
                entry.subscriber.on_message(msg);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("subscribers", &self.subscribers.keys().collect::<Vec<_>>())
            .finish()
    }
}
