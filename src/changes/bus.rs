//! Change Bus
//!
//! Registry of subscriber mailboxes plus the publish loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::RwLock;

use crate::config::{DeliveryPolicy, MailboxSettings};

use super::{ChangeEvent, SubscriberId};

/// Receiving end of a subscriber's mailbox
pub type Mailbox = Receiver<ChangeEvent>;

struct Slot {
    tx: Sender<ChangeEvent>,
    /// Bus-side receiver used to evict the oldest event (`DropOldest` only)
    evict: Option<Receiver<ChangeEvent>>,
    policy: DeliveryPolicy,
}

impl Slot {
    fn new(settings: MailboxSettings) -> (Self, Mailbox) {
        let (tx, rx) = match settings.policy {
            DeliveryPolicy::Unbounded => channel::unbounded(),
            DeliveryPolicy::Block | DeliveryPolicy::DropOldest => {
                channel::bounded(settings.capacity.max(1))
            }
        };
        let evict = (settings.policy == DeliveryPolicy::DropOldest).then(|| rx.clone());
        let slot = Self {
            tx,
            evict,
            policy: settings.policy,
        };
        (slot, rx)
    }

    /// Returns false when the subscriber side is gone
    fn deliver(&self, event: &ChangeEvent) -> bool {
        match self.policy {
            DeliveryPolicy::Block | DeliveryPolicy::Unbounded => {
                self.tx.send(event.clone()).is_ok()
            }
            DeliveryPolicy::DropOldest => {
                let mut pending = event.clone();
                loop {
                    match self.tx.try_send(pending) {
                        Ok(()) => return true,
                        Err(TrySendError::Full(back)) => {
                            pending = back;
                            if let Some(evict) = &self.evict {
                                let _ = evict.try_recv();
                            }
                        }
                        Err(TrySendError::Disconnected(_)) => return false,
                    }
                }
            }
        }
    }
}

/// Registry of subscribers and the fan-out of change events
///
/// ## Concurrency:
/// - `register`/`unregister` take the write side of the registry lock
/// - `publish` takes the read side, so publishers run concurrently; a
///   publisher may wait on a full `Block` mailbox while holding it
pub struct ChangeBus {
    subscribers: RwLock<HashMap<SubscriberId, Slot>>,
    next_id: AtomicU64,
    defaults: MailboxSettings,
}

impl ChangeBus {
    pub fn new(defaults: MailboxSettings) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            defaults,
        }
    }

    /// Register a mailbox with the bus defaults
    pub fn register(&self) -> (SubscriberId, Mailbox) {
        self.register_with(self.defaults)
    }

    pub fn register_with(&self, settings: MailboxSettings) -> (SubscriberId, Mailbox) {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (slot, mailbox) = Slot::new(settings);
        self.subscribers.write().insert(id, slot);

        tracing::info!(
            "Registered {} (capacity {}, {:?})",
            id,
            settings.capacity,
            settings.policy
        );
        (id, mailbox)
    }

    /// Remove a mailbox; queued events are dropped with it
    ///
    /// Returns false if `id` was not registered.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            tracing::info!("Unregistered {}", id);
        }
        removed
    }

    /// Deliver `event` to every registered mailbox
    ///
    /// Returns the number of mailboxes that accepted it.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let subscribers = self.subscribers.read();
        let mut delivered = 0;
        for (id, slot) in subscribers.iter() {
            if slot.deliver(event) {
                delivered += 1;
            } else {
                tracing::trace!("{} has no receiver, skipping {}", id, event.key);
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn default_settings(&self) -> MailboxSettings {
        self.defaults
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(MailboxSettings::default())
    }
}
