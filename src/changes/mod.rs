//! Change Feed Module
//!
//! Fan-out of store mutations to live subscribers.
//!
//! ## Responsibilities
//! - Keep the registry of subscriber mailboxes ([`ChangeBus`])
//! - Deliver every published [`ChangeEvent`] to each mailbox under its
//!   [`DeliveryPolicy`](crate::config::DeliveryPolicy)
//! - Filter a mailbox by key prefixes and unregister on drop ([`Subscription`])

mod bus;
mod subscription;

use std::fmt;

use crate::value::Value;

pub use bus::{ChangeBus, Mailbox};
pub use subscription::Subscription;

/// One mutation: the new value, or `None` for a deletion
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub key: String,
    pub value: Option<Value>,
}

impl ChangeEvent {
    pub fn new(key: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn deletion(key: impl Into<String>) -> Self {
        Self::new(key, None)
    }

    pub fn is_deletion(&self) -> bool {
        self.value.is_none()
    }
}

/// Opaque identity of a registered mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}
