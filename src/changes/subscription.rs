//! Prefix-filtered subscriptions

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{RecvTimeoutError, Sender, TryRecvError};

use crate::config::MailboxSettings;
use crate::error::{FlowError, Result};

use super::{ChangeBus, ChangeEvent, Mailbox, SubscriberId};

/// A registered mailbox that only surfaces events under its prefixes
///
/// An empty prefix list matches every key. Dropping the subscription releases
/// the mailbox and unregisters it, which also frees a publisher blocked on it.
pub struct Subscription {
    bus: Arc<ChangeBus>,
    id: SubscriberId,
    mailbox: Option<Mailbox>,
    prefixes: Vec<String>,
}

impl Subscription {
    pub fn new(bus: Arc<ChangeBus>, prefixes: Vec<String>) -> Self {
        let settings = bus.default_settings();
        Self::with_settings(bus, prefixes, settings)
    }

    pub fn with_settings(
        bus: Arc<ChangeBus>,
        prefixes: Vec<String>,
        settings: MailboxSettings,
    ) -> Self {
        for prefix in &prefixes {
            tracing::debug!("data-sub {}", prefix);
        }
        let (id, mailbox) = bus.register_with(settings);
        Self {
            bus,
            id,
            mailbox: Some(mailbox),
            prefixes,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn matches(&self, key: &str) -> bool {
        self.prefixes.is_empty() || self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    fn mailbox(&self) -> Result<&Mailbox> {
        self.mailbox.as_ref().ok_or(FlowError::ChannelClosed)
    }

    /// Block until the next matching event
    ///
    /// Fails with `ChannelClosed` once the mailbox has been unregistered.
    pub fn recv(&self) -> Result<ChangeEvent> {
        let mailbox = self.mailbox()?;
        loop {
            let event = mailbox.recv().map_err(|_| FlowError::ChannelClosed)?;
            if self.matches(&event.key) {
                return Ok(event);
            }
        }
    }

    /// Next matching event already queued, if any
    pub fn try_recv(&self) -> Result<Option<ChangeEvent>> {
        let mailbox = self.mailbox()?;
        loop {
            match mailbox.try_recv() {
                Ok(event) if self.matches(&event.key) => return Ok(Some(event)),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(FlowError::ChannelClosed),
            }
        }
    }

    /// Wait up to `timeout` for a matching event
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<ChangeEvent>> {
        let mailbox = self.mailbox()?;
        let deadline = Instant::now() + timeout;
        loop {
            match mailbox.recv_deadline(deadline) {
                Ok(event) if self.matches(&event.key) => return Ok(Some(event)),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => return Err(FlowError::ChannelClosed),
            }
        }
    }

    /// Blocking iterator over matching events; ends when the mailbox closes
    pub fn iter(&self) -> impl Iterator<Item = ChangeEvent> + '_ {
        std::iter::from_fn(move || self.recv().ok())
    }

    /// Forward matching events to `output` until either side goes away
    ///
    /// Returns `Ok` when the mailbox closes and `ChannelClosed` when the
    /// output has no receiver left.
    pub fn forward(&self, output: &Sender<ChangeEvent>) -> Result<()> {
        for event in self.iter() {
            output.send(event).map_err(|_| FlowError::ChannelClosed)?;
        }
        Ok(())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Receiver first: a publisher blocked on this mailbox fails fast and
        // releases the registry read lock before we ask for the write lock.
        drop(self.mailbox.take());
        self.bus.unregister(self.id);
    }
}
