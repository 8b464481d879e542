//! The dispatch loop

use std::sync::Arc;

use crossbeam::channel::{Receiver, Sender};

use crate::database::Database;
use crate::error::{FlowError, Result};

use super::{Command, Definition, DefinitionRegistry, Message, Tag};

/// Runs tagged commands against a [`Database`]
///
/// Messages are handled strictly in arrival order. For a write, the store
/// is updated before the change event is published.
pub struct CommandProcessor {
    db: Database,
    registry: Arc<DefinitionRegistry>,
}

impl CommandProcessor {
    pub fn new(db: Database) -> Self {
        Self::with_registry(db, Arc::new(DefinitionRegistry::new()))
    }

    pub fn with_registry(db: Database, registry: Arc<DefinitionRegistry>) -> Self {
        Self { db, registry }
    }

    pub fn registry(&self) -> &Arc<DefinitionRegistry> {
        &self.registry
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Process one message, passing every output item to `emit`
    ///
    /// The first error from the database or from `emit` ends the command.
    pub fn handle<F>(&self, message: Message, emit: &mut F) -> Result<()>
    where
        F: FnMut(Message) -> Result<()>,
    {
        let tag = match message {
            Message::Tag(tag) => tag,
            other => return emit(other),
        };

        let command = Command::parse(&tag)?;
        if command.echoes() {
            emit(Message::Tag(tag.clone()))?;
        }

        match command {
            Command::Keys { prefix } => {
                for segment in self.db.keys(&prefix)? {
                    emit(Message::Value(segment.into()))?;
                }
            }
            Command::Get { key } => {
                emit(self.db.get(&key)?.into())?;
            }
            Command::Clear { prefix } => {
                let removed = self.db.clear(&prefix)?;
                tracing::debug!("cleared {} keys under {}", removed, prefix);
            }
            Command::Range { prefix } => {
                tracing::trace!("range {}", prefix);
                for (key, value) in self.db.range(&prefix)? {
                    emit(Message::Tag(Tag::new(key, value)))?;
                }
            }
            Command::Register { key } => self.register(&key)?,
            Command::Put { key, value } => self.db.put(&key, value)?,
            Command::Other => emit(Message::Tag(tag))?,
        }
        Ok(())
    }

    /// Drain `input` until it closes, sending results to `output`
    ///
    /// Stops at the first failing command, or with `ChannelClosed` when
    /// `output` has no receiver left.
    pub fn run(&self, input: &Receiver<Message>, output: &Sender<Message>) -> Result<()> {
        let mut emit = |message: Message| output.send(message).map_err(|_| FlowError::ChannelClosed);
        for message in input.iter() {
            self.handle(message, &mut emit)?;
        }
        Ok(())
    }

    fn register(&self, key: &str) -> Result<()> {
        let Some(source) = self.db.get_raw(key)? else {
            tracing::warn!("cannot register: {}", key);
            return Ok(());
        };

        let definition = Definition::new(key, source);
        tracing::info!(
            "register {}: {} bytes ({})",
            definition.name,
            definition.source.len(),
            key
        );
        self.registry.insert(definition);
        Ok(())
    }
}
