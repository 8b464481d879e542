//! Command definitions
//!
//! Classifies a [`Tag`] into the command it requests.

use crate::error::{FlowError, Result};
use crate::value::Value;

use super::Tag;

/// First character of every reserved tag
pub const RESERVED_MARKER: char = '<';

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// List child segments under a prefix
    Keys { prefix: String },

    /// Look up one key
    Get { key: String },

    /// Delete every key under a prefix
    Clear { prefix: String },

    /// Emit every entry under a prefix
    Range { prefix: String },

    /// Record the payload stored at a key as a definition
    Register { key: String },

    /// Write (or delete, on nil) the key named by the tag
    Put { key: String, value: Option<Value> },

    /// A reserved tag this processor does not own
    Other,
}

impl Command {
    pub fn parse(tag: &Tag) -> Result<Command> {
        let command = match tag.tag.as_str() {
            "<keys>" => Command::Keys {
                prefix: string_payload(tag)?,
            },
            "<get>" => Command::Get {
                key: string_payload(tag)?,
            },
            "<clear>" => Command::Clear {
                prefix: string_payload(tag)?,
            },
            "<range>" => Command::Range {
                prefix: string_payload(tag)?,
            },
            "<register>" => Command::Register {
                key: string_payload(tag)?,
            },
            name if name.starts_with(RESERVED_MARKER) => Command::Other,
            name => Command::Put {
                key: name.to_string(),
                value: tag.msg.clone(),
            },
        };
        Ok(command)
    }

    /// Whether the processor echoes the command before its results
    pub fn echoes(&self) -> bool {
        matches!(
            self,
            Command::Keys { .. } | Command::Get { .. } | Command::Range { .. }
        )
    }
}

fn string_payload(tag: &Tag) -> Result<String> {
    match &tag.msg {
        Some(Value::Str(s)) => Ok(s.clone()),
        other => Err(FlowError::Protocol(format!(
            "{} expects a string payload, got {}",
            tag.tag,
            other.as_ref().map_or_else(|| "nil".to_string(), |v| v.to_string())
        ))),
    }
}
