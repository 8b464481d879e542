//! Items flowing through a command stream

use serde_json::Map;

use crate::error::{FlowError, Result};
use crate::value::Value;

/// A key/payload pair; `msg: None` is a nil payload
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub tag: String,
    pub msg: Option<Value>,
}

impl Tag {
    pub fn new(tag: impl Into<String>, msg: impl Into<Option<Value>>) -> Self {
        Self {
            tag: tag.into(),
            msg: msg.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Tag(Tag),
    Value(Value),
    /// Result of a lookup that found nothing
    Absent,
}

impl Message {
    pub fn tag(tag: impl Into<String>, msg: impl Into<Option<Value>>) -> Self {
        Message::Tag(Tag::new(tag, msg))
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Message::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// JSON line form: `{"tag": .., "msg": ..}`, `null`, or the bare value
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Message::Tag(tag) => {
                let mut obj = Map::with_capacity(2);
                obj.insert("tag".to_string(), serde_json::Value::String(tag.tag.clone()));
                let msg = match &tag.msg {
                    Some(value) => value.to_json()?,
                    None => serde_json::Value::Null,
                };
                obj.insert("msg".to_string(), msg);
                serde_json::Value::Object(obj)
            }
            Message::Value(value) => value.to_json()?,
            Message::Absent => serde_json::Value::Null,
        })
    }

    /// Inverse of [`Message::to_json`]
    ///
    /// An object is a tag only when it has a string `tag` field and no keys
    /// besides `tag` and `msg`. A plain map value of that shape, such as
    /// `{"tag": "x", "msg": 1}`, therefore reads back as a [`Message::Tag`];
    /// add any other key to keep it a [`Message::Value`].
    pub fn from_json(json: serde_json::Value) -> Result<Message> {
        match json {
            serde_json::Value::Null => Ok(Message::Absent),
            serde_json::Value::Object(mut obj) if is_tag_object(&obj) => {
                let tag = match obj.remove("tag") {
                    Some(serde_json::Value::String(tag)) => tag,
                    _ => return Err(FlowError::Protocol("tag must be a string".to_string())),
                };
                let msg = match obj.remove("msg") {
                    None | Some(serde_json::Value::Null) => None,
                    Some(msg) => Some(Value::from_json(msg)?),
                };
                Ok(Message::Tag(Tag { tag, msg }))
            }
            other => Ok(Message::Value(Value::from_json(other)?)),
        }
    }

    pub fn parse_line(line: &str) -> Result<Message> {
        let json: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| FlowError::Protocol(format!("invalid JSON line: {}", e)))?;
        Message::from_json(json)
    }
}

fn is_tag_object(obj: &Map<String, serde_json::Value>) -> bool {
    matches!(obj.get("tag"), Some(serde_json::Value::String(_)))
        && obj.keys().all(|k| k == "tag" || k == "msg")
}

impl From<Tag> for Message {
    fn from(tag: Tag) -> Self {
        Message::Tag(tag)
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        Message::Value(value)
    }
}

impl From<Option<Value>> for Message {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Message::Absent, Message::Value)
    }
}
