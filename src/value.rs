//! Structured values stored in the database
//!
//! A [`Value`] is a tagged variant covering everything the codec can carry:
//! primitives, byte strings, ordered sequences and string-keyed mappings.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde_json::{Map, Number};

use crate::error::{FlowError, Result};

/// Object key marking an encoded byte string: `{"$bytes": "<hex>"}`
pub const BYTES_KEY: &str = "$bytes";

/// Object key wrapping a map that would otherwise read as a marker:
/// `{"$map": {"$bytes": ..}}`
pub const MAP_KEY: &str = "$map";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Bytes),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Convert to a JSON tree
    ///
    /// Fails for non-finite floats, which JSON cannot represent.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| FlowError::Codec(format!("cannot encode float {}", f)))?,
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => {
                let mut obj = Map::with_capacity(1);
                obj.insert(BYTES_KEY.to_string(), serde_json::Value::String(hex::encode(b)));
                serde_json::Value::Object(obj)
            }
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Result<Vec<_>>>()?,
            ),
            Value::Map(entries) => {
                let mut obj = Map::with_capacity(entries.len());
                for (k, v) in entries {
                    obj.insert(k.clone(), v.to_json()?);
                }
                if is_marker_shaped(&obj) {
                    let mut wrapper = Map::with_capacity(1);
                    wrapper.insert(MAP_KEY.to_string(), serde_json::Value::Object(obj));
                    obj = wrapper;
                }
                serde_json::Value::Object(obj)
            }
        })
    }

    /// Build from a JSON tree
    ///
    /// Integers outside the `i64` range become floats. A single-key object
    /// `{"$bytes": "<hex>"}` decodes to [`Value::Bytes`]; `{"$map": {..}}`
    /// decodes to the inner map as is.
    pub fn from_json(json: serde_json::Value) -> Result<Value> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::List(
                items.into_iter().map(Value::from_json).collect::<Result<Vec<_>>>()?,
            ),
            serde_json::Value::Object(mut obj) => {
                if obj.len() == 1 {
                    if let Some(serde_json::Value::String(encoded)) = obj.get(BYTES_KEY) {
                        let raw = hex::decode(encoded).map_err(|e| {
                            FlowError::Codec(format!("invalid {} payload: {}", BYTES_KEY, e))
                        })?;
                        return Ok(Value::Bytes(Bytes::from(raw)));
                    }
                    if let Some(serde_json::Value::Object(inner)) = obj.get_mut(MAP_KEY) {
                        return map_from_json(std::mem::take(inner));
                    }
                }
                map_from_json(obj)?
            }
        })
    }
}

/// A single-key object whose key is one of the markers
fn is_marker_shaped(obj: &Map<String, serde_json::Value>) -> bool {
    obj.len() == 1 && (obj.contains_key(BYTES_KEY) || obj.contains_key(MAP_KEY))
}

fn map_from_json(obj: Map<String, serde_json::Value>) -> Result<Value> {
    let mut entries = BTreeMap::new();
    for (k, v) in obj {
        entries.insert(k, Value::from_json(v)?);
    }
    Ok(Value::Map(entries))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}
