//! Typed delta grammar.
//!
//! On the wire a delta is a plain JSON value:
//!
//! | shape                      | meaning                                   |
//! |----------------------------|-------------------------------------------|
//! | `[V]`                      | value added                               |
//! | `[L, R]`                   | value modified from `L` to `R`            |
//! | `[L, 0, 0]`                | value deleted (was `L`)                   |
//! | `[D, 0, 2]`                | string modified by text edit script `D`   |
//! | `{k: delta, ...}`          | object members changed                    |
//! | `{"_t": "a", ...}`         | array changed                             |
//! | `["", j, 3]` under `"_i"`  | item at original index `i` moved to `j`   |
//!
//! Inside an array delta, plain integer keys index the result array and carry
//! additions and nested changes; `_`-prefixed keys index the original array
//! and carry deletions and moves. [`Delta::from_value`] accepts exactly these
//! shapes and rejects everything else.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{kind_name, DeltaError};
use crate::path::JsonPath;

pub const ARRAY_MARKER_KEY: &str = "_t";
pub const ARRAY_MARKER: &str = "a";

const OP_DELETED: u64 = 0;
const OP_TEXT: u64 = 2;
const OP_MOVED: u64 = 3;

/// The difference between two value trees.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Added(Value),
    Modified { left: Value, right: Value },
    Deleted(Value),
    /// A string changed; the payload is a text edit script.
    Text(String),
    /// Changed object members keyed by property name.
    Object(IndexMap<String, Delta>),
    Array(ArrayDelta),
}

/// Changes to an array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayDelta {
    /// Additions and nested changes, keyed by index in the result array.
    pub items: BTreeMap<usize, Delta>,
    /// Deletions and moves, keyed by index in the original array.
    pub removed: BTreeMap<usize, ArrayRemoval>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayRemoval {
    Deleted(Value),
    /// The item is unchanged in content and now sits at `to` in the result.
    Moved { to: usize },
}

impl ArrayDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.removed.is_empty()
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(ARRAY_MARKER_KEY.to_string(), Value::from(ARRAY_MARKER));
        for (index, removal) in &self.removed {
            let entry = match removal {
                ArrayRemoval::Deleted(value) => deleted_value(value.clone()),
                ArrayRemoval::Moved { to } => Value::Array(vec![
                    Value::from(""),
                    Value::from(*to),
                    Value::from(OP_MOVED),
                ]),
            };
            map.insert(format!("_{index}"), entry);
        }
        for (index, delta) in &self.items {
            map.insert(index.to_string(), delta.to_value());
        }
        Value::Object(map)
    }
}

impl Delta {
    /// Encodes the delta as a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Delta::Added(value) => Value::Array(vec![value.clone()]),
            Delta::Modified { left, right } => Value::Array(vec![left.clone(), right.clone()]),
            Delta::Deleted(value) => deleted_value(value.clone()),
            Delta::Text(script) => Value::Array(vec![
                Value::String(script.clone()),
                Value::from(0),
                Value::from(OP_TEXT),
            ]),
            Delta::Object(members) => Value::Object(
                members
                    .iter()
                    .map(|(key, delta)| (key.clone(), delta.to_value()))
                    .collect(),
            ),
            Delta::Array(array) => array.to_value(),
        }
    }

    /// Parses a JSON value as a delta, rejecting anything outside the grammar.
    pub fn from_value(value: &Value) -> Result<Delta, DeltaError> {
        parse(value, &JsonPath::root())
    }

    /// True for `[V]` deltas.
    pub fn is_added(&self) -> bool {
        matches!(self, Delta::Added(_))
    }
}

impl From<Delta> for Value {
    fn from(delta: Delta) -> Value {
        delta.to_value()
    }
}

impl From<&Delta> for Value {
    fn from(delta: &Delta) -> Value {
        delta.to_value()
    }
}

impl TryFrom<Value> for Delta {
    type Error = DeltaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Delta::from_value(&value)
    }
}

impl TryFrom<&Value> for Delta {
    type Error = DeltaError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Delta::from_value(value)
    }
}

/// Renders the delta as compact JSON.
impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl Serialize for Delta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Delta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Delta::from_value(&value).map_err(serde::de::Error::custom)
    }
}

fn deleted_value(value: Value) -> Value {
    Value::Array(vec![value, Value::from(OP_DELETED), Value::from(OP_DELETED)])
}

// ── Parser ────────────────────────────────────────────────────────────────

fn malformed(path: &JsonPath, reason: impl Into<String>) -> DeltaError {
    DeltaError::Malformed {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn is_op(value: &Value, op: u64) -> bool {
    value.as_u64() == Some(op)
}

fn parse(value: &Value, path: &JsonPath) -> Result<Delta, DeltaError> {
    match value {
        Value::Array(items) => parse_leaf(items, path),
        Value::Object(map) if map.contains_key(ARRAY_MARKER_KEY) => parse_array(map, path),
        Value::Object(map) => {
            let mut members = IndexMap::with_capacity(map.len());
            for (key, member) in map {
                members.insert(key.clone(), parse(member, &path.key(key))?);
            }
            Ok(Delta::Object(members))
        }
        other => Err(malformed(
            path,
            format!("expected an array or object, found {}", kind_name(other)),
        )),
    }
}

fn parse_leaf(items: &[Value], path: &JsonPath) -> Result<Delta, DeltaError> {
    match items {
        [value] => Ok(Delta::Added(value.clone())),
        [left, right] => Ok(Delta::Modified {
            left: left.clone(),
            right: right.clone(),
        }),
        [value, zero, op] if is_op(zero, 0) && is_op(op, OP_DELETED) => {
            Ok(Delta::Deleted(value.clone()))
        }
        [script, zero, op] if is_op(zero, 0) && is_op(op, OP_TEXT) => match script {
            Value::String(script) => Ok(Delta::Text(script.clone())),
            other => Err(malformed(
                path,
                format!("text edit script must be a string, found {}", kind_name(other)),
            )),
        },
        [_, _, op] if is_op(op, OP_MOVED) => Err(malformed(
            path,
            "array move is only valid under an `_`-prefixed array key",
        )),
        [_, _, _] => Err(malformed(path, "unknown operation marker")),
        other => Err(malformed(
            path,
            format!("unexpected delta array of length {}", other.len()),
        )),
    }
}

fn parse_array(map: &Map<String, Value>, path: &JsonPath) -> Result<Delta, DeltaError> {
    match map.get(ARRAY_MARKER_KEY) {
        Some(Value::String(marker)) if marker == ARRAY_MARKER => {}
        _ => {
            return Err(malformed(
                &path.key(ARRAY_MARKER_KEY),
                "array marker must be \"a\"",
            ))
        }
    }
    let mut array = ArrayDelta::new();
    for (key, entry) in map {
        if key == ARRAY_MARKER_KEY {
            continue;
        }
        let entry_path = path.key(key);
        if let Some(original) = key.strip_prefix('_') {
            let index = parse_index(original)
                .ok_or_else(|| malformed(&entry_path, "invalid original index key"))?;
            array.removed.insert(index, parse_removal(entry, &entry_path)?);
        } else {
            let index = parse_index(key)
                .ok_or_else(|| malformed(&entry_path, "invalid array index key"))?;
            let delta = parse(entry, &entry_path)?;
            if matches!(delta, Delta::Deleted(_)) {
                return Err(malformed(
                    &entry_path,
                    "deletions must be keyed by an `_`-prefixed original index",
                ));
            }
            array.items.insert(index, delta);
        }
    }
    Ok(Delta::Array(array))
}

fn parse_removal(entry: &Value, path: &JsonPath) -> Result<ArrayRemoval, DeltaError> {
    let items = match entry {
        Value::Array(items) => items.as_slice(),
        other => {
            return Err(malformed(
                path,
                format!("expected a delete or move entry, found {}", kind_name(other)),
            ))
        }
    };
    match items {
        [value, zero, op] if is_op(zero, 0) && is_op(op, OP_DELETED) => {
            Ok(ArrayRemoval::Deleted(value.clone()))
        }
        [_, to, op] if is_op(op, OP_MOVED) => {
            let to = to
                .as_u64()
                .and_then(|to| usize::try_from(to).ok())
                .ok_or_else(|| malformed(path, "move destination must be a non-negative integer"))?;
            Ok(ArrayRemoval::Moved { to })
        }
        _ => Err(malformed(
            path,
            "`_`-prefixed keys only carry deletes and moves",
        )),
    }
}

/// Canonical non-negative decimal index: no sign, no leading zeros.
fn parse_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse().ok()
}
