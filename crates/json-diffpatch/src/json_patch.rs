//! Converts deltas into RFC 6902 JSON Patch documents.
//!
//! The operations are produced by replaying the delta against the left-hand
//! value, so every pointer refers to the document as it looks at that point of
//! the operation sequence.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::delta::{ArrayDelta, ArrayRemoval, Delta};
use crate::error::{kind_name, PatchError, PatchResult};
use crate::options::PatchOptions;
use crate::path::JsonPath;

/// A single JSON Patch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum JsonPatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
}

/// Formats `delta` as JSON Patch operations against `left`.
///
/// Applying the operations in order to `left` yields `patch(left, delta)`.
///
/// ```
/// use serde_json::json;
/// use json_diffpatch::{diff, to_json_patch, JsonPatchOperation};
///
/// let left = json!({"a": 1});
/// let delta = diff(&left, &json!({"a": 2, "b": true})).unwrap().unwrap();
/// let ops = to_json_patch(&left, &delta).unwrap();
/// assert_eq!(ops[0], JsonPatchOperation::Replace { path: "/a".into(), value: json!(2) });
/// assert_eq!(ops[1], JsonPatchOperation::Add { path: "/b".into(), value: json!(true) });
/// ```
pub fn to_json_patch(left: &Value, delta: &Delta) -> PatchResult<Vec<JsonPatchOperation>> {
    to_json_patch_with_options(left, delta, &PatchOptions::default())
}

pub fn to_json_patch_with_options(
    left: &Value,
    delta: &Delta,
    options: &PatchOptions,
) -> PatchResult<Vec<JsonPatchOperation>> {
    let mut ops = Vec::new();
    Formatter {
        ops: &mut ops,
        options,
    }
    .emit(left, delta, &JsonPath::root())?;
    Ok(ops)
}

struct Formatter<'a> {
    ops: &'a mut Vec<JsonPatchOperation>,
    options: &'a PatchOptions,
}

fn shape_mismatch(path: &JsonPath, expected: &'static str, actual: &Value) -> PatchError {
    PatchError::ShapeMismatch {
        path: path.to_string(),
        expected,
        actual: kind_name(actual),
    }
}

fn check_value(path: &JsonPath, expected: &Value, actual: &Value) -> PatchResult<()> {
    if expected == actual {
        return Ok(());
    }
    Err(PatchError::ValueMismatch {
        path: path.to_string(),
        expected: expected.clone(),
        actual: actual.clone(),
    })
}

/// Origin of an item in the array being rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Original(usize),
    Added,
}

impl Formatter<'_> {
    fn emit(&mut self, current: &Value, delta: &Delta, path: &JsonPath) -> PatchResult<()> {
        match delta {
            Delta::Added(value) => self.ops.push(JsonPatchOperation::Replace {
                path: path.to_pointer(),
                value: value.clone(),
            }),
            Delta::Deleted(_) => return Err(PatchError::RootOperation { op: "delete" }),
            Delta::Modified { left, right } => {
                check_value(path, left, current)?;
                self.ops.push(JsonPatchOperation::Replace {
                    path: path.to_pointer(),
                    value: right.clone(),
                });
            }
            Delta::Text(script) => {
                let Value::String(text) = current else {
                    return Err(shape_mismatch(path, "string", current));
                };
                let patched = self
                    .options
                    .text_differ()
                    .patch(text, script)
                    .map_err(|source| PatchError::Text {
                        path: path.to_string(),
                        source,
                    })?;
                self.ops.push(JsonPatchOperation::Replace {
                    path: path.to_pointer(),
                    value: Value::String(patched),
                });
            }
            Delta::Object(members) => {
                let Value::Object(map) = current else {
                    return Err(shape_mismatch(path, "object", current));
                };
                for (key, member) in members {
                    let member_path = path.key(key);
                    match (member, map.get(key)) {
                        (Delta::Added(value), None) => self.ops.push(JsonPatchOperation::Add {
                            path: member_path.to_pointer(),
                            value: value.clone(),
                        }),
                        (Delta::Added(_), Some(_)) => {
                            return Err(PatchError::MemberExists {
                                path: member_path.to_string(),
                            })
                        }
                        (Delta::Deleted(value), Some(existing)) => {
                            check_value(&member_path, value, existing)?;
                            self.ops.push(JsonPatchOperation::Remove {
                                path: member_path.to_pointer(),
                            });
                        }
                        (nested, Some(existing)) => self.emit(existing, nested, &member_path)?,
                        (_, None) => {
                            return Err(PatchError::MissingMember {
                                path: member_path.to_string(),
                            })
                        }
                    }
                }
            }
            Delta::Array(array) => {
                let Value::Array(items) = current else {
                    return Err(shape_mismatch(path, "array", current));
                };
                self.emit_array(items, array, path)?;
            }
        }
        Ok(())
    }

    fn emit_array(&mut self, items: &[Value], delta: &ArrayDelta, path: &JsonPath) -> PatchResult<()> {
        let len = items.len();
        let out_of_range = |index: usize, len: usize| PatchError::IndexOutOfRange {
            path: path.to_string(),
            index,
            len,
        };

        // New index -> where the item placed there comes from.
        let mut placed: BTreeMap<usize, Slot> = BTreeMap::new();
        let mut move_sources: BTreeSet<usize> = BTreeSet::new();
        for (&index, removal) in &delta.removed {
            let item = items.get(index).ok_or_else(|| out_of_range(index, len))?;
            match removal {
                ArrayRemoval::Deleted(expected) => check_value(&path.index(index), expected, item)?,
                ArrayRemoval::Moved { to } => {
                    move_sources.insert(index);
                    if placed.insert(*to, Slot::Original(index)).is_some() {
                        return Err(PatchError::DuplicateIndex {
                            path: path.to_string(),
                            index: *to,
                        });
                    }
                }
            }
        }
        for (&index, entry) in &delta.items {
            if entry.is_added() && placed.insert(index, Slot::Added).is_some() {
                return Err(PatchError::DuplicateIndex {
                    path: path.to_string(),
                    index,
                });
            }
        }

        let mut work: Vec<Slot> = (0..len).map(Slot::Original).collect();
        for (&index, removal) in delta.removed.iter().rev() {
            if let ArrayRemoval::Deleted(_) = removal {
                work.remove(index);
                self.ops.push(JsonPatchOperation::Remove {
                    path: path.index(index).to_pointer(),
                });
            }
        }

        let final_len = len - delta.removed.len() + placed.len();
        for target in 0..final_len {
            match placed.get(&target) {
                Some(Slot::Added) => {
                    if target > work.len() {
                        return Err(out_of_range(target, work.len()));
                    }
                    let value = match delta.items.get(&target) {
                        Some(Delta::Added(value)) => value.clone(),
                        _ => Value::Null,
                    };
                    work.insert(target, Slot::Added);
                    self.ops.push(JsonPatchOperation::Add {
                        path: path.index(target).to_pointer(),
                        value,
                    });
                }
                Some(&Slot::Original(source)) => {
                    let at = work
                        .iter()
                        .position(|slot| *slot == Slot::Original(source))
                        .ok_or_else(|| out_of_range(source, len))?;
                    self.move_into(&mut work, at, target, path);
                }
                None => {
                    let at = work
                        .iter()
                        .skip(target)
                        .position(|slot| match slot {
                            Slot::Original(index) => !move_sources.contains(index),
                            Slot::Added => false,
                        })
                        .map(|offset| target + offset)
                        .ok_or_else(|| out_of_range(target, work.len()))?;
                    self.move_into(&mut work, at, target, path);
                }
            }
        }

        for (&index, entry) in &delta.items {
            if entry.is_added() {
                continue;
            }
            let source = match work.get(index) {
                Some(Slot::Original(source)) => *source,
                _ => return Err(out_of_range(index, work.len())),
            };
            self.emit(&items[source], entry, &path.index(index))?;
        }
        Ok(())
    }

    fn move_into(&mut self, work: &mut Vec<Slot>, from: usize, to: usize, path: &JsonPath) {
        if from == to {
            return;
        }
        let slot = work.remove(from);
        work.insert(to, slot);
        self.ops.push(JsonPatchOperation::Move {
            from: path.index(from).to_pointer(),
            path: path.index(to).to_pointer(),
        });
    }
}
