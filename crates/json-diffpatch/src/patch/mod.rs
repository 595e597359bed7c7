//! Applies deltas forward (`patch`) and backward (`unpatch`).
//!
//! Both directions work on a private copy of the input; the caller's value is
//! never modified. Every expected value recorded in the delta is checked
//! against the target before it is overwritten or removed.

mod array;

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::trace;

use crate::delta::Delta;
use crate::error::{kind_name, PatchError, PatchResult};
use crate::options::PatchOptions;
use crate::path::JsonPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Reverse,
}

/// Applies `delta` to `value`, producing the right-hand value of the diff.
///
/// ```
/// use serde_json::json;
/// use json_diffpatch::{diff, patch};
///
/// let left = json!({"tags": ["a", "b"]});
/// let right = json!({"tags": ["b", "a", "c"]});
/// let delta = diff(&left, &right).unwrap().unwrap();
/// assert_eq!(patch(&left, &delta).unwrap(), right);
/// ```
pub fn patch(value: &Value, delta: &Delta) -> PatchResult<Value> {
    patch_with_options(value, delta, &PatchOptions::default())
}

pub fn patch_with_options(value: &Value, delta: &Delta, options: &PatchOptions) -> PatchResult<Value> {
    let mut out = value.clone();
    apply(&mut out, delta, &JsonPath::root(), Direction::Forward, options)?;
    Ok(out)
}

/// Reverts `delta` on `value`, producing the left-hand value of the diff.
pub fn unpatch(value: &Value, delta: &Delta) -> PatchResult<Value> {
    unpatch_with_options(value, delta, &PatchOptions::default())
}

pub fn unpatch_with_options(
    value: &Value,
    delta: &Delta,
    options: &PatchOptions,
) -> PatchResult<Value> {
    let mut out = value.clone();
    apply(&mut out, delta, &JsonPath::root(), Direction::Reverse, options)?;
    Ok(out)
}

fn expect_value(path: &JsonPath, expected: &Value, actual: &Value) -> PatchResult<()> {
    if expected == actual {
        return Ok(());
    }
    Err(PatchError::ValueMismatch {
        path: path.to_string(),
        expected: expected.clone(),
        actual: actual.clone(),
    })
}

/// Reserves a result index for one array operation; two operations on the
/// same index make the delta ambiguous.
pub(crate) fn claim<T>(
    slots: &mut BTreeMap<usize, T>,
    index: usize,
    value: T,
    path: &JsonPath,
) -> PatchResult<()> {
    if slots.insert(index, value).is_some() {
        return Err(PatchError::DuplicateIndex {
            path: path.to_string(),
            index,
        });
    }
    Ok(())
}

fn shape_mismatch(path: &JsonPath, expected: &'static str, actual: &Value) -> PatchError {
    PatchError::ShapeMismatch {
        path: path.to_string(),
        expected,
        actual: kind_name(actual),
    }
}

pub(crate) fn apply(
    target: &mut Value,
    delta: &Delta,
    path: &JsonPath,
    direction: Direction,
    options: &PatchOptions,
) -> PatchResult<()> {
    match delta {
        Delta::Modified { left, right } => {
            let (from, to) = match direction {
                Direction::Forward => (left, right),
                Direction::Reverse => (right, left),
            };
            expect_value(path, from, target)?;
            *target = to.clone();
        }
        Delta::Added(value) => match direction {
            Direction::Forward => *target = value.clone(),
            Direction::Reverse => return Err(PatchError::RootOperation { op: "remove" }),
        },
        Delta::Deleted(value) => match direction {
            Direction::Forward => return Err(PatchError::RootOperation { op: "delete" }),
            Direction::Reverse => *target = value.clone(),
        },
        Delta::Text(script) => {
            let Value::String(text) = target else {
                return Err(shape_mismatch(path, "string", target));
            };
            let differ = options.text_differ();
            let result = match direction {
                Direction::Forward => differ.patch(text, script),
                Direction::Reverse => differ.unpatch(text, script),
            };
            *text = result.map_err(|source| PatchError::Text {
                path: path.to_string(),
                source,
            })?;
        }
        Delta::Object(members) => {
            let Value::Object(map) = target else {
                return Err(shape_mismatch(path, "object", target));
            };
            for (key, member) in members {
                let member_path = path.key(key);
                trace!(path = %member_path, ?direction, "patch member");
                match (member, direction) {
                    (Delta::Added(value), Direction::Forward)
                    | (Delta::Deleted(value), Direction::Reverse) => {
                        if map.contains_key(key) {
                            return Err(PatchError::MemberExists {
                                path: member_path.to_string(),
                            });
                        }
                        map.insert(key.clone(), value.clone());
                    }
                    (Delta::Deleted(value), Direction::Forward)
                    | (Delta::Added(value), Direction::Reverse) => {
                        let current = map.get(key).ok_or_else(|| PatchError::MissingMember {
                            path: member_path.to_string(),
                        })?;
                        expect_value(&member_path, value, current)?;
                        map.shift_remove(key);
                    }
                    (nested, _) => {
                        let child = map.get_mut(key).ok_or_else(|| PatchError::MissingMember {
                            path: member_path.to_string(),
                        })?;
                        apply(child, nested, &member_path, direction, options)?;
                    }
                }
            }
        }
        Delta::Array(array_delta) => {
            let Value::Array(items) = target else {
                return Err(shape_mismatch(path, "array", target));
            };
            match direction {
                Direction::Forward => array::patch_array(items, array_delta, path, options)?,
                Direction::Reverse => array::unpatch_array(items, array_delta, path, options)?,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(value: Value) -> Delta {
        Delta::from_value(&value).unwrap()
    }

    #[test]
    fn modify_checks_the_current_value() {
        assert_eq!(patch(&json!(1), &d(json!([1, 2]))).unwrap(), json!(2));
        assert_eq!(unpatch(&json!(2), &d(json!([1, 2]))).unwrap(), json!(1));
        let err = patch(&json!(3), &d(json!([1, 2]))).unwrap_err();
        assert_eq!(err.to_string(), "value mismatch at $: expected 1, found 3");
    }

    #[test]
    fn root_add_and_delete() {
        assert_eq!(patch(&Value::Null, &d(json!([{"a": 1}]))).unwrap(), json!({"a": 1}));
        assert!(matches!(
            patch(&json!(1), &d(json!([1, 0, 0]))),
            Err(PatchError::RootOperation { op: "delete" })
        ));
        assert_eq!(unpatch(&Value::Null, &d(json!([1, 0, 0]))).unwrap(), json!(1));
        assert!(matches!(
            unpatch(&json!(1), &d(json!([1]))),
            Err(PatchError::RootOperation { op: "remove" })
        ));
    }

    #[test]
    fn object_members_both_ways() {
        let left = json!({"a": 1, "b": {"c": 2}, "keep": true});
        let right = json!({"b": {"c": 3}, "keep": true, "d": [1]});
        let delta = d(json!({"a": [1, 0, 0], "b": {"c": [2, 3]}, "d": [[1]]}));
        assert_eq!(patch(&left, &delta).unwrap(), right);
        assert_eq!(unpatch(&right, &delta).unwrap(), left);
    }

    #[test]
    fn input_is_not_modified() {
        let left = json!({"a": 1});
        let _ = patch(&left, &d(json!({"a": [1, 2]}))).unwrap();
        assert_eq!(left, json!({"a": 1}));
    }

    #[test]
    fn member_errors() {
        assert!(matches!(
            patch(&json!({"a": 1}), &d(json!({"a": [2]}))),
            Err(PatchError::MemberExists { path }) if path == "$.a"
        ));
        assert!(matches!(
            patch(&json!({}), &d(json!({"a": [1, 0, 0]}))),
            Err(PatchError::MissingMember { path }) if path == "$.a"
        ));
        assert!(matches!(
            patch(&json!({}), &d(json!({"a": {"b": [1, 2]}}))),
            Err(PatchError::MissingMember { path }) if path == "$.a"
        ));
        assert!(matches!(
            unpatch(&json!({"a": 2}), &d(json!({"a": [1]}))),
            Err(PatchError::ValueMismatch { .. })
        ));
    }

    #[test]
    fn shape_errors() {
        let err = patch(&json!(5), &d(json!({"a": [1]}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "shape mismatch at $: delta expects object, found number"
        );
        let err = patch(&json!({"x": {}}), &d(json!({"x": {"_t": "a", "0": [1]}}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "shape mismatch at $.x: delta expects array, found object"
        );
        assert!(matches!(
            patch(&json!(1), &d(json!(["@@ -1 +1 @@\n-a\n+b\n", 0, 2]))),
            Err(PatchError::ShapeMismatch { expected: "string", .. })
        ));
    }

    #[test]
    fn text_deltas() {
        let delta = d(json!(["@@ -1,3 +1,3 @@\n a\n-b\n+x\n c\n", 0, 2]));
        assert_eq!(patch(&json!("abc"), &delta).unwrap(), json!("axc"));
        assert_eq!(unpatch(&json!("axc"), &delta).unwrap(), json!("abc"));
        assert!(matches!(
            patch(&json!("zzz"), &delta),
            Err(PatchError::Text { .. })
        ));
    }
}
