#![allow(dead_code)]

use json_diffpatch::{
    deep_equals, diff_with_options, patch, reverse, to_json_patch, unpatch, Delta, DiffOptions,
    JsonPatchOperation,
};
use serde_json::Value;

pub fn delta(value: Value) -> Delta {
    Delta::from_value(&value).expect("valid delta")
}

/// Diff with the given options, rendered on the wire.
pub fn diff_value(left: &Value, right: &Value, options: &DiffOptions) -> Option<Value> {
    diff_with_options(left, right, options)
        .expect("diff failed")
        .map(|d| d.to_value())
}

/// Checks every law a delta produced for `left` -> `right` must satisfy.
pub fn assert_round_trip(left: &Value, right: &Value, options: &DiffOptions) {
    let Some(d) = diff_with_options(left, right, options).expect("diff failed") else {
        assert!(deep_equals(left, right, options).unwrap(), "no delta for {left} -> {right}");
        return;
    };
    assert_eq!(&patch(left, &d).expect("patch failed"), right, "patch with {d}");
    assert_eq!(&unpatch(right, &d).expect("unpatch failed"), left, "unpatch with {d}");

    let reversed = reverse(&d).expect("reverse failed");
    assert_eq!(&patch(right, &reversed).expect("patch reversed"), left, "reversed {reversed}");

    let reparsed = Delta::from_value(&d.to_value()).expect("reparse");
    assert_eq!(reparsed, d);

    let ops = to_json_patch(left, &d).expect("json patch");
    assert_eq!(&apply_json_patch(left, &ops).expect("apply json patch"), right, "ops {ops:?}");
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn split(pointer: &str) -> Result<(&str, String), String> {
    pointer
        .rsplit_once('/')
        .map(|(parent, last)| (parent, unescape(last)))
        .ok_or_else(|| format!("bad pointer {pointer:?}"))
}

fn add(doc: &mut Value, pointer: &str, value: Value) -> Result<(), String> {
    if pointer.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent, last) = split(pointer)?;
    match doc.pointer_mut(parent) {
        Some(Value::Object(map)) => {
            map.insert(last, value);
            Ok(())
        }
        Some(Value::Array(items)) => {
            let index = if last == "-" {
                items.len()
            } else {
                last.parse::<usize>().map_err(|e| e.to_string())?
            };
            if index > items.len() {
                return Err(format!("add index {index} out of bounds"));
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(format!("no container at {parent:?}")),
    }
}

fn remove(doc: &mut Value, pointer: &str) -> Result<Value, String> {
    let (parent, last) = split(pointer)?;
    match doc.pointer_mut(parent) {
        Some(Value::Object(map)) => map
            .shift_remove(&last)
            .ok_or_else(|| format!("missing member {pointer:?}")),
        Some(Value::Array(items)) => {
            let index: usize = last.parse().map_err(|e: std::num::ParseIntError| e.to_string())?;
            if index >= items.len() {
                return Err(format!("remove index {index} out of bounds"));
            }
            Ok(items.remove(index))
        }
        _ => Err(format!("no container at {parent:?}")),
    }
}

/// Minimal RFC 6902 applier covering the operations the formatter emits.
pub fn apply_json_patch(doc: &Value, ops: &[JsonPatchOperation]) -> Result<Value, String> {
    let mut doc = doc.clone();
    for op in ops {
        match op {
            JsonPatchOperation::Add { path, value } => add(&mut doc, path, value.clone())?,
            JsonPatchOperation::Remove { path } => {
                remove(&mut doc, path)?;
            }
            JsonPatchOperation::Replace { path, value } => {
                let target = doc
                    .pointer_mut(path)
                    .ok_or_else(|| format!("nothing to replace at {path:?}"))?;
                *target = value.clone();
            }
            JsonPatchOperation::Move { from, path } => {
                let value = remove(&mut doc, from)?;
                add(&mut doc, path, value)?;
            }
        }
    }
    Ok(doc)
}
