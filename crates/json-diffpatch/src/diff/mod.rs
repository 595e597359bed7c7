//! Tree differ: computes the [`Delta`] that turns one value into another.

mod array;
mod lcs;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::context::DiffContext;
use crate::delta::Delta;
use crate::error::{CallbackKind, DiffError, DiffResult, TextPatchError};
use crate::options::DiffOptions;
use crate::path::JsonPath;

/// Computes the delta from `left` to `right` with default options.
///
/// Returns `Ok(None)` when the two values are equal.
///
/// ```
/// use serde_json::json;
///
/// let delta = json_diffpatch::diff(&json!({"a": 1}), &json!({"a": 2})).unwrap();
/// assert_eq!(delta.unwrap().to_value(), json!({"a": [1, 2]}));
/// ```
pub fn diff(left: &Value, right: &Value) -> DiffResult<Option<Delta>> {
    diff_with_options(left, right, &DiffOptions::default())
}

/// Computes the delta from `left` to `right`.
///
/// Callback errors abort the diff and are returned unchanged as the source of
/// a [`DiffError::Callback`].
pub fn diff_with_options(
    left: &Value,
    right: &Value,
    options: &DiffOptions,
) -> DiffResult<Option<Delta>> {
    diff_at(left, right, &JsonPath::root(), options)
}

pub(crate) fn diff_at(
    left: &Value,
    right: &Value,
    path: &JsonPath,
    options: &DiffOptions,
) -> DiffResult<Option<Delta>> {
    if options.property_filter.is_none() && left == right {
        return Ok(None);
    }
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => diff_object(left, right, l, r, path, options),
        (Value::Array(l), Value::Array(r)) => {
            Ok(array::diff_array(left, right, l, r, path, options)?.map(Delta::Array))
        }
        (Value::String(l), Value::String(r)) if l != r => diff_text(l, r, path, options),
        _ if left == right => Ok(None),
        _ => Ok(Some(Delta::Modified {
            left: left.clone(),
            right: right.clone(),
        })),
    }
}

fn diff_object(
    left_value: &Value,
    right_value: &Value,
    left: &Map<String, Value>,
    right: &Map<String, Value>,
    path: &JsonPath,
    options: &DiffOptions,
) -> DiffResult<Option<Delta>> {
    let ctx = DiffContext::new(left_value, right_value, path, options);
    let mut members = indexmap::IndexMap::new();

    for (key, lv) in left {
        if !ctx.includes(key)? {
            continue;
        }
        let member_path = path.key(key);
        let delta = match right.get(key) {
            Some(rv) => diff_at(lv, rv, &member_path, options)?,
            None => Some(Delta::Deleted(lv.clone())),
        };
        if let Some(delta) = delta {
            trace!(path = %member_path, "member changed");
            members.insert(key.clone(), delta);
        }
    }
    for (key, rv) in right {
        if left.contains_key(key) || !ctx.includes(key)? {
            continue;
        }
        trace!(path = %path.key(key), "member added");
        members.insert(key.clone(), Delta::Added(rv.clone()));
    }

    Ok((!members.is_empty()).then_some(Delta::Object(members)))
}

fn diff_text(
    left: &str,
    right: &str,
    path: &JsonPath,
    options: &DiffOptions,
) -> DiffResult<Option<Delta>> {
    if let Some(differ) = options.text_differ_for(left, right) {
        let script = differ.diff(left, right).map_err(|err| DiffError::Callback {
            kind: CallbackKind::TextDiffProvider,
            path: path.to_string(),
            source: match err {
                TextPatchError::Provider(source) => source,
                other => Box::new(other),
            },
        })?;
        match script {
            Some(script) => return Ok(Some(Delta::Text(script))),
            None => debug!(path = %path, "text differ declined, replacing value"),
        }
    }
    Ok(Some(Delta::Modified {
        left: Value::String(left.to_string()),
        right: Value::String(right.to_string()),
    }))
}
