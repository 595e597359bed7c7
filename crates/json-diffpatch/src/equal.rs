//! Structural equality under the active property filter.

use serde_json::Value;

use crate::context::DiffContext;
use crate::error::DiffResult;
use crate::options::DiffOptions;
use crate::path::JsonPath;

/// Deep equality of two value trees.
///
/// Without a property filter this is plain structural equality (object member
/// order is ignored). With a filter, excluded members are ignored on both
/// sides at every depth, including inside array items.
///
/// ```
/// use serde_json::json;
/// use json_diffpatch::{deep_equals, DiffOptions};
///
/// let options = DiffOptions::new().with_property_filter(|name, _| Ok(name != "updated_at"));
/// let a = json!({"id": 1, "updated_at": "monday"});
/// let b = json!({"id": 1, "updated_at": "friday"});
/// assert!(deep_equals(&a, &b, &options).unwrap());
/// ```
pub fn deep_equals(left: &Value, right: &Value, options: &DiffOptions) -> DiffResult<bool> {
    equals_at(left, right, &JsonPath::root(), options)
}

pub(crate) fn equals_at(
    left: &Value,
    right: &Value,
    path: &JsonPath,
    options: &DiffOptions,
) -> DiffResult<bool> {
    if options.property_filter.is_none() {
        return Ok(left == right);
    }
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            let ctx = DiffContext::new(left, right, path, options);
            for (key, lv) in l {
                if !ctx.includes(key)? {
                    continue;
                }
                match r.get(key) {
                    Some(rv) => {
                        if !equals_at(lv, rv, &path.key(key), options)? {
                            return Ok(false);
                        }
                    }
                    None => return Ok(false),
                }
            }
            for key in r.keys() {
                if !l.contains_key(key) && ctx.includes(key)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Array(l), Value::Array(r)) => {
            let ctx = DiffContext::new(left, right, path, options);
            let li = ctx.included_indices(l)?;
            let ri = ctx.included_indices(r)?;
            if li.len() != ri.len() {
                return Ok(false);
            }
            for (&i, &j) in li.iter().zip(&ri) {
                if !equals_at(&l[i], &r[j], &path.index(i), options)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(left == right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_without_filter_ignores_member_order() {
        let a = json!({"a": 1, "b": [1, 2, {"c": null}]});
        let b = json!({"b": [1, 2, {"c": null}], "a": 1});
        assert!(deep_equals(&a, &b, &DiffOptions::default()).unwrap());
    }

    #[test]
    fn arrays_are_order_sensitive() {
        let options = DiffOptions::default();
        assert!(!deep_equals(&json!([1, 2]), &json!([2, 1]), &options).unwrap());
    }

    #[test]
    fn filtered_members_are_ignored_on_both_sides() {
        let options = DiffOptions::new().with_property_filter(|name, _| Ok(name != "a"));
        assert!(deep_equals(&json!({"a": 1}), &json!({}), &options).unwrap());
        assert!(deep_equals(&json!({}), &json!({"a": 1}), &options).unwrap());
        assert!(deep_equals(&json!([{"a": 1, "b": 2}]), &json!([{"a": 9, "b": 2}]), &options).unwrap());
        assert!(!deep_equals(&json!({"b": 1}), &json!({"b": 2}), &options).unwrap());
    }

    #[test]
    fn filter_sees_container_path() {
        let options = DiffOptions::new()
            .with_property_filter(|name, ctx| Ok(!(name == "c" && ctx.path().to_string() == "$.a.b")));
        let a = json!({"a": {"b": {"c": 1}}, "c": 1});
        let b = json!({"a": {"b": {"c": 2}}, "c": 1});
        assert!(deep_equals(&a, &b, &options).unwrap());
        let b = json!({"a": {"b": {"c": 1}}, "c": 2});
        assert!(!deep_equals(&a, &b, &options).unwrap());
    }

    #[test]
    fn filter_errors_propagate() {
        let options = DiffOptions::new().with_property_filter(|_, _| Err("boom".into()));
        let err = deep_equals(&json!({"a": 1}), &json!({"a": 1}), &options).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
