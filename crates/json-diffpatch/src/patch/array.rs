//! Array reconstruction.
//!
//! Forward order: capture deleted and moved items at their original indices,
//! remove them high-to-low, insert additions and move destinations low-to-high
//! at their new indices, then patch modified items. Reverse runs the mirror
//! image: unpatch modified items, remove additions and move destinations
//! high-to-low, reinsert deleted and moved items low-to-high.

use std::collections::BTreeMap;

use serde_json::Value;

use super::{apply, claim, expect_value, Direction};
use crate::delta::{ArrayDelta, ArrayRemoval, Delta};
use crate::error::{PatchError, PatchResult};
use crate::options::PatchOptions;
use crate::path::JsonPath;

fn out_of_range(path: &JsonPath, index: usize, len: usize) -> PatchError {
    PatchError::IndexOutOfRange {
        path: path.to_string(),
        index,
        len,
    }
}

pub(super) fn patch_array(
    items: &mut Vec<Value>,
    delta: &ArrayDelta,
    path: &JsonPath,
    options: &PatchOptions,
) -> PatchResult<()> {
    let len = items.len();
    let mut inserts: BTreeMap<usize, Value> = BTreeMap::new();

    for (&index, removal) in &delta.removed {
        let item = items.get(index).ok_or_else(|| out_of_range(path, index, len))?;
        match removal {
            ArrayRemoval::Deleted(expected) => expect_value(&path.index(index), expected, item)?,
            ArrayRemoval::Moved { to } => claim(&mut inserts, *to, item.clone(), path)?,
        }
    }
    for &index in delta.removed.keys().rev() {
        items.remove(index);
    }

    for (&index, entry) in &delta.items {
        if let Delta::Added(value) = entry {
            claim(&mut inserts, index, value.clone(), path)?;
        }
    }
    for (index, value) in inserts {
        if index > items.len() {
            return Err(out_of_range(path, index, items.len()));
        }
        items.insert(index, value);
    }

    for (&index, entry) in &delta.items {
        if entry.is_added() {
            continue;
        }
        let len = items.len();
        let item = items
            .get_mut(index)
            .ok_or_else(|| out_of_range(path, index, len))?;
        apply(item, entry, &path.index(index), Direction::Forward, options)?;
    }
    Ok(())
}

/// What occupies a new index before it is taken out again.
enum Placed<'a> {
    Added(&'a Value),
    MovedFrom(usize),
}

pub(super) fn unpatch_array(
    items: &mut Vec<Value>,
    delta: &ArrayDelta,
    path: &JsonPath,
    options: &PatchOptions,
) -> PatchResult<()> {
    for (&index, entry) in &delta.items {
        if entry.is_added() {
            continue;
        }
        let len = items.len();
        let item = items
            .get_mut(index)
            .ok_or_else(|| out_of_range(path, index, len))?;
        apply(item, entry, &path.index(index), Direction::Reverse, options)?;
    }

    let mut placed: BTreeMap<usize, Placed<'_>> = BTreeMap::new();
    for (&index, entry) in &delta.items {
        if let Delta::Added(value) = entry {
            claim(&mut placed, index, Placed::Added(value), path)?;
        }
    }
    for (&from, removal) in &delta.removed {
        if let ArrayRemoval::Moved { to } = removal {
            claim(&mut placed, *to, Placed::MovedFrom(from), path)?;
        }
    }

    let mut restores: BTreeMap<usize, Value> = BTreeMap::new();
    for (&index, removal) in &delta.removed {
        if let ArrayRemoval::Deleted(value) = removal {
            restores.insert(index, value.clone());
        }
    }
    for (&index, what) in placed.iter().rev() {
        if index >= items.len() {
            return Err(out_of_range(path, index, items.len()));
        }
        match what {
            Placed::Added(expected) => {
                expect_value(&path.index(index), expected, &items[index])?;
                items.remove(index);
            }
            Placed::MovedFrom(from) => {
                restores.insert(*from, items.remove(index));
            }
        }
    }

    for (index, value) in restores {
        if index > items.len() {
            return Err(out_of_range(path, index, items.len()));
        }
        items.insert(index, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::{patch, unpatch};
    use super::*;
    use serde_json::json;

    fn d(value: Value) -> Delta {
        Delta::from_value(&value).unwrap()
    }

    #[test]
    fn mixed_operations_both_ways() {
        let left = json!([0, 1, 2, 3, 4, 5]);
        let right = json!([5, 0, "new", 2, 4, 33]);
        let delta = d(json!({
            "_t": "a",
            "_1": [1, 0, 0],
            "_3": [3, 0, 0],
            "_5": ["", 0, 3],
            "2": ["new"],
            "5": [33],
        }));
        assert_eq!(patch(&left, &delta).unwrap(), right);
        assert_eq!(unpatch(&right, &delta).unwrap(), left);
    }

    #[test]
    fn moved_item_with_nested_change() {
        let left = json!([{"id": 1, "v": "a"}, {"id": 2}]);
        let right = json!([{"id": 2}, {"id": 1, "v": "c"}]);
        let delta = d(json!({"_t": "a", "_0": ["", 1, 3], "1": {"v": ["a", "c"]}}));
        assert_eq!(patch(&left, &delta).unwrap(), right);
        assert_eq!(unpatch(&right, &delta).unwrap(), left);
    }

    #[test]
    fn deleted_value_must_match() {
        let err = patch(&json!([1, 2]), &d(json!({"_t": "a", "_1": [3, 0, 0]}))).unwrap_err();
        assert_eq!(err.to_string(), "value mismatch at $[1]: expected 3, found 2");
    }

    #[test]
    fn removal_out_of_range() {
        assert!(matches!(
            patch(&json!([1]), &d(json!({"_t": "a", "_4": [1, 0, 0]}))),
            Err(PatchError::IndexOutOfRange { index: 4, len: 1, .. })
        ));
    }

    #[test]
    fn insertion_past_the_end() {
        assert!(matches!(
            patch(&json!([1]), &d(json!({"_t": "a", "3": [2]}))),
            Err(PatchError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn conflicting_destinations() {
        let delta = d(json!({"_t": "a", "_0": ["", 1, 3], "1": [9]}));
        assert!(matches!(
            patch(&json!([1, 2]), &delta),
            Err(PatchError::DuplicateIndex { index: 1, .. })
        ));
    }

    #[test]
    fn unpatch_checks_added_values() {
        let delta = d(json!({"_t": "a", "1": [2]}));
        assert_eq!(unpatch(&json!([1, 2]), &delta).unwrap(), json!([1]));
        assert!(matches!(
            unpatch(&json!([1, 7]), &delta),
            Err(PatchError::ValueMismatch { .. })
        ));
    }
}
