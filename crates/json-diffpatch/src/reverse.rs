//! Delta inversion.

use std::collections::BTreeMap;

use crate::delta::{ArrayDelta, ArrayRemoval, Delta};
use crate::error::{PatchError, PatchResult};
use crate::options::PatchOptions;
use crate::patch::claim;
use crate::path::JsonPath;

/// Returns the delta that turns the right-hand value back into the left-hand
/// one, so that `patch(right, &reverse(d)?)` equals `unpatch(right, d)`.
///
/// ```
/// use serde_json::json;
/// use json_diffpatch::{diff, patch, reverse};
///
/// let (left, right) = (json!([1, 2, 3]), json!([3, 1]));
/// let delta = diff(&left, &right).unwrap().unwrap();
/// assert_eq!(patch(&right, &reverse(&delta).unwrap()).unwrap(), left);
/// ```
pub fn reverse(delta: &Delta) -> PatchResult<Delta> {
    reverse_with_options(delta, &PatchOptions::default())
}

pub fn reverse_with_options(delta: &Delta, options: &PatchOptions) -> PatchResult<Delta> {
    reverse_at(delta, &JsonPath::root(), options)
}

fn reverse_at(delta: &Delta, path: &JsonPath, options: &PatchOptions) -> PatchResult<Delta> {
    Ok(match delta {
        Delta::Added(value) => Delta::Deleted(value.clone()),
        Delta::Deleted(value) => Delta::Added(value.clone()),
        Delta::Modified { left, right } => Delta::Modified {
            left: right.clone(),
            right: left.clone(),
        },
        Delta::Text(script) => {
            let reversed = options
                .text_differ()
                .reverse(script)
                .map_err(|source| PatchError::Text {
                    path: path.to_string(),
                    source,
                })?;
            Delta::Text(reversed)
        }
        Delta::Object(members) => Delta::Object(
            members
                .iter()
                .map(|(key, member)| {
                    let reversed = reverse_at(member, &path.key(key), options)?;
                    Ok::<_, PatchError>((key.clone(), reversed))
                })
                .collect::<PatchResult<_>>()?,
        ),
        Delta::Array(array) => Delta::Array(reverse_array(array, path, options)?),
    })
}

fn reverse_array(delta: &ArrayDelta, path: &JsonPath, options: &PatchOptions) -> PatchResult<ArrayDelta> {
    let mut reversed = ArrayDelta::new();
    // New indices occupied by something that was not kept in place.
    let mut inserted: BTreeMap<usize, ()> = BTreeMap::new();

    for (&index, entry) in &delta.items {
        if let Delta::Added(value) = entry {
            claim(&mut inserted, index, (), path)?;
            reversed.removed.insert(index, ArrayRemoval::Deleted(value.clone()));
        }
    }
    for (&index, removal) in &delta.removed {
        match removal {
            ArrayRemoval::Deleted(value) => {
                reversed.items.insert(index, Delta::Added(value.clone()));
            }
            ArrayRemoval::Moved { to } => {
                claim(&mut inserted, *to, (), path)?;
                reversed.removed.insert(*to, ArrayRemoval::Moved { to: index });
            }
        }
    }

    for (&index, entry) in &delta.items {
        if entry.is_added() {
            continue;
        }
        let original = match delta
            .removed
            .iter()
            .find(|(_, removal)| matches!(removal, ArrayRemoval::Moved { to } if *to == index))
        {
            Some((&from, _)) => from,
            None => kept_origin(index, &inserted, delta),
        };
        let sub = reverse_at(entry, &path.index(index), options)?;
        reversed.items.insert(original, sub);
    }
    Ok(reversed)
}

/// Maps the new index of an item kept in place to its original index. Kept
/// items keep their relative order, so the rank among kept items is the same
/// on both sides.
fn kept_origin(index: usize, inserted: &BTreeMap<usize, ()>, delta: &ArrayDelta) -> usize {
    // Destinations are distinct, so at most `index` of them precede it.
    let rank = index - inserted.range(..index).count();
    let mut original = rank;
    for &removed in delta.removed.keys() {
        if removed <= original {
            original += 1;
        } else {
            break;
        }
    }
    original
}
