//! Array sequence differencing.
//!
//! Items are aligned in two phases. First the common head and tail are
//! trimmed and a longest common subsequence is computed over the rest under
//! the active matching policy. Then left-only items are paired with right-only
//! items they match (moves); the remainder become deletions and additions.
//! Every matched pair is diffed recursively.

use serde_json::Value;
use tracing::debug;

use super::{diff_at, lcs::lcs};
use crate::context::DiffContext;
use crate::delta::{ArrayDelta, ArrayRemoval, Delta};
use crate::equal::equals_at;
use crate::error::{CallbackKind, DiffError, DiffResult};
use crate::options::{ArrayItemMatchContext, DiffOptions};
use crate::path::JsonPath;

/// Decides whether a left and a right item are the same logical item.
struct ItemMatcher<'a> {
    left: &'a [Value],
    right: &'a [Value],
    path: &'a JsonPath,
    options: &'a DiffOptions,
    left_keys: Vec<Option<Value>>,
    right_keys: Vec<Option<Value>>,
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

impl<'a> ItemMatcher<'a> {
    fn new(
        left: &'a [Value],
        right: &'a [Value],
        path: &'a JsonPath,
        options: &'a DiffOptions,
    ) -> DiffResult<Self> {
        let mut matcher = Self {
            left,
            right,
            path,
            options,
            left_keys: Vec::new(),
            right_keys: Vec::new(),
        };
        if options.array_item_matcher.is_none() && options.array_object_item_key_finder.is_some()
        {
            matcher.left_keys = matcher.keys(left)?;
            matcher.right_keys = matcher.keys(right)?;
        }
        Ok(matcher)
    }

    fn keys(&self, items: &[Value]) -> DiffResult<Vec<Option<Value>>> {
        let Some(finder) = &self.options.array_object_item_key_finder else {
            return Ok(vec![None; items.len()]);
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                if !is_container(item) {
                    return Ok(None);
                }
                finder(item, index).map_err(|source| DiffError::Callback {
                    kind: CallbackKind::ArrayObjectItemKeyFinder,
                    path: self.path.index(index).to_string(),
                    source,
                })
            })
            .collect()
    }

    fn matches(&self, i: usize, j: usize) -> DiffResult<bool> {
        if let Some(matcher) = &self.options.array_item_matcher {
            let ctx = ArrayItemMatchContext {
                left: &self.left[i],
                left_index: i,
                right: &self.right[j],
                right_index: j,
            };
            return matcher(&ctx).map_err(|source| DiffError::Callback {
                kind: CallbackKind::ArrayItemMatcher,
                path: self.path.to_string(),
                source,
            });
        }

        let fuzzy = self.fuzzy(i, j);
        if self.options.prefer_fuzzy_array_item_match {
            if let Some(decision) = fuzzy {
                return Ok(decision);
            }
            return self.deep_equal(i, j);
        }
        if self.deep_equal(i, j)? {
            return Ok(true);
        }
        Ok(fuzzy.unwrap_or(false))
    }

    /// Key or position based decision for object/array items, `None` when
    /// neither rule applies.
    fn fuzzy(&self, i: usize, j: usize) -> Option<bool> {
        if !is_container(&self.left[i]) || !is_container(&self.right[j]) {
            return None;
        }
        if self.options.array_object_item_key_finder.is_some() {
            match (&self.left_keys[i], &self.right_keys[j]) {
                (Some(a), Some(b)) => return Some(a == b),
                (None, None) => {}
                _ => return Some(false),
            }
        }
        if self.options.array_object_item_match_by_position && i == j {
            return Some(true);
        }
        None
    }

    fn deep_equal(&self, i: usize, j: usize) -> DiffResult<bool> {
        equals_at(&self.left[i], &self.right[j], &self.path.index(i), self.options)
    }
}

/// Diffs two arrays. `left_value`/`right_value` are the arrays themselves,
/// handed to the property filter.
pub(crate) fn diff_array(
    left_value: &Value,
    right_value: &Value,
    left: &[Value],
    right: &[Value],
    path: &JsonPath,
    options: &DiffOptions,
) -> DiffResult<Option<ArrayDelta>> {
    let ctx = DiffContext::new(left_value, right_value, path, options);
    let li = ctx.included_indices(left)?;
    let ri = ctx.included_indices(right)?;
    let matcher = ItemMatcher::new(left, right, path, options)?;

    let (n, m) = (li.len(), ri.len());
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    let mut head = 0;
    while head < n && head < m && matcher.matches(li[head], ri[head])? {
        pairs.push((li[head], ri[head]));
        head += 1;
    }
    let mut tail = 0;
    while tail < n - head
        && tail < m - head
        && matcher.matches(li[n - 1 - tail], ri[m - 1 - tail])?
    {
        pairs.push((li[n - 1 - tail], ri[m - 1 - tail]));
        tail += 1;
    }

    let middle_left = &li[head..n - tail];
    let middle_right = &ri[head..m - tail];

    let mut delta = ArrayDelta::new();
    let mut moved = 0usize;

    if middle_left.is_empty() {
        for &j in middle_right {
            delta.items.insert(j, Delta::Added(right[j].clone()));
        }
    } else if middle_right.is_empty() {
        for &i in middle_left {
            delta.removed.insert(i, ArrayRemoval::Deleted(left[i].clone()));
        }
    } else {
        let mut table = Vec::with_capacity(middle_left.len());
        for &i in middle_left {
            let mut row = Vec::with_capacity(middle_right.len());
            for &j in middle_right {
                row.push(matcher.matches(i, j)?);
            }
            table.push(row);
        }

        let common = lcs(&table, middle_right.len());
        let mut left_kept = vec![false; middle_left.len()];
        let mut right_kept = vec![false; middle_right.len()];
        for &(a, b) in &common {
            left_kept[a] = true;
            right_kept[b] = true;
            pairs.push((middle_left[a], middle_right[b]));
        }

        // Left-only items, ascending; `true` once claimed by a move.
        let mut removed: Vec<(usize, bool)> = (0..middle_left.len())
            .filter(|&a| !left_kept[a])
            .map(|a| (a, false))
            .collect();

        for b in (0..middle_right.len()).filter(|&b| !right_kept[b]) {
            let j = middle_right[b];
            let source = if options.suppress_detect_array_move {
                None
            } else {
                removed
                    .iter_mut()
                    .find(|(a, claimed)| !*claimed && table[*a][b])
            };
            match source {
                Some((a, claimed)) => {
                    *claimed = true;
                    let i = middle_left[*a];
                    delta.removed.insert(i, ArrayRemoval::Moved { to: j });
                    pairs.push((i, j));
                    moved += 1;
                }
                None => {
                    delta.items.insert(j, Delta::Added(right[j].clone()));
                }
            }
        }

        for &(a, claimed) in &removed {
            if !claimed {
                let i = middle_left[a];
                delta.removed.insert(i, ArrayRemoval::Deleted(left[i].clone()));
            }
        }
    }

    for &(i, j) in &pairs {
        if let Some(sub) = diff_at(&left[i], &right[j], &path.index(i), options)? {
            delta.items.insert(j, sub);
        }
    }

    debug!(
        path = %path,
        left_len = left.len(),
        right_len = right.len(),
        head,
        tail,
        removed = delta.removed.len() - moved,
        moved,
        "array alignment"
    );

    Ok((!delta.is_empty()).then_some(delta))
}
