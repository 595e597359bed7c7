//! Diff and patch configuration.
//!
//! [`DiffOptions`] is resolved once per top-level call and never changes while
//! the call runs. Callbacks are shared behind `Arc` so options stay cheap to
//! clone and can be reused across threads.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::DiffContext;
use crate::error::CallbackError;
use crate::text::{MyersTextDiffer, TextDiffer};

/// The pair of array items a matcher is asked about. Indices refer to the
/// full left and right arrays.
#[derive(Debug, Clone, Copy)]
pub struct ArrayItemMatchContext<'a> {
    pub left: &'a Value,
    pub left_index: usize,
    pub right: &'a Value,
    pub right_index: usize,
}

/// Decides whether two array items are the same logical item.
pub type ArrayItemMatcher =
    Arc<dyn Fn(&ArrayItemMatchContext<'_>) -> Result<bool, CallbackError> + Send + Sync>;

/// Extracts an identity key from an object or array item. `None` marks the
/// item as unkeyed.
pub type ArrayObjectItemKeyFinder =
    Arc<dyn Fn(&Value, usize) -> Result<Option<Value>, CallbackError> + Send + Sync>;

/// Returns `false` to exclude a member from comparison.
pub type PropertyFilter =
    Arc<dyn Fn(&str, &DiffContext<'_>) -> Result<bool, CallbackError> + Send + Sync>;

static DEFAULT_TEXT_DIFFER: MyersTextDiffer = MyersTextDiffer::new();

/// Options for [`diff_with_options`](crate::diff_with_options).
#[derive(Clone, Default)]
pub struct DiffOptions {
    /// Encode moved array items as a delete plus an add.
    pub suppress_detect_array_move: bool,
    /// Overrides every other array matching rule when set.
    pub array_item_matcher: Option<ArrayItemMatcher>,
    /// Matches object/array items by a derived key.
    pub array_object_item_key_finder: Option<ArrayObjectItemKeyFinder>,
    /// Treats object/array items at the same index as the same item.
    pub array_object_item_match_by_position: bool,
    /// Try key/position matching before deep equality.
    pub prefer_fuzzy_array_item_match: bool,
    /// Minimum length (in characters) of both strings before text diffing is
    /// used. `0` disables text diffing.
    pub text_diff_min_length: usize,
    /// Replaces the default Myers text differ.
    pub text_diff_provider: Option<Arc<dyn TextDiffer>>,
    pub property_filter: Option<PropertyFilter>,
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppress_detect_array_move(mut self, suppress: bool) -> Self {
        self.suppress_detect_array_move = suppress;
        self
    }

    pub fn with_array_item_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&ArrayItemMatchContext<'_>) -> Result<bool, CallbackError> + Send + Sync + 'static,
    {
        self.array_item_matcher = Some(Arc::new(matcher));
        self
    }

    pub fn with_array_object_item_key_finder<F>(mut self, key_finder: F) -> Self
    where
        F: Fn(&Value, usize) -> Result<Option<Value>, CallbackError> + Send + Sync + 'static,
    {
        self.array_object_item_key_finder = Some(Arc::new(key_finder));
        self
    }

    pub fn array_object_item_match_by_position(mut self, enabled: bool) -> Self {
        self.array_object_item_match_by_position = enabled;
        self
    }

    pub fn prefer_fuzzy_array_item_match(mut self, enabled: bool) -> Self {
        self.prefer_fuzzy_array_item_match = enabled;
        self
    }

    pub fn text_diff_min_length(mut self, min_length: usize) -> Self {
        self.text_diff_min_length = min_length;
        self
    }

    pub fn with_text_diff_provider(mut self, provider: Arc<dyn TextDiffer>) -> Self {
        self.text_diff_provider = Some(provider);
        self
    }

    pub fn with_property_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, &DiffContext<'_>) -> Result<bool, CallbackError> + Send + Sync + 'static,
    {
        self.property_filter = Some(Arc::new(filter));
        self
    }

    /// The text differ to use for two strings, if text diffing applies to them.
    pub(crate) fn text_differ_for(&self, left: &str, right: &str) -> Option<&dyn TextDiffer> {
        let min = self.text_diff_min_length;
        if min == 0 || left.chars().count() < min || right.chars().count() < min {
            return None;
        }
        Some(match &self.text_diff_provider {
            Some(provider) => provider.as_ref(),
            None => &DEFAULT_TEXT_DIFFER,
        })
    }
}

impl fmt::Debug for DiffOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffOptions")
            .field("suppress_detect_array_move", &self.suppress_detect_array_move)
            .field("array_item_matcher", &self.array_item_matcher.is_some())
            .field(
                "array_object_item_key_finder",
                &self.array_object_item_key_finder.is_some(),
            )
            .field(
                "array_object_item_match_by_position",
                &self.array_object_item_match_by_position,
            )
            .field(
                "prefer_fuzzy_array_item_match",
                &self.prefer_fuzzy_array_item_match,
            )
            .field("text_diff_min_length", &self.text_diff_min_length)
            .field("text_diff_provider", &self.text_diff_provider.is_some())
            .field("property_filter", &self.property_filter.is_some())
            .finish()
    }
}

/// Options for patching, unpatching and reversing deltas.
#[derive(Clone, Default)]
pub struct PatchOptions {
    /// Interprets text edit scripts. Defaults to the Myers text differ.
    pub text_differ: Option<Arc<dyn TextDiffer>>,
}

impl PatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_differ(mut self, differ: Arc<dyn TextDiffer>) -> Self {
        self.text_differ = Some(differ);
        self
    }

    pub(crate) fn text_differ(&self) -> &dyn TextDiffer {
        match &self.text_differ {
            Some(differ) => differ.as_ref(),
            None => &DEFAULT_TEXT_DIFFER,
        }
    }
}

impl fmt::Debug for PatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchOptions")
            .field("text_differ", &self.text_differ.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_diffing_is_disabled_by_default() {
        let options = DiffOptions::default();
        assert!(options.text_differ_for("a long enough string", "another long string").is_none());
    }

    #[test]
    fn text_diffing_requires_both_sides_to_reach_min_length() {
        let options = DiffOptions::new().text_diff_min_length(5);
        assert!(options.text_differ_for("abcde", "abcdef").is_some());
        assert!(options.text_differ_for("abcd", "abcdef").is_none());
        assert!(options.text_differ_for("abcdef", "abc").is_none());
    }

    #[test]
    fn min_length_counts_characters() {
        let options = DiffOptions::new().text_diff_min_length(3);
        assert!(options.text_differ_for("äöü", "ßßß").is_some());
    }

    #[test]
    fn debug_hides_callbacks() {
        let options = DiffOptions::new().with_property_filter(|_, _| Ok(true));
        let rendered = format!("{options:?}");
        assert!(rendered.contains("property_filter: true"));
    }
}
