//! Long-string differencing.
//!
//! A [`TextDiffer`] turns two strings into a compact, reversible edit script
//! and interprets such scripts again. The default [`MyersTextDiffer`] emits
//! diff-match-patch style patch text.

pub mod myers;
pub mod script;

use tracing::{debug, warn};

use crate::error::TextPatchError;

/// A pluggable text diff algorithm.
///
/// Implementations must be exactly reversible: for any script `s` returned by
/// `diff(a, b)`, `patch(a, s) == b` and `unpatch(b, s) == a`.
pub trait TextDiffer: Send + Sync {
    /// Computes an edit script, or `None` to fall back to whole-value
    /// replacement.
    fn diff(&self, left: &str, right: &str) -> Result<Option<String>, TextPatchError>;

    fn patch(&self, text: &str, script: &str) -> Result<String, TextPatchError>;

    fn unpatch(&self, text: &str, script: &str) -> Result<String, TextPatchError>;

    /// The script that undoes `script`.
    fn reverse(&self, script: &str) -> Result<String, TextPatchError>;
}

/// Character-level Myers diff serialized as diff-match-patch patch text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MyersTextDiffer;

impl MyersTextDiffer {
    pub const fn new() -> Self {
        MyersTextDiffer
    }
}

impl TextDiffer for MyersTextDiffer {
    fn diff(&self, left: &str, right: &str) -> Result<Option<String>, TextPatchError> {
        let edits = myers::diff(left, right);
        let hunks = script::make_hunks(&edits);
        let text = script::to_text(&hunks);

        let verified = script::from_text(&text).is_ok_and(|parsed| {
            script::apply(left, &parsed, true).is_ok_and(|out| out == right)
                && script::apply(right, &parsed, false).is_ok_and(|out| out == left)
        });
        if !verified {
            warn!(
                left_len = left.len(),
                right_len = right.len(),
                "text edit script failed verification, declining"
            );
            return Ok(None);
        }
        debug!(hunks = hunks.len(), script_len = text.len(), "text diff");
        Ok(Some(text))
    }

    fn patch(&self, text: &str, script: &str) -> Result<String, TextPatchError> {
        script::apply(text, &script::from_text(script)?, true)
    }

    fn unpatch(&self, text: &str, script: &str) -> Result<String, TextPatchError> {
        script::apply(text, &script::from_text(script)?, false)
    }

    fn reverse(&self, script: &str) -> Result<String, TextPatchError> {
        Ok(script::to_text(&script::reverse(&script::from_text(script)?)))
    }
}
