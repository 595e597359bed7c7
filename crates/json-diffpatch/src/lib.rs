//! json-diffpatch: structural diff and patch for JSON values.
//!
//! [`diff`] compares two [`serde_json::Value`] trees and produces a compact
//! [`Delta`]; [`patch`] applies it forward, [`unpatch`] applies it backward and
//! [`reverse`] inverts it. Deltas use the jsondiffpatch wire grammar, including
//! array move detection and text edit scripts for long strings, so they can be
//! exchanged with other implementations of that format.
//!
//! ```
//! use serde_json::json;
//! use json_diffpatch::{diff, patch, unpatch};
//!
//! let left = json!({"name": "ada", "langs": ["en", "fr"]});
//! let right = json!({"name": "ada", "langs": ["fr", "en", "de"]});
//!
//! let delta = diff(&left, &right).unwrap().expect("values differ");
//! assert_eq!(
//!     delta.to_value(),
//!     json!({"langs": {"_t": "a", "_0": ["", 1, 3], "2": ["de"]}})
//! );
//! assert_eq!(patch(&left, &delta).unwrap(), right);
//! assert_eq!(unpatch(&right, &delta).unwrap(), left);
//! ```

pub mod context;
pub mod delta;
pub mod diff;
pub mod equal;
pub mod error;
pub mod json_patch;
pub mod options;
pub mod patch;
pub mod path;
pub mod reverse;
pub mod text;

pub use context::DiffContext;
pub use delta::{ArrayDelta, ArrayRemoval, Delta};
pub use diff::{diff, diff_with_options};
pub use equal::deep_equals;
pub use error::{
    CallbackError, CallbackKind, DeltaError, DiffError, DiffResult, PatchError, PatchResult,
    TextPatchError,
};
pub use json_patch::{to_json_patch, to_json_patch_with_options, JsonPatchOperation};
pub use options::{
    ArrayItemMatchContext, ArrayItemMatcher, ArrayObjectItemKeyFinder, DiffOptions, PatchOptions,
    PropertyFilter,
};
pub use patch::{patch, patch_with_options, unpatch, unpatch_with_options};
pub use path::{JsonPath, PathSegment};
pub use reverse::{reverse, reverse_with_options};
pub use text::{MyersTextDiffer, TextDiffer};
