//! Error types for diffing, patching and delta parsing.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Error type returned by user-supplied callbacks.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Identifies which caller-supplied callback failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    ArrayItemMatcher,
    ArrayObjectItemKeyFinder,
    PropertyFilter,
    TextDiffProvider,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallbackKind::ArrayItemMatcher => "array item matcher",
            CallbackKind::ArrayObjectItemKeyFinder => "array object item key finder",
            CallbackKind::PropertyFilter => "property filter",
            CallbackKind::TextDiffProvider => "text diff provider",
        };
        f.write_str(name)
    }
}

/// Errors raised while computing a delta.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A caller-supplied callback returned an error. The original error is
    /// kept as the source.
    #[error("{kind} failed at {path}: {source}")]
    Callback {
        kind: CallbackKind,
        path: String,
        #[source]
        source: CallbackError,
    },
}

/// Errors raised by the text differencer and its edit scripts.
#[derive(Debug, Error)]
pub enum TextPatchError {
    #[error("invalid hunk header: {0:?}")]
    InvalidHeader(String),
    #[error("invalid edit script line: {0:?}")]
    InvalidLine(String),
    #[error("invalid percent-encoding in edit script: {0:?}")]
    InvalidEncoding(String),
    /// The source side of a hunk could not be located in the target text.
    #[error("hunk {hunk} does not match the target text")]
    Mismatch { hunk: usize },
    /// A custom text differ failed.
    #[error("text differ failed: {0}")]
    Provider(#[source] CallbackError),
}

/// Errors raised while patching or unpatching a value.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The delta expects a different kind of value at this location.
    #[error("shape mismatch at {path}: delta expects {expected}, found {actual}")]
    ShapeMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },
    /// The value at this location is not the one recorded in the delta.
    #[error("value mismatch at {path}: expected {expected}, found {actual}")]
    ValueMismatch {
        path: String,
        expected: Value,
        actual: Value,
    },
    #[error("missing member at {path}")]
    MissingMember { path: String },
    #[error("member already present at {path}")]
    MemberExists { path: String },
    #[error("index {index} out of range at {path} (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
    /// Two operations of an array delta insert at the same index.
    #[error("conflicting operations for index {index} at {path}")]
    DuplicateIndex { path: String, index: usize },
    #[error("cannot {op} the root value")]
    RootOperation { op: &'static str },
    #[error("text patch failed at {path}: {source}")]
    Text {
        path: String,
        #[source]
        source: TextPatchError,
    },
}

/// A value tree that does not follow the delta grammar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeltaError {
    #[error("malformed delta at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

pub type DiffResult<T> = Result<T, DiffError>;
pub type PatchResult<T> = Result<T, PatchError>;

/// Short name of a value's kind, used in shape errors.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
