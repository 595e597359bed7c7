use serde_json::Value;

use crate::error::{CallbackKind, DiffError, DiffResult};
use crate::options::DiffOptions;
use crate::path::JsonPath;

/// The comparison in progress when a property filter runs.
///
/// `left` and `right` are the two containers whose members are being
/// filtered (both objects, or both arrays). `path` is their location in the
/// left tree.
#[derive(Debug, Clone, Copy)]
pub struct DiffContext<'a> {
    left: &'a Value,
    right: &'a Value,
    path: &'a JsonPath,
    options: &'a DiffOptions,
}

impl<'a> DiffContext<'a> {
    pub(crate) fn new(
        left: &'a Value,
        right: &'a Value,
        path: &'a JsonPath,
        options: &'a DiffOptions,
    ) -> Self {
        Self {
            left,
            right,
            path,
            options,
        }
    }

    pub fn left(&self) -> &'a Value {
        self.left
    }

    pub fn right(&self) -> &'a Value {
        self.right
    }

    pub fn path(&self) -> &'a JsonPath {
        self.path
    }

    pub fn options(&self) -> &'a DiffOptions {
        self.options
    }

    /// Runs the property filter for a member name.
    pub(crate) fn includes(&self, name: &str) -> DiffResult<bool> {
        match &self.options.property_filter {
            None => Ok(true),
            Some(filter) => filter(name, self).map_err(|source| DiffError::Callback {
                kind: CallbackKind::PropertyFilter,
                path: self.path.to_string(),
                source,
            }),
        }
    }

    /// Indices of the array items that take part in comparison.
    pub(crate) fn included_indices(&self, items: &[Value]) -> DiffResult<Vec<usize>> {
        if self.options.property_filter.is_none() {
            return Ok((0..items.len()).collect());
        }
        let mut indices = Vec::with_capacity(items.len());
        for index in 0..items.len() {
            if self.includes(&index.to_string())? {
                indices.push(index);
            }
        }
        Ok(indices)
    }
}
