//! Name-based access to record fields.
//!
//! Forms address fields by their wire names (`"allergies"`, `"dosage"`). These traits let a
//! generic editor reach the typed storage behind those names without knowing the concrete
//! record type:
//! - [`SubRecord`] is one element of a collection, or a singular nested object
//! - [`CollectionField`] is an ordered list of sub-records, addressed by position only

use clinic_types::is_blank;
use std::fmt;

/// Errors raised when a field value cannot be stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{owner} has no field '{key}'")]
    UnknownKey { owner: &'static str, key: String },

    #[error("field '{key}' is assigned by the server and cannot be edited")]
    ReadOnly { key: String },

    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

impl FieldError {
    pub(crate) fn unknown(owner: &'static str, key: &str) -> Self {
        Self::UnknownKey {
            owner,
            key: key.to_owned(),
        }
    }

    pub(crate) fn read_only(key: &str) -> Self {
        Self::ReadOnly {
            key: key.to_owned(),
        }
    }

    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_owned(),
            reason: reason.into(),
        }
    }
}

/// A problem found while validating a record before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Wire name (or dot path) of the offending field.
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// An element of a named collection, or a singular nested object.
///
/// All sub-record fields are optional text. Setting a blank value clears the field.
pub trait SubRecord: fmt::Debug {
    /// Replaces one field. A blank `value` unsets it.
    fn set(&mut self, key: &str, value: &str) -> Result<(), FieldError>;

    /// Current value of one field, `None` when unset or unknown.
    fn get(&self, key: &str) -> Option<&str>;

    /// Wire names of every field, in display order.
    fn keys(&self) -> &'static [&'static str];

    /// True when every field is unset or blank.
    fn is_blank(&self) -> bool {
        self.keys().iter().all(|key| is_blank(self.get(key)))
    }
}

/// An ordered list of sub-records.
///
/// Implemented for `Vec<T>` of any sub-record type, so records only expose their vectors.
pub trait CollectionField: fmt::Debug {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a sub-record with every field unset.
    fn push_blank(&mut self);

    /// Removes the entry at `index`, keeping the order of the rest.
    ///
    /// Returns `false` and leaves the collection untouched when `index` is out of range.
    fn remove(&mut self, index: usize) -> bool;

    fn entry(&self, index: usize) -> Option<&dyn SubRecord>;

    fn entry_mut(&mut self, index: usize) -> Option<&mut dyn SubRecord>;

    /// Drops every blank entry. Returns how many were removed.
    fn retain_filled(&mut self) -> usize;
}

impl<T> CollectionField for Vec<T>
where
    T: SubRecord + Default + 'static,
{
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn push_blank(&mut self) {
        self.push(T::default());
    }

    fn remove(&mut self, index: usize) -> bool {
        if index >= Vec::len(self) {
            return false;
        }
        Vec::remove(self, index);
        true
    }

    fn entry(&self, index: usize) -> Option<&dyn SubRecord> {
        self.get(index).map(|e| e as &dyn SubRecord)
    }

    fn entry_mut(&mut self, index: usize) -> Option<&mut dyn SubRecord> {
        self.get_mut(index).map(|e| e as &mut dyn SubRecord)
    }

    fn retain_filled(&mut self) -> usize {
        let before = Vec::len(self);
        self.retain(|entry| !entry.is_blank());
        before - Vec::len(self)
    }
}
