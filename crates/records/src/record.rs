//! The record trait shared by every editable kind.

use crate::{
    CollectionField, FieldError, FieldIssue, RecordId, RecordKind, RecordSchema, RecordsResult,
    SubRecord,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;

/// An editable record with a server-assigned identifier, scalar fields, nested objects and
/// named collections of sub-records.
///
/// `Default` is the empty template used when creating a new record. `Clone` is a deep copy:
/// records own all of their data, so a clone never aliases the original.
pub trait Record: Clone + fmt::Debug + Default + PartialEq + Send + Sync + 'static {
    const KIND: RecordKind;

    /// Identifier assigned by the server, `None` until first persisted.
    fn id(&self) -> Option<&RecordId>;

    /// Creation timestamp used for edit-window checks.
    fn created_at(&self) -> Option<DateTime<Utc>>;

    fn schema() -> &'static RecordSchema;

    /// Display value of a top-level scalar.
    fn scalar(&self, key: &str) -> Option<String>;

    /// Replaces a top-level scalar from raw form input. A blank value unsets it.
    fn set_scalar(&mut self, key: &str, value: &str) -> Result<(), FieldError>;

    fn nested(&self, name: &str) -> Option<&dyn SubRecord>;

    fn nested_mut(&mut self, name: &str) -> Option<&mut dyn SubRecord>;

    fn collection(&self, name: &str) -> Option<&dyn CollectionField>;

    fn collection_mut(&mut self, name: &str) -> Option<&mut dyn CollectionField>;

    /// Checks that must pass before the record is handed to persistence.
    fn validate(&self) -> Vec<FieldIssue>;

    /// Translates a wire JSON value into the record.
    fn from_wire_value(value: Value) -> RecordsResult<Self>;

    /// Translates the record into its wire JSON value.
    fn to_wire_value(&self) -> RecordsResult<Value>;

    fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// Parses a record from JSON text.
    fn parse_json(text: &str) -> RecordsResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_wire_value(value)
    }

    /// Renders the record as pretty-printed JSON text.
    fn render_json(&self) -> RecordsResult<String> {
        let value = self.to_wire_value()?;
        Ok(serde_json::to_string_pretty(&value)?)
    }
}
