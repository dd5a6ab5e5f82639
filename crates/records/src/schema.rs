//! Declarative field schema per record kind.
//!
//! A schema lists every editable field of a record by wire name, says whether it is a plain
//! scalar, a singular nested object, or a collection of sub-records, and names the sub-fields
//! of the latter two. The editor uses it to route an edit, the command line uses it to render a
//! record, and validation uses it for required scalars.

use crate::{FieldIssue, Record, RecordKind};
use clinic_types::is_blank;

/// One field of a nested object or collection element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubFieldSpec {
    pub name: &'static str,
    pub label: &'static str,
}

/// Shape of a top-level field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// A single value stored directly on the record.
    Scalar,
    /// A singular nested object, addressed as `parent.child`.
    Nested(&'static [SubFieldSpec]),
    /// An ordered list of sub-records, addressed by position.
    Collection(&'static [SubFieldSpec]),
}

/// One top-level field of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Required scalars must be non-blank before a record is submitted.
    pub required: bool,
}

impl FieldSpec {
    pub const fn scalar(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Scalar,
            required: false,
        }
    }

    pub const fn required(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Scalar,
            required: true,
        }
    }

    pub const fn nested(
        name: &'static str,
        label: &'static str,
        subfields: &'static [SubFieldSpec],
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Nested(subfields),
            required: false,
        }
    }

    pub const fn collection(
        name: &'static str,
        label: &'static str,
        subfields: &'static [SubFieldSpec],
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Collection(subfields),
            required: false,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, FieldKind::Collection(_))
    }

    /// Sub-fields of a nested or collection field; empty for scalars.
    pub fn subfields(&self) -> &'static [SubFieldSpec] {
        match self.kind {
            FieldKind::Scalar => &[],
            FieldKind::Nested(subfields) | FieldKind::Collection(subfields) => subfields,
        }
    }
}

/// The editable fields of one record kind.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordSchema {
    pub kind: RecordKind,
    pub fields: &'static [FieldSpec],
}

impl RecordSchema {
    /// Looks up a top-level field by wire name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Wire names of every collection field.
    pub fn collection_names(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.is_collection())
            .map(|f| f.name)
            .collect()
    }
}

/// Reports every required scalar of `record` that is blank.
pub fn missing_required<R: Record>(record: &R) -> Vec<FieldIssue> {
    R::schema()
        .fields
        .iter()
        .filter(|spec| spec.required)
        .filter(|spec| is_blank(record.scalar(spec.name).as_deref()))
        .map(|spec| FieldIssue::new(spec.name, format!("{} is required", spec.label)))
        .collect()
}

pub(crate) const fn sub(name: &'static str, label: &'static str) -> SubFieldSpec {
    SubFieldSpec { name, label }
}
