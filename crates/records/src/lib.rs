//! Typed clinic records and their JSON wire boundary.
//!
//! This crate provides **domain models** for the records a clinic edits (patients, encounters,
//! prescriptions, feedback) and **translation helpers** to and from the JSON the REST API
//! speaks:
//! - explicit record and sub-record types instead of free-form JSON objects
//! - a declarative field schema per record kind ([`RecordSchema`])
//! - name-based field access ([`Record`], [`SubRecord`], [`CollectionField`]) so a generic
//!   editor can dispatch on the field names a form emits
//! - strict-but-tolerant wire parsing with the failing path reported on mismatch
//!
//! No editing state lives here; drafts, sessions and persistence belong in `clinic-core`.

pub mod encounter;
pub mod feedback;
pub mod fields;
pub mod kind;
pub mod patient;
pub mod prescription;
pub mod record;
pub mod schema;
mod wire;

pub use encounter::{CarePlan, EncounterRecord, Procedure, TestOrder};
pub use feedback::FeedbackRecord;
pub use fields::{CollectionField, FieldError, FieldIssue, SubRecord};
pub use kind::RecordKind;
pub use patient::{Allergy, Condition, Contact, Medication, PatientRecord};
pub use prescription::{PrescribedDrug, PrescriptionRecord};
pub use record::Record;
pub use schema::{FieldKind, FieldSpec, RecordSchema, SubFieldSpec};

// Re-export the identifier type so callers need not depend on clinic-ids directly.
pub use clinic_ids::RecordId;

/// Errors returned by the `records` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid record id: {0}")]
    InvalidId(#[from] clinic_ids::IdError),
}

/// Type alias for Results that can fail with a [`RecordsError`].
pub type RecordsResult<T> = Result<T, RecordsError>;
