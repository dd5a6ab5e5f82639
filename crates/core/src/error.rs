use records::{FieldError, FieldIssue, RecordKind, RecordsError};

/// Errors raised by the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),
    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: String },
    #[error("failed to translate record: {0}")]
    Records(#[from] RecordsError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no draft is open")]
    NotEditing,
    #[error("a draft is already open")]
    AlreadyEditing,
    #[error("a submission is already in flight")]
    SubmitInProgress,
    #[error("no submission is in flight")]
    NotSubmitting,
    #[error("{kind} {id} can no longer be edited: its edit window has closed")]
    EditWindowClosed { kind: RecordKind, id: String },

    #[error("{kind} has no field '{field}'")]
    UnknownField { kind: RecordKind, field: String },
    #[error("field '{field}' is not a {expected} field")]
    WrongFieldKind {
        field: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("validation failed: {}", join_issues(.0))]
    Validation(Vec<FieldIssue>),
    #[error("failed to save {kind}: {source}")]
    Persistence {
        kind: RecordKind,
        #[source]
        source: StoreError,
    },
    #[error("record translation failed: {0}")]
    Records(#[from] RecordsError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
