//! Record identifier utilities.
//!
//! Every persisted clinic record carries an identifier assigned by the persistence layer. The
//! REST API exposes it as a 24-character hexadecimal object id (for example
//! `65f1c2a9e4b0a1b2c3d4e5f6`).
//!
//! This crate provides a small wrapper type ([`RecordId`]) that *guarantees* the canonical form
//! once constructed, so identifiers taken from API payloads or command line arguments are
//! validated once at the boundary and can be embedded in request paths without further checks.
//!
//! ## Canonical form
//! - Length: 24
//! - Characters: `0-9` and `a-f` only
//!
//! Non-canonical values (uppercase, wrong length, non-hex) are rejected.

mod record_id;

pub use record_id::RecordId;

/// Error type for identifier operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
