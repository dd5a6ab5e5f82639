//! # Clinic Core
//!
//! Core editing logic for clinic records.
//!
//! This crate holds the client-side editing workflow around one record at a time:
//! - a draft store separating the committed record from an independent working copy
//! - generic collection and nested-object edits dispatched on field names
//! - the time-windowed edit gate for kinds that lock shortly after creation
//! - the submission sanitizer that drops blank collection rows
//! - the edit session state machine that commits or cancels a draft
//!
//! **No transport concerns**: the REST client and its interceptors belong in `api-client`.
//! Persistence is reached through the [`RecordStore`] trait only.

pub mod config;
pub mod constants;
pub mod draft;
pub mod edit_window;
pub mod editor;
mod error;
pub mod sanitize;
pub mod session;
pub mod store;
pub mod validation;

pub use config::{CoreConfig, EditPolicy};
pub use draft::DraftStore;
pub use edit_window::{is_editable, is_record_editable, remaining};
pub use editor::{add_entry, remove_entry, set_field, update_field, EditOp};
pub use error::{CoreError, CoreResult, StoreError, StoreResult};
pub use sanitize::{sanitize, sanitize_all};
pub use session::{EditSession, EditState, PendingSubmission};
pub use store::{Clock, MemoryRecordStore, RecordStore};
