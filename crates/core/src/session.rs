//! Edit session: the commit/cancel state machine around one record.
//!
//! ```text
//! Viewing --begin_edit--> Editing --begin_submit--> Submitting
//!    ^                      |  ^                       |
//!    +-------cancel---------+  +-------failure---------+
//!    ^                                                 |
//!    +-------------------success-----------------------+
//! ```
//!
//! The session owns a [`DraftStore`] and is the only thing that replaces the committed record.
//! Submitting sends a sanitized deep copy of the draft, so edits made to the draft while a
//! save is in flight never leak into the payload.

use crate::draft::DraftStore;
use crate::edit_window::{is_record_editable, remaining};
use crate::editor::{self, EditOp};
use crate::sanitize::sanitize_all;
use crate::store::{Clock, RecordStore};
use crate::{CoreError, CoreResult, EditPolicy, StoreResult};
use chrono::{DateTime, Duration, Utc};
use records::{Record, RecordId};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditState {
    Viewing,
    Editing,
    Submitting,
}

/// A sanitized, validated payload waiting for persistence.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSubmission<R> {
    target: Option<RecordId>,
    payload: R,
}

impl<R: Record> PendingSubmission<R> {
    /// Identifier to update, `None` when the record is being created.
    pub fn target(&self) -> Option<&RecordId> {
        self.target.as_ref()
    }

    pub fn payload(&self) -> &R {
        &self.payload
    }
}

pub struct EditSession<R: Record, S> {
    store: Arc<S>,
    window: Option<Duration>,
    drafts: DraftStore<R>,
    state: EditState,
    clock: Clock,
}

impl<R: Record, S: RecordStore> EditSession<R, S> {
    /// Creates a session viewing `committed`, or an empty session for a record not yet created.
    ///
    /// The edit window for `R` is taken from `policy` once, here.
    pub fn new(store: Arc<S>, policy: &EditPolicy, committed: Option<R>) -> Self {
        Self {
            store,
            window: policy.window_for(R::KIND),
            drafts: DraftStore::new(committed),
            state: EditState::Viewing,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the clock used for edit-window checks.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn committed(&self) -> Option<&R> {
        self.drafts.committed()
    }

    pub fn draft(&self) -> Option<&R> {
        self.drafts.draft()
    }

    /// The committed record while viewing, the draft otherwise.
    pub fn current(&self) -> Option<&R> {
        match self.state {
            EditState::Viewing => self.drafts.committed(),
            EditState::Editing | EditState::Submitting => self.drafts.draft(),
        }
    }

    pub fn window(&self) -> Option<Duration> {
        self.window
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Whether the committed record may still be edited right now.
    ///
    /// Records never saved, and kinds without an edit window, are always editable.
    pub fn can_edit(&self) -> bool {
        match (self.window, self.drafts.committed()) {
            (Some(window), Some(record)) if !record.is_new() => {
                is_record_editable(record, window, self.now())
            }
            _ => true,
        }
    }

    /// Time left in the edit window, `None` when unrestricted or already closed.
    pub fn time_remaining(&self) -> Option<Duration> {
        let window = self.window?;
        let record = self.drafts.committed()?;
        remaining(record.created_at(), window, self.now())
    }

    fn ensure_window_open(&self) -> CoreResult<()> {
        if self.can_edit() {
            return Ok(());
        }
        let id = self
            .drafts
            .committed()
            .and_then(Record::id)
            .map(ToString::to_string)
            .unwrap_or_default();
        tracing::info!(kind = %R::KIND, %id, "edit window closed");
        Err(CoreError::EditWindowClosed { kind: R::KIND, id })
    }

    /// Viewing -> Editing. Opens a draft cloned from the committed record.
    pub fn begin_edit(&mut self) -> CoreResult<&mut R> {
        match self.state {
            EditState::Viewing => {}
            EditState::Editing => return Err(CoreError::AlreadyEditing),
            EditState::Submitting => return Err(CoreError::SubmitInProgress),
        }
        self.ensure_window_open()?;

        self.state = EditState::Editing;
        tracing::info!(kind = %R::KIND, "editing started");
        Ok(self.drafts.begin_edit())
    }

    /// Editing -> Viewing. Discards the draft.
    pub fn cancel(&mut self) -> CoreResult<()> {
        match self.state {
            EditState::Editing => {
                self.drafts.cancel_edit();
                self.state = EditState::Viewing;
                tracing::info!(kind = %R::KIND, "editing cancelled");
                Ok(())
            }
            EditState::Viewing => Err(CoreError::NotEditing),
            EditState::Submitting => Err(CoreError::SubmitInProgress),
        }
    }

    /// Editing -> Submitting.
    ///
    /// Sanitizes a copy of the draft, validates it and re-checks the edit window. On error the
    /// session stays in Editing with the draft untouched.
    pub fn begin_submit(&mut self) -> CoreResult<PendingSubmission<R>> {
        match self.state {
            EditState::Editing => {}
            EditState::Viewing => return Err(CoreError::NotEditing),
            EditState::Submitting => return Err(CoreError::SubmitInProgress),
        }
        let draft = self.drafts.draft().ok_or(CoreError::NotEditing)?;

        // Issue paths index the draft's rows, so validate before blank rows are dropped.
        let issues = draft.validate();
        if !issues.is_empty() {
            return Err(CoreError::Validation(issues));
        }
        self.ensure_window_open()?;
        let payload = sanitize_all(draft);

        let target = self.drafts.committed().and_then(Record::id).cloned();
        self.state = EditState::Submitting;
        tracing::info!(kind = %R::KIND, update = target.is_some(), "submitting");
        Ok(PendingSubmission { target, payload })
    }

    /// Completes a submission started with [`begin_submit`](Self::begin_submit).
    ///
    /// Success installs the stored record and returns to Viewing. Failure returns to Editing
    /// with the draft kept as it is.
    pub fn finish_submit(&mut self, result: StoreResult<R>) -> CoreResult<&R> {
        if self.state != EditState::Submitting {
            return Err(CoreError::NotSubmitting);
        }
        match result {
            Ok(record) => {
                self.state = EditState::Viewing;
                tracing::info!(kind = %R::KIND, id = ?record.id().map(ToString::to_string), "saved");
                Ok(self.drafts.commit(record))
            }
            Err(source) => {
                self.state = EditState::Editing;
                tracing::warn!(kind = %R::KIND, error = %source, "save failed, draft kept");
                Err(CoreError::Persistence {
                    kind: R::KIND,
                    source,
                })
            }
        }
    }

    /// Submitting -> Editing without a result, for callers that dropped an in-flight save.
    pub fn abort_submit(&mut self) -> CoreResult<()> {
        if self.state != EditState::Submitting {
            return Err(CoreError::NotSubmitting);
        }
        self.state = EditState::Editing;
        tracing::info!(kind = %R::KIND, "submission abandoned");
        Ok(())
    }

    /// Sanitizes, validates and saves the draft through the store.
    ///
    /// Creates the record when it has never been saved, updates it otherwise.
    pub async fn submit(&mut self) -> CoreResult<&R> {
        let pending = self.begin_submit()?;
        let result = match pending.target() {
            Some(id) => self.store.update(id, pending.payload()).await,
            None => self.store.create(pending.payload()).await,
        };
        self.finish_submit(result)
    }

    /// Replaces the committed record after an external refresh. An open draft is re-cloned
    /// from it.
    pub fn refresh(&mut self, record: R) -> CoreResult<()> {
        if self.state == EditState::Submitting {
            return Err(CoreError::SubmitInProgress);
        }
        self.drafts.replace_committed(record);
        tracing::debug!(kind = %R::KIND, "committed record refreshed");
        Ok(())
    }

    /// Fetches the committed record again from the store.
    pub async fn reload(&mut self) -> CoreResult<&R> {
        if self.state == EditState::Submitting {
            return Err(CoreError::SubmitInProgress);
        }
        let id = self
            .drafts
            .committed()
            .and_then(Record::id)
            .cloned()
            .ok_or_else(|| CoreError::InvalidInput(format!("{} has not been saved yet", R::KIND)))?;

        let record = self
            .store
            .fetch::<R>(&id)
            .await
            .map_err(|source| CoreError::Persistence {
                kind: R::KIND,
                source,
            })?;
        self.refresh(record)?;
        self.drafts.committed().ok_or(CoreError::NotEditing)
    }

    fn draft_for_edit(&mut self) -> CoreResult<&mut R> {
        if self.state == EditState::Viewing {
            return Err(CoreError::NotEditing);
        }
        self.drafts.draft_mut().ok_or(CoreError::NotEditing)
    }

    pub fn add_entry(&mut self, field: &str) -> CoreResult<usize> {
        editor::add_entry(self.draft_for_edit()?, field)
    }

    pub fn remove_entry(&mut self, field: &str, index: usize) -> CoreResult<bool> {
        editor::remove_entry(self.draft_for_edit()?, field, index)
    }

    pub fn update_field(
        &mut self,
        field: &str,
        index: Option<usize>,
        key: &str,
        value: &str,
    ) -> CoreResult<()> {
        editor::update_field(self.draft_for_edit()?, field, index, key, value)
    }

    pub fn set_field(&mut self, path: &str, value: &str) -> CoreResult<()> {
        editor::set_field(self.draft_for_edit()?, path, value)
    }

    pub fn apply(&mut self, op: &EditOp) -> CoreResult<()> {
        op.apply(self.draft_for_edit()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use crate::StoreError;
    use chrono::TimeZone;
    use records::{FeedbackRecord, PatientRecord, PrescriptionRecord, RecordKind};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn clock_at(at: DateTime<Utc>) -> Clock {
        Arc::new(move || at)
    }

    fn saved_patient(store: &MemoryRecordStore) -> PatientRecord {
        let mut record = PatientRecord::default();
        record.set_scalar("firstName", "Ada").unwrap();
        record.set_scalar("lastName", "Okafor").unwrap();
        record.created_at = Some(t0());
        store.insert(&record).unwrap()
    }

    fn patient_session(
        store: &Arc<MemoryRecordStore>,
    ) -> EditSession<PatientRecord, MemoryRecordStore> {
        let committed = saved_patient(store);
        EditSession::new(store.clone(), &EditPolicy::default(), Some(committed))
    }

    #[tokio::test]
    async fn add_fill_and_submit_drops_blank_rows() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut session = patient_session(&store);

        session.begin_edit().unwrap();
        let first = session.add_entry("allergies").unwrap();
        session
            .update_field("allergies", Some(first), "allergenName", "Penicillin")
            .unwrap();
        session
            .update_field("allergies", Some(first), "manifestation", "rash")
            .unwrap();
        session.add_entry("allergies").unwrap();

        let saved = session.submit().await.unwrap().clone();
        assert_eq!(session.state(), EditState::Viewing);
        assert!(session.draft().is_none());
        assert_eq!(saved.allergies.len(), 1);
        assert_eq!(saved.allergies[0].allergen_name.as_deref(), Some("Penicillin"));

        let id = saved.id.clone().unwrap();
        let stored = store.stored_value(RecordKind::Patient, &id).unwrap();
        assert_eq!(stored["allergies"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn cancel_discards_draft_and_keeps_committed() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut session = patient_session(&store);
        let before = session.committed().cloned();

        session.begin_edit().unwrap();
        session.set_field("firstName", "Grace").unwrap();
        session.add_entry("pastConditions").unwrap();
        session.cancel().unwrap();

        assert_eq!(session.state(), EditState::Viewing);
        assert_eq!(session.committed().cloned(), before);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn failed_submit_keeps_draft_and_returns_to_editing() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut session = patient_session(&store);

        session.begin_edit().unwrap();
        session.set_field("contact.phone", "555-0100").unwrap();
        let draft_before = session.draft().cloned();
        store
            .fail_next(StoreError::Status {
                status: 503,
                message: "unavailable".into(),
            })
            .unwrap();

        let err = session.submit().await.expect_err("store fails");
        assert!(matches!(err, CoreError::Persistence { .. }));
        assert_eq!(session.state(), EditState::Editing);
        assert_eq!(session.draft().cloned(), draft_before);
        assert_eq!(session.committed().unwrap().contact.phone, None);

        let saved = session.submit().await.unwrap();
        assert_eq!(saved.contact.phone.as_deref(), Some("555-0100"));
    }

    #[tokio::test]
    async fn remove_out_of_range_then_submit_changes_nothing() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut session = patient_session(&store);

        session.begin_edit().unwrap();
        assert!(!session.remove_entry("allergies", 7).unwrap());
        let saved = session.submit().await.unwrap().clone();

        assert_eq!(saved.scalar("firstName").as_deref(), Some("Ada"));
        assert!(saved.allergies.is_empty());
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn second_submit_is_rejected_while_in_flight() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut session = patient_session(&store);
        session.begin_edit().unwrap();

        let pending = session.begin_submit().unwrap();
        assert!(matches!(
            session.begin_submit(),
            Err(CoreError::SubmitInProgress)
        ));
        assert!(matches!(session.cancel(), Err(CoreError::SubmitInProgress)));

        let id = pending.target().cloned().unwrap();
        let result = store.update(&id, pending.payload()).await;
        session.finish_submit(result).unwrap();
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn typing_during_submit_does_not_leak_into_payload() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut session = patient_session(&store);
        session.begin_edit().unwrap();
        session.set_field("gender", "female").unwrap();

        let pending = session.begin_submit().unwrap();
        session.set_field("gender", "other").unwrap();
        assert_eq!(pending.payload().gender.as_deref(), Some("female"));

        let err = session
            .finish_submit(Err(StoreError::Transport("connection reset".into())))
            .expect_err("failure");
        assert!(matches!(err, CoreError::Persistence { .. }));
        assert_eq!(session.draft().unwrap().gender.as_deref(), Some("other"));
    }

    #[tokio::test]
    async fn abort_submit_returns_to_editing() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut session = patient_session(&store);
        session.begin_edit().unwrap();
        session.begin_submit().unwrap();

        session.abort_submit().unwrap();
        assert_eq!(session.state(), EditState::Editing);
        assert!(matches!(session.abort_submit(), Err(CoreError::NotSubmitting)));
    }

    #[test]
    fn edits_require_an_open_draft() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut session = patient_session(&store);
        assert!(matches!(session.add_entry("allergies"), Err(CoreError::NotEditing)));
        assert!(matches!(session.set_field("firstName", "X"), Err(CoreError::NotEditing)));
        assert!(matches!(session.cancel(), Err(CoreError::NotEditing)));
        assert!(matches!(session.begin_submit(), Err(CoreError::NotEditing)));

        session.begin_edit().unwrap();
        assert!(matches!(session.begin_edit(), Err(CoreError::AlreadyEditing)));
    }

    #[test]
    fn validation_failure_keeps_editing() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut session = patient_session(&store);
        session.begin_edit().unwrap();
        session.set_field("lastName", "  ").unwrap();

        let err = session.begin_submit().expect_err("last name required");
        match err {
            CoreError::Validation(issues) => assert_eq!(issues[0].field, "lastName"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session.state(), EditState::Editing);
    }

    #[test]
    fn validation_issue_indexes_the_draft_row() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut session: EditSession<PrescriptionRecord, _> =
            EditSession::new(store, &EditPolicy::default(), None);
        session.begin_edit().unwrap();
        session
            .set_field("patientId", "65f1c2a9e4b0a1b2c3d4e500")
            .unwrap();
        session.add_entry("medications").unwrap();
        let second = session.add_entry("medications").unwrap();
        session
            .update_field("medications", Some(second), "dosage", "250mg")
            .unwrap();

        let err = session.begin_submit().expect_err("drug name required");
        match err {
            CoreError::Validation(issues) => {
                let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
                assert_eq!(fields, vec!["medications.1.drugName"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session.state(), EditState::Editing);
    }

    #[test]
    fn prescription_window_gates_editing() {
        let store = Arc::new(MemoryRecordStore::new());
        let prescription = store
            .insert(&PrescriptionRecord {
                date_issued: Some(t0()),
                ..Default::default()
            })
            .unwrap();
        let policy = EditPolicy::default();

        let open = EditSession::new(store.clone(), &policy, Some(prescription.clone()))
            .with_clock(clock_at(t0() + Duration::minutes(59)));
        assert!(open.can_edit());
        assert_eq!(open.time_remaining(), Some(Duration::minutes(1)));

        let mut closed = EditSession::new(store.clone(), &policy, Some(prescription))
            .with_clock(clock_at(t0() + Duration::minutes(61)));
        assert!(!closed.can_edit());
        assert!(matches!(
            closed.begin_edit(),
            Err(CoreError::EditWindowClosed {
                kind: RecordKind::Prescription,
                ..
            })
        ));
        assert_eq!(closed.state(), EditState::Viewing);
    }

    #[test]
    fn saved_record_without_timestamp_fails_closed() {
        let store = Arc::new(MemoryRecordStore::new());
        let feedback = store.insert(&FeedbackRecord::default()).unwrap();
        let mut session = EditSession::new(store, &EditPolicy::default(), Some(feedback));
        assert!(matches!(
            session.begin_edit(),
            Err(CoreError::EditWindowClosed { .. })
        ));
    }

    #[tokio::test]
    async fn new_record_is_created_from_empty_template() {
        let store = Arc::new(MemoryRecordStore::with_clock(clock_at(t0())));
        let mut session: EditSession<FeedbackRecord, _> =
            EditSession::new(store.clone(), &EditPolicy::default(), None);
        assert!(session.can_edit());

        assert_eq!(session.begin_edit().unwrap(), &mut FeedbackRecord::default());
        session.set_field("rating", "4").unwrap();
        let created = session.submit().await.unwrap();

        assert!(created.id.is_some());
        assert_eq!(created.created_at, Some(t0()));
        assert_eq!(created.rating, Some(4));
    }

    #[tokio::test]
    async fn window_closing_mid_edit_blocks_submit() {
        let store = Arc::new(MemoryRecordStore::new());
        let feedback = store
            .insert(&FeedbackRecord {
                rating: Some(3),
                created_at: Some(t0()),
                ..Default::default()
            })
            .unwrap();
        let now = Arc::new(std::sync::Mutex::new(t0()));
        let clock_now = now.clone();
        let clock: Clock = Arc::new(move || *clock_now.lock().unwrap());

        let mut session = EditSession::new(store.clone(), &EditPolicy::default(), Some(feedback))
            .with_clock(clock);
        session.begin_edit().unwrap();
        session.set_field("rating", "5").unwrap();

        *now.lock().unwrap() = t0() + Duration::minutes(11);
        assert!(matches!(
            session.submit().await,
            Err(CoreError::EditWindowClosed { .. })
        ));
        assert_eq!(session.state(), EditState::Editing);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn refresh_reclones_open_draft_and_reload_fetches() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut session = patient_session(&store);
        session.begin_edit().unwrap();
        session.set_field("firstName", "Grace").unwrap();

        let reloaded = session.reload().await.unwrap().clone();
        assert_eq!(reloaded.scalar("firstName").as_deref(), Some("Ada"));
        assert_eq!(session.draft(), Some(&reloaded));
        assert_eq!(session.state(), EditState::Editing);
    }
}
