//! Persistence collaborator.
//!
//! Sessions hand sanitized records to a [`RecordStore`] and install whatever record it returns.
//! The HTTP implementation lives in the `api-client` crate; [`MemoryRecordStore`] here behaves
//! like the REST server closely enough for tests and offline demos.

use crate::{StoreError, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use records::{Record, RecordId, RecordKind, RecordsError};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

/// Creates, updates and fetches records on behalf of an edit session.
///
/// Every method returns the record as the store now holds it, including server-assigned
/// fields such as the identifier and timestamps.
pub trait RecordStore: Send + Sync {
    fn create<R: Record>(&self, record: &R) -> impl Future<Output = StoreResult<R>> + Send;

    fn update<R: Record>(
        &self,
        id: &RecordId,
        record: &R,
    ) -> impl Future<Output = StoreResult<R>> + Send;

    fn fetch<R: Record>(&self, id: &RecordId) -> impl Future<Output = StoreResult<R>> + Send;
}

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Default)]
struct MemoryState {
    records: HashMap<(RecordKind, RecordId), Value>,
    fail_next: Option<StoreError>,
    calls: usize,
}

/// In-memory [`RecordStore`] holding wire JSON values, keyed by kind and id.
///
/// Like the REST server it assigns identifiers, stamps the creation timestamp on create (which
/// later updates cannot change) and stamps `updatedAt` on every write.
pub struct MemoryRecordStore {
    state: Mutex<MemoryState>,
    clock: Clock,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Uses `clock` for server-side timestamps.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            clock,
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Transport("memory store lock poisoned".into()))
    }

    fn now(&self) -> Value {
        Value::String((self.clock)().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Seeds the store with an existing record, keeping its timestamps as given.
    ///
    /// A record without an identifier is assigned one. Returns the stored record.
    pub fn insert<R: Record>(&self, record: &R) -> StoreResult<R> {
        let id = record.id().cloned().unwrap_or_else(RecordId::generate);
        let mut value = record.to_wire_value()?;
        object_mut(&mut value)?.insert("_id".into(), Value::String(id.to_string()));

        let stored = R::from_wire_value(value.clone())?;
        self.lock()?.records.insert((R::KIND, id), value);
        Ok(stored)
    }

    /// Makes the next store call fail with `error`.
    pub fn fail_next(&self, error: StoreError) -> StoreResult<()> {
        self.lock()?.fail_next = Some(error);
        Ok(())
    }

    /// Raw wire value currently held for a record.
    pub fn stored_value(&self, kind: RecordKind, id: &RecordId) -> Option<Value> {
        self.lock()
            .ok()
            .and_then(|state| state.records.get(&(kind, id.clone())).cloned())
    }

    /// Number of create, update and fetch calls received so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.lock().map(|state| state.calls).unwrap_or_default()
    }

    fn begin_call(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock()?;
        state.calls += 1;
        match state.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }

    fn create_now<R: Record>(&self, record: &R) -> StoreResult<R> {
        let mut state = self.begin_call()?;
        let id = RecordId::generate();
        let now = self.now();

        let mut value = record.to_wire_value()?;
        let object = object_mut(&mut value)?;
        object.insert("_id".into(), Value::String(id.to_string()));
        object.insert(R::KIND.created_at_key().into(), now.clone());
        object.insert("updatedAt".into(), now);

        let created = R::from_wire_value(value.clone())?;
        state.records.insert((R::KIND, id), value);
        Ok(created)
    }

    fn update_now<R: Record>(&self, id: &RecordId, record: &R) -> StoreResult<R> {
        let mut state = self.begin_call()?;
        let key = (R::KIND, id.clone());
        let created_at = state
            .records
            .get(&key)
            .ok_or_else(|| not_found(R::KIND, id))?
            .get(R::KIND.created_at_key())
            .cloned();

        let mut value = record.to_wire_value()?;
        let object = object_mut(&mut value)?;
        object.insert("_id".into(), Value::String(id.to_string()));
        match created_at {
            Some(created_at) => object.insert(R::KIND.created_at_key().into(), created_at),
            None => object.remove(R::KIND.created_at_key()),
        };
        object.insert("updatedAt".into(), self.now());

        let updated = R::from_wire_value(value.clone())?;
        state.records.insert(key, value);
        Ok(updated)
    }

    fn fetch_now<R: Record>(&self, id: &RecordId) -> StoreResult<R> {
        let state = self.begin_call()?;
        let value = state
            .records
            .get(&(R::KIND, id.clone()))
            .cloned()
            .ok_or_else(|| not_found(R::KIND, id))?;
        Ok(R::from_wire_value(value)?)
    }
}

impl RecordStore for MemoryRecordStore {
    async fn create<R: Record>(&self, record: &R) -> StoreResult<R> {
        self.create_now(record)
    }

    async fn update<R: Record>(&self, id: &RecordId, record: &R) -> StoreResult<R> {
        self.update_now(id, record)
    }

    async fn fetch<R: Record>(&self, id: &RecordId) -> StoreResult<R> {
        self.fetch_now(id)
    }
}

fn not_found(kind: RecordKind, id: &RecordId) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}

fn object_mut(value: &mut Value) -> StoreResult<&mut serde_json::Map<String, Value>> {
    value.as_object_mut().ok_or_else(|| {
        StoreError::Records(RecordsError::Translation(
            "record did not serialize to a JSON object".into(),
        ))
    })
}
