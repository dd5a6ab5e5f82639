//! REST implementation of the persistence collaborator.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | create    | `POST {base}/{collection}` |
//! | update    | `PUT {base}/{collection}/{id}` |
//! | fetch     | `GET {base}/{collection}/{id}` |
//!
//! Bodies in both directions go through the record's wire mapping.

use crate::{ApiClient, ClientError};
use clinic_core::{RecordStore, StoreError, StoreResult};
use records::{Record, RecordId, RecordKind};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct HttpRecordStore {
    client: Arc<ApiClient>,
}

impl HttpRecordStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

fn item_path(kind: RecordKind, id: &RecordId) -> String {
    format!("{}/{}", kind.collection_path(), id)
}

fn store_error(kind: RecordKind, id: Option<&RecordId>, error: ClientError) -> StoreError {
    match (error, id) {
        (ClientError::Status { status: 404, .. }, Some(id)) => StoreError::NotFound {
            kind,
            id: id.to_string(),
        },
        (ClientError::Status { status, message }, _) => StoreError::Status { status, message },
        (ClientError::Records(e), _) => StoreError::Records(e),
        (other, _) => StoreError::Transport(Box::new(other)),
    }
}

impl RecordStore for HttpRecordStore {
    async fn create<R: Record>(&self, record: &R) -> StoreResult<R> {
        let body = record.to_wire_value()?;
        let value = self
            .client
            .post_json(R::KIND.collection_path(), &body)
            .await
            .map_err(|e| store_error(R::KIND, None, e))?;
        let created = R::from_wire_value(value)?;
        tracing::debug!(kind = %R::KIND, id = ?created.id().map(ToString::to_string), "created");
        Ok(created)
    }

    async fn update<R: Record>(&self, id: &RecordId, record: &R) -> StoreResult<R> {
        let body = record.to_wire_value()?;
        let value = self
            .client
            .put_json(&item_path(R::KIND, id), &body)
            .await
            .map_err(|e| store_error(R::KIND, Some(id), e))?;
        tracing::debug!(kind = %R::KIND, %id, "updated");
        Ok(R::from_wire_value(value)?)
    }

    async fn fetch<R: Record>(&self, id: &RecordId) -> StoreResult<R> {
        let value = self
            .client
            .get_json(&item_path(R::KIND, id))
            .await
            .map_err(|e| store_error(R::KIND, Some(id), e))?;
        Ok(R::from_wire_value(value)?)
    }
}
