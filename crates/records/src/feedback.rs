//! Patient feedback record.

use crate::fields::{CollectionField, FieldError, FieldIssue, SubRecord};
use crate::schema::{missing_required, FieldSpec, RecordSchema};
use crate::wire;
use crate::{Record, RecordId, RecordKind, RecordsResult};
use chrono::{DateTime, Utc};
use clinic_types::optional_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;

/// Feedback left by a patient about their care.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub id: Option<RecordId>,
    pub patient_id: Option<RecordId>,
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

static FEEDBACK_SCHEMA: RecordSchema = RecordSchema {
    kind: RecordKind::Feedback,
    fields: &[
        FieldSpec::scalar("patientId", "Patient"),
        FieldSpec::required("rating", "Rating"),
        FieldSpec::scalar("comment", "Comment"),
    ],
};

impl Record for FeedbackRecord {
    const KIND: RecordKind = RecordKind::Feedback;

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn schema() -> &'static RecordSchema {
        &FEEDBACK_SCHEMA
    }

    fn scalar(&self, key: &str) -> Option<String> {
        match key {
            "patientId" => self.patient_id.as_ref().map(ToString::to_string),
            "rating" => self.rating.map(|r| r.to_string()),
            "comment" => self.comment.clone(),
            _ => None,
        }
    }

    fn set_scalar(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        match key {
            "patientId" => {
                self.patient_id = optional_text(value)
                    .map(|raw| RecordId::parse(&raw))
                    .transpose()
                    .map_err(|e| FieldError::invalid(key, e.to_string()))?;
            }
            "rating" => {
                self.rating = match optional_text(value) {
                    Some(raw) => Some(parse_rating(&raw).ok_or_else(|| {
                        FieldError::invalid(
                            key,
                            format!("expected a whole number from {MIN_RATING} to {MAX_RATING}"),
                        )
                    })?),
                    None => None,
                }
            }
            "comment" => self.comment = optional_text(value),
            "_id" | "createdAt" => return Err(FieldError::read_only(key)),
            _ => return Err(FieldError::unknown("feedback", key)),
        }
        Ok(())
    }

    fn nested(&self, _name: &str) -> Option<&dyn SubRecord> {
        None
    }

    fn nested_mut(&mut self, _name: &str) -> Option<&mut dyn SubRecord> {
        None
    }

    fn collection(&self, _name: &str) -> Option<&dyn CollectionField> {
        None
    }

    fn collection_mut(&mut self, _name: &str) -> Option<&mut dyn CollectionField> {
        None
    }

    fn validate(&self) -> Vec<FieldIssue> {
        missing_required(self)
    }

    fn from_wire_value(value: Value) -> RecordsResult<Self> {
        let wire: FeedbackWire = wire::decode(value, "Feedback")?;
        Ok(Self {
            id: wire::parse_id(wire.id)?,
            patient_id: wire::parse_id(wire.patient_id)?,
            rating: wire.rating,
            comment: wire.comment,
            created_at: wire::parse_timestamp(wire.created_at.as_deref(), "createdAt"),
        })
    }

    fn to_wire_value(&self) -> RecordsResult<Value> {
        let wire = FeedbackWire {
            id: self.id.as_ref().map(ToString::to_string),
            patient_id: self.patient_id.as_ref().map(ToString::to_string),
            rating: self.rating,
            comment: self.comment.clone(),
            created_at: wire::render_timestamp(self.created_at),
        };
        wire::encode(&wire, "feedback")
    }
}

fn parse_rating(raw: &str) -> Option<u8> {
    raw.parse::<u8>()
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
}

/// Wire representation of a feedback entry.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackWire {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_accepts_one_to_five_only() {
        let mut feedback = FeedbackRecord::default();
        feedback.set_scalar("rating", " 4 ").unwrap();
        assert_eq!(feedback.rating, Some(4));
        for bad in ["0", "6", "4.5", "great"] {
            assert!(
                matches!(
                    feedback.set_scalar("rating", bad),
                    Err(FieldError::InvalidValue { .. })
                ),
                "{bad}"
            );
        }
        assert_eq!(feedback.rating, Some(4));
    }

    #[test]
    fn rating_is_required() {
        let issues = FeedbackRecord::default().validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "rating");
    }

    #[test]
    fn has_no_collections() {
        assert!(FeedbackRecord::schema().collection_names().is_empty());
    }

    #[test]
    fn parses_numeric_rating() {
        let feedback =
            FeedbackRecord::parse_json(r#"{ "rating": 5, "comment": "Lovely staff" }"#).unwrap();
        assert_eq!(feedback.rating, Some(5));
        assert_eq!(feedback.comment.as_deref(), Some("Lovely staff"));
    }
}
