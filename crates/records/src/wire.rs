//! Shared wire translation helpers.

use crate::{RecordId, RecordsError, RecordsResult};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Decodes a wire struct from a JSON value.
///
/// This uses `serde_path_to_error` to surface a best-effort "path" (e.g. `allergies[0].allergenName`)
/// to the failing field when the JSON does not match the wire schema.
pub(crate) fn decode<W: DeserializeOwned>(value: Value, what: &str) -> RecordsResult<W> {
    match serde_path_to_error::deserialize::<_, W>(value) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            Err(RecordsError::Translation(format!(
                "{what} schema mismatch at {path}: {source}"
            )))
        }
    }
}

pub(crate) fn encode<W: Serialize>(wire: &W, what: &str) -> RecordsResult<Value> {
    serde_json::to_value(wire)
        .map_err(|e| RecordsError::Translation(format!("Failed to serialise {what}: {e}")))
}

pub(crate) fn parse_id(raw: Option<String>) -> RecordsResult<Option<RecordId>> {
    raw.map(|id| RecordId::parse(&id)).transpose().map_err(Into::into)
}

fn timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a server-assigned timestamp; an unparseable value is logged and treated as absent.
pub(crate) fn parse_timestamp(raw: Option<&str>, field: &str) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let parsed = timestamp(raw);
    if parsed.is_none() {
        tracing::warn!(field, value = raw, "ignoring unparseable timestamp");
    }
    parsed
}

pub(crate) fn render_timestamp(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parses a calendar date given either as `YYYY-MM-DD` or as a full timestamp.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| timestamp(raw).map(|dt| dt.date_naive()))
}

pub(crate) fn render_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

/// Parses an optional wire date. A present value that is not a date is a translation error,
/// so it is never dropped from the next save.
pub(crate) fn parse_wire_date(raw: Option<&str>, field: &str) -> RecordsResult<Option<NaiveDate>> {
    raw.map(|value| {
        parse_date(value).ok_or_else(|| {
            RecordsError::Translation(format!("{field} is not a valid date: '{value}'"))
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(1990, 1, 15).unwrap();
        assert_eq!(parse_date("1990-01-15"), Some(expected));
        assert_eq!(parse_date("1990-01-15T00:00:00.000Z"), Some(expected));
        assert_eq!(parse_date("15/01/1990"), None);
    }

    #[test]
    fn parse_timestamp_treats_garbage_as_absent() {
        assert!(parse_timestamp(Some("2026-03-01T10:00:00.000Z"), "createdAt").is_some());
        assert!(parse_timestamp(Some("yesterday"), "createdAt").is_none());
        assert!(parse_timestamp(None, "createdAt").is_none());
    }

    #[test]
    fn parse_wire_date_rejects_present_garbage() {
        assert_eq!(parse_wire_date(None, "dateOfBirth").unwrap(), None);
        assert_eq!(
            parse_wire_date(Some("1990-01-15"), "dateOfBirth").unwrap(),
            NaiveDate::from_ymd_opt(1990, 1, 15)
        );
        let err = parse_wire_date(Some("15/01/1990"), "dateOfBirth").expect_err("not a date");
        assert!(err.to_string().contains("dateOfBirth"), "{err}");
    }

    #[test]
    fn render_timestamp_uses_millis_and_z() {
        let ts = parse_timestamp(Some("2026-03-01T10:00:00Z"), "createdAt");
        assert_eq!(
            render_timestamp(ts).as_deref(),
            Some("2026-03-01T10:00:00.000Z")
        );
    }
}
