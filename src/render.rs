//! Plain-text rendering of a record, driven by its schema.

use chrono::{DateTime, Duration, Utc};
use records::{FieldKind, Record};
use std::fmt::Write;

const UNSET: &str = "-";

/// Renders every schema field of `record`, one per line, with collections numbered by position.
pub fn render_record<R: Record>(record: &R) -> String {
    let mut out = String::new();
    let schema = R::schema();

    let id = record.id().map(ToString::to_string);
    let _ = writeln!(out, "{} {}", schema.kind, id.as_deref().unwrap_or("(unsaved)"));

    for spec in schema.fields {
        match spec.kind {
            FieldKind::Scalar => {
                let value = record.scalar(spec.name);
                let _ = writeln!(out, "{}: {}", spec.label, value.as_deref().unwrap_or(UNSET));
            }
            FieldKind::Nested(subfields) => {
                let _ = writeln!(out, "{}:", spec.label);
                let nested = record.nested(spec.name);
                for sub in subfields {
                    let value = nested.and_then(|n| n.get(sub.name));
                    let _ = writeln!(out, "  {}: {}", sub.label, value.unwrap_or(UNSET));
                }
            }
            FieldKind::Collection(subfields) => {
                let Some(collection) = record.collection(spec.name) else {
                    continue;
                };
                let _ = writeln!(out, "{} ({}):", spec.label, collection.len());
                for index in 0..collection.len() {
                    let Some(entry) = collection.entry(index) else {
                        continue;
                    };
                    let cells: Vec<String> = subfields
                        .iter()
                        .map(|sub| format!("{}: {}", sub.label, entry.get(sub.name).unwrap_or(UNSET)))
                        .collect();
                    let _ = writeln!(out, "  [{index}] {}", cells.join(", "));
                }
            }
        }
    }

    let created = record.created_at().map(|ts| ts.to_rfc3339());
    let _ = writeln!(out, "Created: {}", created.as_deref().unwrap_or(UNSET));
    out
}

/// One-line summary of an edit window.
pub fn describe_window(
    window: Option<Duration>,
    created_at: Option<DateTime<Utc>>,
    remaining: Option<Duration>,
) -> String {
    match (window, created_at, remaining) {
        (None, _, _) => "editable: no edit window applies".to_string(),
        (Some(_), None, _) => "locked: creation time unknown".to_string(),
        (Some(window), Some(_), Some(left)) => format!(
            "editable: {}m {}s left of {}m",
            left.num_minutes(),
            left.num_seconds() % 60,
            window.num_minutes()
        ),
        (Some(window), Some(_), None) => {
            format!("locked: edit window of {}m has closed", window.num_minutes())
        }
    }
}
