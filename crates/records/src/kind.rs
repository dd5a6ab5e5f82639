//! Closed set of record kinds the editor knows about.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RecordsError;

/// The kinds of record that can be edited.
///
/// This enum is deliberately *closed*: every kind has a REST collection path and a schema, and
/// adding one means adding both.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Patient,
    Encounter,
    Prescription,
    Feedback,
}

impl RecordKind {
    /// Every record kind, in display order.
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Patient,
        RecordKind::Encounter,
        RecordKind::Prescription,
        RecordKind::Feedback,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Encounter => "encounter",
            Self::Prescription => "prescription",
            Self::Feedback => "feedback",
        }
    }

    /// Path segment of the REST collection holding records of this kind.
    pub const fn collection_path(self) -> &'static str {
        match self {
            Self::Patient => "patients",
            Self::Encounter => "encounters",
            Self::Prescription => "prescriptions",
            Self::Feedback => "feedback",
        }
    }

    /// Wire key of the timestamp the server stamps when a record of this kind is created.
    pub const fn created_at_key(self) -> &'static str {
        match self {
            Self::Prescription => "dateIssued",
            _ => "createdAt",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = RecordsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.collection_path() == s)
            .ok_or_else(|| RecordsError::InvalidInput(format!("unknown record kind '{s}'")))
    }
}
