//! Implementation of the canonical record identifier.

use crate::{IdError, IdResult};
use std::{fmt, str::FromStr};

/// Number of hexadecimal characters in a canonical record identifier.
const RECORD_ID_LEN: usize = 24;

/// A server-assigned record identifier in canonical form (24 lowercase hex characters).
///
/// # When to use this type
/// Use this wrapper whenever you are:
/// - Accepting an identifier from *outside* the core (API payload, CLI argument), or
/// - Building a request path for a specific record.
///
/// # Construction
/// - [`RecordId::parse`] validates an externally supplied identifier.
/// - [`RecordId::generate`] mints a fresh random identifier, for stores that assign their own.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Mints a new random identifier in canonical form.
    ///
    /// The value is taken from the first 12 bytes of a version 4 UUID, so it is random rather
    /// than time-ordered.
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self(uuid[..RECORD_ID_LEN].to_owned())
    }

    /// Validates and wraps an identifier that must already be in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` is not exactly 24 lowercase hex characters.
    pub fn parse(input: &str) -> IdResult<Self> {
        if Self::is_canonical(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(IdError::InvalidInput(format!(
            "record id must be {RECORD_ID_LEN} lowercase hex characters, got: '{input}'"
        )))
    }

    /// Returns true if `input` is in canonical form.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == RECORD_ID_LEN
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_canonical_id() {
        let id = RecordId::generate();
        assert_eq!(id.as_str().len(), 24);
        assert!(RecordId::is_canonical(id.as_str()));
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(RecordId::generate(), RecordId::generate());
    }

    #[test]
    fn test_parse_valid_canonical_id() {
        let id = RecordId::parse("65f1c2a9e4b0a1b2c3d4e5f6").expect("canonical id");
        assert_eq!(id.to_string(), "65f1c2a9e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn test_parse_rejects_uppercase() {
        let err = RecordId::parse("65F1C2A9E4B0A1B2C3D4E5F6").expect_err("uppercase rejected");
        assert!(matches!(err, IdError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(RecordId::parse("65f1c2a9").is_err());
        assert!(RecordId::parse("550e8400e29b41d4a716446655440000").is_err());
    }

    #[test]
    fn test_parse_rejects_non_hex_and_path_characters() {
        assert!(RecordId::parse("65f1c2a9e4b0a1b2c3d4e5g6").is_err());
        assert!(RecordId::parse("../../patients/00000000").is_err());
    }

    #[test]
    fn test_from_str_matches_parse() {
        let parsed: RecordId = "000000000000000000000001".parse().expect("valid id");
        assert_eq!(parsed.as_str(), "000000000000000000000001");
    }

    #[test]
    fn test_serde_rejects_invalid_ids() {
        let ok: RecordId = serde_json::from_str("\"65f1c2a9e4b0a1b2c3d4e5f6\"").expect("valid");
        assert_eq!(ok.as_str(), "65f1c2a9e4b0a1b2c3d4e5f6");
        assert!(serde_json::from_str::<RecordId>("\"nope\"").is_err());
    }
}
