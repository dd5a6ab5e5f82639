//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Edit sessions never read process-wide environment variables
//! themselves; the `*_from_env_value` helpers take the raw value so callers decide where it
//! comes from.

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_FEEDBACK_EDIT_WINDOW_SECS, DEFAULT_PRESCRIPTION_EDIT_WINDOW_SECS,
};
use crate::validation::validate_api_base_url;
use crate::{CoreError, CoreResult};
use chrono::Duration;
use records::RecordKind;
use std::collections::HashMap;

/// How long after creation each record kind may still be edited.
///
/// Kinds without an entry are editable indefinitely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditPolicy {
    windows: HashMap<RecordKind, Duration>,
}

impl Default for EditPolicy {
    /// Prescriptions for one hour and feedback for ten minutes after creation.
    fn default() -> Self {
        Self::unrestricted()
            .with_window(
                RecordKind::Prescription,
                Duration::seconds(DEFAULT_PRESCRIPTION_EDIT_WINDOW_SECS),
            )
            .with_window(
                RecordKind::Feedback,
                Duration::seconds(DEFAULT_FEEDBACK_EDIT_WINDOW_SECS),
            )
    }
}

impl EditPolicy {
    /// A policy with no edit windows at all.
    pub fn unrestricted() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }

    pub fn with_window(mut self, kind: RecordKind, window: Duration) -> Self {
        self.windows.insert(kind, window);
        self
    }

    pub fn without_window(mut self, kind: RecordKind) -> Self {
        self.windows.remove(&kind);
        self
    }

    pub fn window_for(&self, kind: RecordKind) -> Option<Duration> {
        self.windows.get(&kind).copied()
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    api_base_url: String,
    edit_policy: EditPolicy,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// A trailing `/` on the base URL is dropped so request paths can be appended uniformly.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the base URL fails validation.
    pub fn new(api_base_url: impl Into<String>, edit_policy: EditPolicy) -> CoreResult<Self> {
        let api_base_url = api_base_url.into();
        let api_base_url = api_base_url.trim().trim_end_matches('/').to_string();
        validate_api_base_url(&api_base_url)?;

        Ok(Self {
            api_base_url,
            edit_policy,
        })
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn edit_policy(&self) -> &EditPolicy {
        &self.edit_policy
    }
}

/// Resolve the API base URL from an optional value, falling back to the default.
pub fn api_base_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Parse an edit window (whole seconds) from an optional value.
///
/// If `value` is `None` or empty/whitespace, returns `default`. Zero is allowed and closes the
/// window immediately after creation.
///
/// # Errors
///
/// Returns `CoreError::InvalidInput` if the value is not a non-negative whole number.
pub fn edit_window_from_env_value(value: Option<String>, default: Duration) -> CoreResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u32>()
            .map(|secs| Duration::seconds(i64::from(secs)))
            .map_err(|_| {
                CoreError::InvalidInput(format!(
                    "edit window must be a whole number of seconds, got '{raw}'"
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_windows_prescriptions_and_feedback() {
        let policy = EditPolicy::default();
        assert_eq!(
            policy.window_for(RecordKind::Prescription),
            Some(Duration::hours(1))
        );
        assert_eq!(
            policy.window_for(RecordKind::Feedback),
            Some(Duration::minutes(10))
        );
        assert_eq!(policy.window_for(RecordKind::Patient), None);
        assert_eq!(policy.window_for(RecordKind::Encounter), None);
    }

    #[test]
    fn policy_windows_can_be_overridden_and_removed() {
        let policy = EditPolicy::default()
            .with_window(RecordKind::Encounter, Duration::days(1))
            .without_window(RecordKind::Feedback);
        assert_eq!(
            policy.window_for(RecordKind::Encounter),
            Some(Duration::days(1))
        );
        assert_eq!(policy.window_for(RecordKind::Feedback), None);
    }

    #[test]
    fn config_trims_trailing_slash() {
        let cfg = CoreConfig::new("http://localhost:5000/api/", EditPolicy::default())
            .expect("valid config");
        assert_eq!(cfg.api_base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn config_rejects_invalid_url() {
        let err = CoreConfig::new("localhost", EditPolicy::default()).expect_err("invalid url");
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn api_base_url_defaults_when_blank() {
        assert_eq!(api_base_url_from_env_value(None), DEFAULT_API_URL);
        assert_eq!(api_base_url_from_env_value(Some("  ".into())), DEFAULT_API_URL);
        assert_eq!(
            api_base_url_from_env_value(Some(" https://clinic.example ".into())),
            "https://clinic.example"
        );
    }

    #[test]
    fn edit_window_parses_seconds() {
        let default = Duration::minutes(10);
        assert_eq!(edit_window_from_env_value(None, default).unwrap(), default);
        assert_eq!(
            edit_window_from_env_value(Some("".into()), default).unwrap(),
            default
        );
        assert_eq!(
            edit_window_from_env_value(Some(" 90 ".into()), default).unwrap(),
            Duration::seconds(90)
        );
        assert_eq!(
            edit_window_from_env_value(Some("0".into()), default).unwrap(),
            Duration::zero()
        );
        assert!(edit_window_from_env_value(Some("-5".into()), default).is_err());
        assert!(edit_window_from_env_value(Some("1h".into()), default).is_err());
    }
}
