//! Input validation utilities.
//!
//! This module contains functions for validating configuration inputs before they are used to
//! build requests.

use crate::{CoreError, CoreResult};

/// Validates that a REST API base URL is safe to prefix request paths with.
///
/// Rules:
/// - Rejects empty or whitespace-only strings
/// - Requires an `http://` or `https://` scheme
/// - Bounds the length to avoid pathological inputs
/// - Rejects whitespace, control characters, query strings and fragments, since paths are
///   appended directly to the base
///
/// # Errors
///
/// Returns a `CoreError::InvalidInput` if the URL is invalid.
pub fn validate_api_base_url(url: &str) -> CoreResult<()> {
    const MAX_URL_LEN: usize = 2048;

    if url.trim().is_empty() {
        return Err(CoreError::InvalidInput("API base URL cannot be empty".into()));
    }

    if url.len() > MAX_URL_LEN {
        return Err(CoreError::InvalidInput(format!(
            "API base URL exceeds maximum length of {} characters",
            MAX_URL_LEN
        )));
    }

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| {
            CoreError::InvalidInput("API base URL must start with http:// or https://".into())
        })?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(CoreError::InvalidInput(
            "API base URL must include a host".into(),
        ));
    }

    if !url.is_ascii() || url.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(CoreError::InvalidInput(
            "API base URL must be ASCII without whitespace".into(),
        ));
    }

    if url.contains('?') || url.contains('#') {
        return Err(CoreError::InvalidInput(
            "API base URL must not contain a query string or fragment".into(),
        ));
    }

    Ok(())
}
