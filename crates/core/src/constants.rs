//! Constants used throughout the clinic core crate.

/// Default REST API base URL when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Default edit window for prescriptions, in seconds (one hour).
pub const DEFAULT_PRESCRIPTION_EDIT_WINDOW_SECS: i64 = 60 * 60;

/// Default edit window for feedback, in seconds (ten minutes).
pub const DEFAULT_FEEDBACK_EDIT_WINDOW_SECS: i64 = 10 * 60;

/// Environment variable overriding the prescription edit window (seconds).
pub const PRESCRIPTION_EDIT_WINDOW_ENV: &str = "CLINIC_PRESCRIPTION_EDIT_WINDOW_SECS";

/// Environment variable overriding the feedback edit window (seconds).
pub const FEEDBACK_EDIT_WINDOW_ENV: &str = "CLINIC_FEEDBACK_EDIT_WINDOW_SECS";

/// Environment variable holding the REST API base URL.
pub const API_URL_ENV: &str = "CLINIC_API_URL";

/// Environment variable holding the bearer token for the REST API.
pub const API_TOKEN_ENV: &str = "CLINIC_API_TOKEN";
