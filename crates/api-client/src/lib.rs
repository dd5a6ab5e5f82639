//! # API Client
//!
//! HTTP access to the clinic REST API.
//!
//! Contains:
//! - [`ApiClient`], a JSON client over `reqwest` with an injected interceptor pipeline
//! - interceptors for bearer authentication, request tracing and fixed headers
//! - [`HttpRecordStore`], the REST implementation of `clinic_core::RecordStore`
//!
//! The client is constructed once and passed to whatever needs it; nothing here is global.

pub mod client;
pub mod interceptor;
pub mod store;

pub use client::ApiClient;
pub use interceptor::{
    BearerAuth, Interceptor, InterceptorChain, RequestTracing, StaticHeader, TokenStore,
};
pub use store::HttpRecordStore;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("request rejected by {interceptor}: {reason}")]
    Rejected {
        interceptor: &'static str,
        reason: String,
    },

    #[error("record translation failed: {0}")]
    Records(#[from] records::RecordsError),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
