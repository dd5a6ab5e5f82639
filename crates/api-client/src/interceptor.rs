//! Request/response interceptors.
//!
//! An [`InterceptorChain`] runs every request hook first to last before the request is sent,
//! and every response hook last to first once the response headers arrive, so the first
//! interceptor sees the request first and the response last.

use crate::{ClientError, ClientResult};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A hook around every request an [`ApiClient`](crate::ApiClient) sends.
pub trait Interceptor: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Inspects or amends an outgoing request. An error aborts the request.
    fn on_request(&self, _request: &mut Request) -> ClientResult<()> {
        Ok(())
    }

    /// Inspects a response before its body is read. An error fails the call.
    fn on_response(&self, _response: &Response) -> ClientResult<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.interceptors.iter().map(|i| i.name()))
            .finish()
    }
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor to the end of the chain.
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn apply_request(&self, request: &mut Request) -> ClientResult<()> {
        self.interceptors
            .iter()
            .try_for_each(|interceptor| interceptor.on_request(request))
    }

    pub fn apply_response(&self, response: &Response) -> ClientResult<()> {
        self.interceptors
            .iter()
            .rev()
            .try_for_each(|interceptor| interceptor.on_response(response))
    }
}

/// Holds the current access token.
///
/// Shared between the code that signs in (and stores the token) and [`BearerAuth`], which
/// reads it on every request.
#[derive(Debug, Default)]
pub struct TokenStore {
    token: RwLock<Option<String>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Adds `Authorization: Bearer <token>` when a token is present.
///
/// Requests without a token are sent unauthenticated; the server decides whether to refuse
/// them.
pub struct BearerAuth {
    tokens: Arc<TokenStore>,
}

impl BearerAuth {
    pub fn new(tokens: Arc<TokenStore>) -> Self {
        Self { tokens }
    }
}

impl Interceptor for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn on_request(&self, request: &mut Request) -> ClientResult<()> {
        let Some(token) = self.tokens.get() else {
            return Ok(());
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::InvalidHeader("access token is not a valid header value".into()))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }

    fn on_response(&self, response: &Response) -> ClientResult<()> {
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %response.url(), "access token missing or rejected");
        }
        Ok(())
    }
}

/// Logs every request and the status it came back with.
#[derive(Debug, Default)]
pub struct RequestTracing;

impl Interceptor for RequestTracing {
    fn name(&self) -> &'static str {
        "request-tracing"
    }

    fn on_request(&self, request: &mut Request) -> ClientResult<()> {
        tracing::debug!(method = %request.method(), path = request.url().path(), "sending request");
        Ok(())
    }

    fn on_response(&self, response: &Response) -> ClientResult<()> {
        let status = response.status();
        if status.is_success() {
            tracing::debug!(path = response.url().path(), status = status.as_u16(), "response");
        } else {
            tracing::warn!(path = response.url().path(), status = status.as_u16(), "error response");
        }
        Ok(())
    }
}

/// Sets a fixed header on every request.
#[derive(Debug)]
pub struct StaticHeader {
    name: HeaderName,
    value: HeaderValue,
}

impl StaticHeader {
    pub fn new(name: &str, value: &str) -> ClientResult<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ClientError::InvalidHeader(format!("'{name}' is not a valid header name")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ClientError::InvalidHeader(format!("invalid value for header '{name}'")))?;
        Ok(Self { name, value })
    }
}

impl Interceptor for StaticHeader {
    fn name(&self) -> &'static str {
        "static-header"
    }

    fn on_request(&self, request: &mut Request) -> ClientResult<()> {
        request
            .headers_mut()
            .insert(self.name.clone(), self.value.clone());
        Ok(())
    }
}
