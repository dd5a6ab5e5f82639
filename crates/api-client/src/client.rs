//! JSON client for the clinic REST API.

use crate::{ClientError, ClientResult, InterceptorChain};
use clinic_core::CoreConfig;
use reqwest::Method;
use serde_json::Value;

/// Sends JSON requests to `{base_url}/{path}` through an interceptor chain.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    chain: InterceptorChain,
}

impl ApiClient {
    /// Creates a client for the configured API base URL.
    pub fn new(config: &CoreConfig, chain: InterceptorChain) -> Self {
        Self::with_http_client(config, reqwest::Client::new(), chain)
    }

    /// Creates a client reusing an existing `reqwest::Client` (connection pool, timeouts).
    pub fn with_http_client(
        config: &CoreConfig,
        http: reqwest::Client,
        chain: InterceptorChain,
    ) -> Self {
        Self {
            base_url: config.api_base_url().to_string(),
            http,
            chain,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> ClientResult<Value> {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let mut request = builder.build()?;
        self.chain.apply_request(&mut request)?;

        let response = self.http.execute(request).await?;
        self.chain.apply_response(&response)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        Ok(response.json::<Value>().await?)
    }

    pub async fn get_json(&self, path: &str) -> ClientResult<Value> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> ClientResult<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> ClientResult<Value> {
        self.send(Method::PUT, path, Some(body)).await
    }
}

/// Extracts a readable message from an error body.
///
/// The API answers errors with `{ "message": ... }` or `{ "error": ... }`; anything else is
/// passed through as text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_owned))
        })
        .unwrap_or_else(|| body.trim().to_string())
}
