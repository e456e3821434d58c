//! HTTP clients for the Watson Assistant, Discovery and NLU v1 APIs.
//!
//! All three services share the same conventions: a `version` query
//! parameter on every call and HTTP basic auth with the literal user
//! `apikey`.

mod assistant;
mod discovery;
mod nlu;

pub use assistant::AssistantClient;
pub use discovery::DiscoveryClient;
pub use nlu::NluClient;

use reqwest::{RequestBuilder, Response};

use crate::error::{GatewayError, GatewayResult};

/// Base URL, API version and credentials of one service.
#[derive(Clone)]
pub(crate) struct Endpoint {
    base_url: String,
    version: String,
    api_key: String,
    client: reqwest::Client,
}

impl Endpoint {
    pub(crate) fn new(base_url: &str, version: &str, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            version: version.to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Build the full URL for a path under the service root.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: RequestBuilder) -> GatewayResult<RequestBuilder> {
        if self.api_key.is_empty() {
            return Err(GatewayError::Config(
                "API key is not set for this service".into(),
            ));
        }
        Ok(req
            .basic_auth("apikey", Some(&self.api_key))
            .query(&[("version", self.version.as_str())]))
    }

    pub(crate) fn get(&self, path: &str) -> GatewayResult<RequestBuilder> {
        self.authorize(self.client.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> GatewayResult<RequestBuilder> {
        self.authorize(self.client.post(self.url(path)))
    }
}

/// Send a request and turn non-2xx replies into `GatewayError::Status`.
pub(crate) async fn send(req: RequestBuilder) -> GatewayResult<Response> {
    let resp = req.send().await?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        code: status.as_u16(),
        message: error_message(&body),
    })
}

/// Watson error bodies look like `{"error": "...", "code": 400}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
