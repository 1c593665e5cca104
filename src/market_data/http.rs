//! Request plumbing shared by the provider adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use super::AdapterError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = concat!("pricebook/", env!("CARGO_PKG_VERSION"));

/// Longest slice of a non-JSON error body kept for diagnostics.
const MAX_DETAIL_CHARS: usize = 100;

/// Build the client adapters share, with a fixed per-request timeout.
pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to build HTTP client; using defaults");
            Client::new()
        })
}

/// Send `request` once and return the body of a 2xx response.
/// Transport errors are stripped of their URL: some providers carry the API
/// key in the path or query string.
pub(crate) async fn fetch_body(request: RequestBuilder) -> Result<String, AdapterError> {
    let response = request.send().await.map_err(without_url)?;
    let status = response.status();
    let body = response.text().await.map_err(without_url)?;

    if !status.is_success() {
        return Err(AdapterError::Status {
            status,
            detail: error_detail(&body),
        });
    }

    Ok(body)
}

fn without_url(error: reqwest::Error) -> AdapterError {
    AdapterError::Transport(error.without_url())
}

/// Pull a readable message out of an error body.
///
/// Providers put it under different keys; anything that isn't JSON is truncated.
fn error_detail(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message", "msg", "error-type", "description"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
        return Value::Object(map).to_string();
    }
    body.chars().take(MAX_DETAIL_CHARS).collect()
}

pub(crate) fn trim_base_url(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}
