use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::http_client::http_client;

pub const API_KEY_HEADER: &str = "x-apisports-key";
pub const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";

/// Query parameters as sent to the provider, in request order.
pub type Params<'a> = [(&'a str, String)];

/// A source of API-Football shaped JSON payloads.
pub trait FootballProvider: Send + Sync {
    fn fetch(&self, endpoint: &str, params: &Params<'_>) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct ApiFootballClient {
    base_url: String,
    api_key: String,
}

impl ApiFootballClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

impl FootballProvider for ApiFootballClient {
    fn fetch(&self, endpoint: &str, params: &Params<'_>) -> Result<Value> {
        let client = http_client()?;
        let url = self.endpoint_url(endpoint);
        debug!(%url, ?params, "provider request");

        let resp = client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(params)
            .send()
            .with_context(|| format!("{endpoint} request failed"))?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("http {}: {}", status, body));
        }

        let value = parse_payload(&body).with_context(|| format!("invalid {endpoint} json"))?;
        if let Some(errors) = provider_errors(&value) {
            warn!(endpoint, %errors, "provider reported errors");
        }
        debug!(
            endpoint,
            results = value.get("results").and_then(serde_json::Value::as_u64).unwrap_or(0),
            "provider response"
        );
        Ok(value)
    }
}

pub fn parse_payload(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed).context("payload is not json")
}

/// The provider answers 200 with a non-empty `errors` field (array or object)
/// for bad keys, rate limits and invalid parameters.
pub fn provider_errors(value: &Value) -> Option<&Value> {
    let errors = value.get("errors")?;
    let present = match errors {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::String(s) => !s.trim().is_empty(),
        _ => false,
    };
    present.then_some(errors)
}

pub fn response_items(value: &Value) -> &[Value] {
    value
        .get("response")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_error_containers_are_not_errors() {
        assert!(provider_errors(&json!({"errors": []})).is_none());
        assert!(provider_errors(&json!({"errors": {}})).is_none());
        assert!(provider_errors(&json!({"response": []})).is_none());
        assert!(provider_errors(&json!({"errors": {"token": "bad key"}})).is_some());
        assert!(provider_errors(&json!({"errors": ["rate limit"]})).is_some());
    }

    #[test]
    fn response_items_tolerates_missing_array() {
        assert!(response_items(&Value::Null).is_empty());
        assert!(response_items(&json!({"response": {}})).is_empty());
        assert_eq!(response_items(&json!({"response": [1, 2]})).len(), 2);
    }

    #[test]
    fn null_payload_is_null() {
        assert_eq!(parse_payload(" null ").unwrap(), Value::Null);
        assert!(parse_payload("<html>").is_err());
    }

    #[test]
    fn endpoint_url_joins_cleanly() {
        let client = ApiFootballClient::new("https://example.test/", "k");
        assert_eq!(
            client.endpoint_url("/fixtures/statistics"),
            "https://example.test/fixtures/statistics"
        );
    }
}
