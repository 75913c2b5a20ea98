use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::provider::DEFAULT_BASE_URL;

const DEFAULT_MODEL_PATH: &str = "models/api_features/model.json";
const DEFAULT_SCALER_PATH: &str = "models/api_features/scaler.json";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_WINDOW_DAYS: i64 = 7;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    ApiFootball,
    /// Canned offline data, for demos and local development.
    Fake,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub upcoming_window_days: i64,
    pub provider: ProviderKind,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("API_FOOTBALL_KEY").context("API_FOOTBALL_KEY is not set")?;
        let api_base_url = get("API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model_path = get("MODEL_PATH").unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string());
        let scaler_path = get("SCALER_PATH").unwrap_or_else(|| DEFAULT_SCALER_PATH.to_string());
        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid BIND_ADDR {bind_raw:?}"))?;
        let upcoming_window_days = get("UPCOMING_WINDOW_DAYS")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_WINDOW_DAYS)
            .clamp(1, 14);
        let http_timeout_secs = get("HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .clamp(1, 120);
        let provider = match get("PROVIDER").map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("api") | Some("api-football") => ProviderKind::ApiFootball,
            Some("fake") | Some("demo") => ProviderKind::Fake,
            Some(other) => anyhow::bail!("unknown PROVIDER {other:?} (expected api or fake)"),
        };

        Ok(Self {
            api_key,
            api_base_url,
            model_path: PathBuf::from(model_path),
            scaler_path: PathBuf::from(scaler_path),
            bind_addr,
            upcoming_window_days,
            provider,
            http_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn api_key_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("API_FOOTBALL_KEY"));
        assert!(config_from(&[("API_FOOTBALL_KEY", "   ")]).is_err());
    }

    #[test]
    fn defaults_apply() {
        let cfg = config_from(&[("API_FOOTBALL_KEY", "abc")]).unwrap();
        assert_eq!(cfg.api_key, "abc");
        assert_eq!(cfg.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.upcoming_window_days, 7);
        assert_eq!(cfg.provider, ProviderKind::ApiFootball);
        assert_eq!(cfg.bind_addr.port(), 5000);
    }

    #[test]
    fn overrides_are_clamped_and_validated() {
        let cfg = config_from(&[
            ("API_FOOTBALL_KEY", "abc"),
            ("UPCOMING_WINDOW_DAYS", "90"),
            ("HTTP_TIMEOUT_SECS", "0"),
            ("PROVIDER", "Fake"),
        ])
        .unwrap();
        assert_eq!(cfg.upcoming_window_days, 14);
        assert_eq!(cfg.http_timeout_secs, 1);
        assert_eq!(cfg.provider, ProviderKind::Fake);

        assert!(config_from(&[("API_FOOTBALL_KEY", "abc"), ("PROVIDER", "other")]).is_err());
        assert!(config_from(&[("API_FOOTBALL_KEY", "abc"), ("BIND_ADDR", "nope")]).is_err());
    }
}
