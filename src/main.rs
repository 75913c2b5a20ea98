use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;
use tracing_subscriber::EnvFilter;

use matchday_predictor::config::{AppConfig, ProviderKind};
use matchday_predictor::fake_provider::demo_provider;
use matchday_predictor::fixtures::DEFAULT_LEAGUES;
use matchday_predictor::http_client;
use matchday_predictor::predictor::Predictor;
use matchday_predictor::provider::{ApiFootballClient, FootballProvider};
use matchday_predictor::web::{AppState, router};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("matchday_predictor=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    http_client::set_request_timeout(config.http_timeout_secs);

    let predictor = Predictor::load(&config.model_path, &config.scaler_path);
    let provider: Arc<dyn FootballProvider> = match config.provider {
        ProviderKind::ApiFootball => Arc::new(ApiFootballClient::new(
            config.api_base_url.clone(),
            config.api_key.clone(),
        )),
        ProviderKind::Fake => {
            info!("using offline demo provider");
            Arc::new(demo_provider(Local::now().date_naive(), &DEFAULT_LEAGUES))
        }
    };

    let state = AppState {
        provider,
        predictor: Arc::new(predictor),
        leagues: Arc::new(DEFAULT_LEAGUES.to_vec()),
        window_days: config.upcoming_window_days,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "matchday predictor listening");
    axum::serve(listener, router(state))
        .await
        .context("server error")?;
    Ok(())
}
