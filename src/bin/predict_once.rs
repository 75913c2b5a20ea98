use anyhow::{Context, Result};
use chrono::Local;
use tracing_subscriber::EnvFilter;

use matchday_predictor::config::{AppConfig, ProviderKind};
use matchday_predictor::fake_provider::demo_provider;
use matchday_predictor::fixtures::DEFAULT_LEAGUES;
use matchday_predictor::http_client;
use matchday_predictor::predictor::{PredictionRequest, Predictor, match_features};
use matchday_predictor::provider::{ApiFootballClient, FootballProvider};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let req = PredictionRequest {
        fixture_id: required_arg(&args, "fixture")?,
        home_team_id: required_arg(&args, "home")?,
        away_team_id: required_arg(&args, "away")?,
        league_id: required_arg(&args, "league")?,
        season: required_arg(&args, "season")?,
    };
    let show_features = args.iter().any(|a| a == "--features");

    let config = AppConfig::from_env()?;
    http_client::set_request_timeout(config.http_timeout_secs);
    let provider: Box<dyn FootballProvider> = match config.provider {
        ProviderKind::ApiFootball => Box::new(ApiFootballClient::new(
            config.api_base_url.clone(),
            config.api_key.clone(),
        )),
        ProviderKind::Fake => Box::new(demo_provider(Local::now().date_naive(), &DEFAULT_LEAGUES)),
    };

    if show_features {
        match match_features(provider.as_ref(), &req) {
            Some(features) => {
                for (name, value) in features.named() {
                    println!("{name:>22} {value:.3}");
                }
            }
            None => println!("fixture {} not found", req.fixture_id),
        }
    }

    let predictor = Predictor::load(&config.model_path, &config.scaler_path);
    match predictor.predict_match(provider.as_ref(), &req) {
        Ok(score) => println!("Predicted score: {score}"),
        Err(err) => println!("Error: {err}"),
    }
    Ok(())
}

/// Accepts both `--name value` and `--name=value`.
fn required_arg<T: std::str::FromStr>(args: &[String], name: &str) -> Result<T> {
    let flag = format!("--{name}");
    let prefix = format!("--{name}=");
    let mut raw = None;
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            raw = Some(value.trim().to_string());
            break;
        }
        if *arg == flag {
            raw = args.get(idx + 1).map(|v| v.trim().to_string());
            break;
        }
    }
    let raw = raw
        .filter(|v| !v.is_empty())
        .with_context(|| format!("missing {flag} <value>"))?;
    raw.parse::<T>()
        .map_err(|_| anyhow::anyhow!("{flag} expects a number, got {raw:?}"))
}
