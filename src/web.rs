use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::error::PredictError;
use crate::fixtures::{League, UpcomingFixture, fetch_upcoming_fixtures};
use crate::predictor::{PredictionRequest, Predictor};
use crate::provider::FootballProvider;

pub const REQUIRED_KEYS: [&str; 5] = [
    "fixture_id",
    "home_team_id",
    "away_team_id",
    "league_id",
    "season",
];

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn FootballProvider>,
    pub predictor: Arc<Predictor>,
    pub leagues: Arc<Vec<League>>,
    pub window_days: i64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(state)
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        // Pipeline failures answer 200 with an error payload, like a prediction would.
        let status = if self.is_bad_request() {
            StatusCode::BAD_REQUEST
        } else if matches!(self, PredictError::Internal(_)) {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn index(State(state): State<AppState>) -> Response {
    let today = Local::now().date_naive();
    let provider = Arc::clone(&state.provider);
    let leagues = Arc::clone(&state.leagues);
    let days = state.window_days;

    let fetched = tokio::task::spawn_blocking(move || {
        fetch_upcoming_fixtures(provider.as_ref(), &leagues, today, days)
    })
    .await;
    match fetched {
        Ok(fixtures) => {
            info!(count = fixtures.len(), "rendering fixture list");
            Html(render_index(&fixtures, today, days)).into_response()
        }
        Err(err) => {
            error!(error = %err, "fixture listing task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to load fixtures").into_response()
        }
    }
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response();
        }
    };
    let req = match parse_prediction_request(&body) {
        Ok(req) => req,
        Err(err) => return err.into_response(),
    };

    let provider = Arc::clone(&state.provider);
    let predictor = Arc::clone(&state.predictor);
    let outcome =
        tokio::task::spawn_blocking(move || predictor.predict_match(provider.as_ref(), &req))
            .await
            .unwrap_or_else(|err| Err(PredictError::Internal(err.to_string())));

    match outcome {
        Ok(score) => {
            info!(fixture_id = req.fixture_id, score = %score, "prediction served");
            Json(json!({ "predicted_score": score.to_string() })).into_response()
        }
        Err(err) => {
            warn!(fixture_id = req.fixture_id, error = %err, "prediction failed");
            err.into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": state.predictor.model_loaded(),
    }))
}

/// Validates a `/predict` body. Missing keys are reported together, in the
/// order of [`REQUIRED_KEYS`].
pub fn parse_prediction_request(body: &Value) -> Result<PredictionRequest, PredictError> {
    let Some(obj) = body.as_object() else {
        return Err(PredictError::MissingKeys(REQUIRED_KEYS.to_vec()));
    };
    let missing: Vec<&'static str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !obj.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(PredictError::MissingKeys(missing));
    }

    let season = integer_value(&obj["season"])
        .and_then(|v| i32::try_from(v).ok())
        .ok_or(PredictError::InvalidSeason)?;
    let id = |key: &'static str| {
        integer_value(&obj[key])
            .and_then(|v| u64::try_from(v).ok())
            .ok_or(PredictError::InvalidId(key))
    };
    let team_or_league = |key: &'static str| {
        id(key).and_then(|v| u32::try_from(v).map_err(|_| PredictError::InvalidId(key)))
    };

    Ok(PredictionRequest {
        fixture_id: id("fixture_id")?,
        home_team_id: team_or_league("home_team_id")?,
        away_team_id: team_or_league("away_team_id")?,
        league_id: team_or_league("league_id")?,
        season,
    })
}

// Integers, floats (truncated) and numeric strings are accepted.
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

const PAGE_HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Matchday predictor</title>
<style>
body { font-family: system-ui, sans-serif; margin: 2rem; background: #f6f7f9; color: #1d2330; }
table { border-collapse: collapse; width: 100%; background: #fff; }
th, td { padding: .5rem .75rem; border-bottom: 1px solid #e3e6eb; text-align: left; }
td.logo img { height: 24px; vertical-align: middle; }
.result { font-weight: 600; min-width: 6rem; }
.empty { padding: 2rem; background: #fff; }
</style>
</head>
<body>
"#;

const PAGE_SCRIPT: &str = r#"<script>
document.querySelectorAll("button[data-fixture]").forEach(function (btn) {
  btn.addEventListener("click", function () {
    var out = document.getElementById("result-" + btn.dataset.fixture);
    out.textContent = "...";
    fetch("/predict", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({
        fixture_id: Number(btn.dataset.fixture),
        home_team_id: Number(btn.dataset.home),
        away_team_id: Number(btn.dataset.away),
        league_id: Number(btn.dataset.league),
        season: Number(btn.dataset.season)
      })
    })
      .then(function (r) { return r.json(); })
      .then(function (data) { out.textContent = data.predicted_score || data.error; })
      .catch(function (err) { out.textContent = String(err); });
  });
});
</script>
</body>
</html>
"#;

pub fn render_index(fixtures: &[UpcomingFixture], today: NaiveDate, days: i64) -> String {
    let mut html = String::from(PAGE_HEAD);
    html.push_str(&format!(
        "<h1>Upcoming fixtures</h1>\n<p>Next {days} days from {}</p>\n",
        today.format("%Y-%m-%d")
    ));

    if fixtures.is_empty() {
        html.push_str("<p class=\"empty\">No upcoming fixtures found.</p>\n");
        html.push_str(PAGE_SCRIPT);
        return html;
    }

    html.push_str(
        "<table>\n<thead><tr><th>Date</th><th>League</th><th></th><th>Home</th>\
         <th></th><th>Away</th><th></th><th>Prediction</th></tr></thead>\n<tbody>\n",
    );
    for f in fixtures {
        html.push_str(&format!(
            "<tr><td>{date}</td><td>{league}</td>\
             <td class=\"logo\">{home_logo}</td><td>{home}</td>\
             <td class=\"logo\">{away_logo}</td><td>{away}</td>\
             <td><button data-fixture=\"{fixture}\" data-home=\"{home_id}\" data-away=\"{away_id}\" \
             data-league=\"{league_id}\" data-season=\"{season}\">Predict</button></td>\
             <td class=\"result\" id=\"result-{fixture}\"></td></tr>\n",
            date = escape_html(&f.date),
            league = escape_html(&f.league),
            home_logo = logo_tag(&f.home_logo),
            home = escape_html(&f.home_team),
            away_logo = logo_tag(&f.away_logo),
            away = escape_html(&f.away_team),
            fixture = f.fixture_id,
            home_id = f.home_team_id,
            away_id = f.away_team_id,
            league_id = f.league_id,
            season = f.season,
        ));
    }
    html.push_str("</tbody>\n</table>\n");
    html.push_str(PAGE_SCRIPT);
    html
}

fn logo_tag(url: &str) -> String {
    if url.is_empty() {
        String::new()
    } else {
        format!("<img src=\"{}\" alt=\"\">", escape_html(url))
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
