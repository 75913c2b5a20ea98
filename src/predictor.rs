use std::fmt;
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::error::PredictError;
use crate::features::{FeatureVector, build_features};
use crate::fixtures::fetch_fixture_date;
use crate::model::{IdentityScaler, ScoreModel, StandardScaler, Transform};
use crate::provider::FootballProvider;
use crate::stats::{aggregate_team_stats, fetch_team_goals};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionRequest {
    pub fixture_id: u64,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub league_id: u32,
    pub season: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scoreline {
    pub home: u32,
    pub away: u32,
}

impl fmt::Display for Scoreline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.home, self.away)
    }
}

pub struct Predictor {
    model: Option<ScoreModel>,
    scaler: Box<dyn Transform>,
}

impl Predictor {
    pub fn new(model: Option<ScoreModel>, scaler: Box<dyn Transform>) -> Self {
        Self { model, scaler }
    }

    /// Loads both artifacts. A missing model leaves predictions disabled; a
    /// missing scaler falls back to the identity transform.
    pub fn load(model_path: &Path, scaler_path: &Path) -> Self {
        let model = match ScoreModel::load(model_path) {
            Ok(model) => {
                info!(path = %model_path.display(), "model loaded");
                Some(model)
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "error loading model");
                None
            }
        };
        let scaler: Box<dyn Transform> = match StandardScaler::load(scaler_path) {
            Ok(scaler) => {
                info!(path = %scaler_path.display(), "scaler loaded");
                Box::new(scaler)
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "error loading scaler, using identity");
                Box::new(IdentityScaler)
            }
        };
        Self::new(model, scaler)
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn predict_match(
        &self,
        provider: &dyn FootballProvider,
        req: &PredictionRequest,
    ) -> Result<Scoreline, PredictError> {
        if self.model.is_none() {
            return Err(PredictError::ModelUnavailable);
        }
        let features = match_features(provider, req).ok_or(PredictError::FixtureNotFound)?;
        self.predict_features(&features)
    }

    pub fn predict_features(&self, features: &FeatureVector) -> Result<Scoreline, PredictError> {
        let model = self.model.as_ref().ok_or(PredictError::ModelUnavailable)?;
        let scaled = self.scaler.transform(features.values());
        debug!(features = ?features.named(), "features sent to model");

        let [home, away] = model.predict(&scaled);
        if !home.is_finite() || !away.is_finite() {
            return Err(PredictError::Internal("model produced a non-finite score".into()));
        }
        Ok(Scoreline {
            home: to_goals(home),
            away: to_goals(away),
        })
    }
}

/// Scores are truncated toward zero; negative outputs become 0.
fn to_goals(raw: f64) -> u32 {
    if raw > 0.0 { raw.trunc() as u32 } else { 0 }
}

/// Builds the model input for a fixture, `None` when the fixture is unknown.
pub fn match_features(
    provider: &dyn FootballProvider,
    req: &PredictionRequest,
) -> Option<FeatureVector> {
    let Some(cutoff) = fetch_fixture_date(provider, req.fixture_id) else {
        debug!(fixture_id = req.fixture_id, "fixture not found");
        return None;
    };

    let home = aggregate_team_stats(provider, req.home_team_id, req.league_id, req.season, &cutoff);
    let away = aggregate_team_stats(provider, req.away_team_id, req.league_id, req.season, &cutoff);
    let home_goals = fetch_team_goals(provider, req.home_team_id, req.league_id, req.season);
    let away_goals = fetch_team_goals(provider, req.away_team_id, req.league_id, req.season);

    Some(build_features(req.league_id, &home, &away, home_goals, away_goals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COUNT;

    fn constant_model(home: f64, away: f64) -> ScoreModel {
        ScoreModel::Linear {
            coefficients: vec![vec![0.0; FEATURE_COUNT]; 2],
            intercepts: vec![home, away],
        }
    }

    #[test]
    fn scores_truncate_and_clamp() {
        assert_eq!(to_goals(2.97), 2);
        assert_eq!(to_goals(0.4), 0);
        assert_eq!(to_goals(-1.6), 0);
    }

    #[test]
    fn scoreline_renders_with_dash() {
        assert_eq!(Scoreline { home: 3, away: 1 }.to_string(), "3 - 1");
    }

    #[test]
    fn missing_model_short_circuits() {
        let predictor = Predictor::new(None, Box::new(IdentityScaler));
        let err = predictor
            .predict_features(&FeatureVector::default())
            .unwrap_err();
        assert_eq!(err, PredictError::ModelUnavailable);
        assert!(!predictor.model_loaded());
    }

    #[test]
    fn predicts_from_features() {
        let predictor = Predictor::new(Some(constant_model(1.8, 0.9)), Box::new(IdentityScaler));
        let score = predictor.predict_features(&FeatureVector::default()).unwrap();
        assert_eq!(score, Scoreline { home: 1, away: 0 });
    }

    #[test]
    fn non_finite_output_is_internal_error() {
        let predictor =
            Predictor::new(Some(constant_model(f64::NAN, 1.0)), Box::new(IdentityScaler));
        assert!(matches!(
            predictor.predict_features(&FeatureVector::default()),
            Err(PredictError::Internal(_))
        ));
    }
}
