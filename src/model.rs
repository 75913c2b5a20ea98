//! Pre-trained scoreline model and its input scaler, both loaded from JSON
//! artifacts exported by the training pipeline.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::features::FEATURE_COUNT;

pub const OUTPUTS: usize = 2;

pub trait Transform: Send + Sync {
    fn transform(&self, x: &[f64]) -> Vec<f64>;
}

/// Stand-in used when no scaler artifact could be loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityScaler;

impl Transform for IdentityScaler {
    fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.to_vec()
    }
}

/// `(x - mean) / scale` per column. A zero scale leaves the column centred but
/// unscaled.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    #[serde(alias = "mean_")]
    pub mean: Vec<f64>,
    #[serde(alias = "scale_")]
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn from_json(raw: &str) -> Result<Self> {
        let scaler: Self = serde_json::from_str(raw).context("invalid scaler json")?;
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading scaler {}", path.display()))?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<()> {
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            bail!(
                "scaler expects {} columns, artifact has mean={} scale={}",
                FEATURE_COUNT,
                self.mean.len(),
                self.scale.len()
            );
        }
        Ok(())
    }
}

impl Transform for StandardScaler {
    fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(v, (m, s))| {
                let s = if *s == 0.0 { 1.0 } else { *s };
                (v - m) / s
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreModel {
    /// One weight row and intercept per output.
    Linear {
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
    /// Gradient-boosted trees: per output, a base score plus the sum of the
    /// leaf reached in every tree.
    TreeEnsemble {
        base_score: Vec<f64>,
        outputs: Vec<Vec<Tree>>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

impl Tree {
    fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            bail!("tree has no nodes");
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    bail!("node {idx} splits on unknown feature {feature}");
                }
                // Children must come after their parent, so evaluation always ends.
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        bail!("node {idx} has invalid child {child}");
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { leaf } => return *leaf,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    // Missing values follow the left branch.
                    let v = x.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if v.is_nan() || v < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

impl ScoreModel {
    pub fn from_json(raw: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(raw).context("invalid model json")?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading model {}", path.display()))?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Linear {
                coefficients,
                intercepts,
            } => {
                if coefficients.len() != OUTPUTS || intercepts.len() != OUTPUTS {
                    bail!("linear model must have {OUTPUTS} outputs");
                }
                if let Some(row) = coefficients.iter().find(|r| r.len() != FEATURE_COUNT) {
                    bail!(
                        "linear model expects {} coefficients per output, found {}",
                        FEATURE_COUNT,
                        row.len()
                    );
                }
            }
            Self::TreeEnsemble {
                base_score,
                outputs,
            } => {
                if base_score.len() != OUTPUTS || outputs.len() != OUTPUTS {
                    bail!("tree ensemble must have {OUTPUTS} outputs");
                }
                for (out, trees) in outputs.iter().enumerate() {
                    for (t, tree) in trees.iter().enumerate() {
                        tree.validate()
                            .with_context(|| format!("output {out} tree {t}"))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Raw (home, away) regression output for an already scaled row.
    pub fn predict(&self, x: &[f64]) -> [f64; OUTPUTS] {
        let mut out = [0.0; OUTPUTS];
        match self {
            Self::Linear {
                coefficients,
                intercepts,
            } => {
                for (slot, (row, b)) in out.iter_mut().zip(coefficients.iter().zip(intercepts)) {
                    *slot = b + row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
                }
            }
            Self::TreeEnsemble {
                base_score,
                outputs,
            } => {
                for (slot, (base, trees)) in out.iter_mut().zip(base_score.iter().zip(outputs)) {
                    *slot = base + trees.iter().map(|t| t.evaluate(x)).sum::<f64>();
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn linear_json(home_w0: f64, away_b: f64) -> String {
        let mut home = vec![0.0; FEATURE_COUNT];
        home[0] = home_w0;
        json!({
            "kind": "linear",
            "coefficients": [home, vec![0.0; FEATURE_COUNT]],
            "intercepts": [0.5, away_b]
        })
        .to_string()
    }

    #[test]
    fn linear_model_predicts() {
        let model = ScoreModel::from_json(&linear_json(2.0, 1.25)).unwrap();
        let mut x = vec![0.0; FEATURE_COUNT];
        x[0] = 1.0;
        assert_eq!(model.predict(&x), [2.5, 1.25]);
    }

    #[test]
    fn linear_model_rejects_wrong_width() {
        let raw = json!({
            "kind": "linear",
            "coefficients": [[1.0, 2.0], [3.0, 4.0]],
            "intercepts": [0.0, 0.0]
        })
        .to_string();
        assert!(ScoreModel::from_json(&raw).is_err());
    }

    #[test]
    fn tree_ensemble_sums_leaves() {
        let raw = json!({
            "kind": "tree_ensemble",
            "base_score": [1.0, 0.5],
            "outputs": [
                [
                    {"nodes": [
                        {"feature": 7, "threshold": 10.0, "left": 1, "right": 2},
                        {"leaf": -0.5},
                        {"leaf": 0.75}
                    ]},
                    {"nodes": [{"leaf": 0.25}]}
                ],
                []
            ]
        })
        .to_string();
        let model = ScoreModel::from_json(&raw).unwrap();
        let mut x = vec![0.0; FEATURE_COUNT];
        assert_eq!(model.predict(&x), [0.75, 0.5]);
        x[7] = 12.0;
        assert_eq!(model.predict(&x), [2.0, 0.5]);
    }

    #[test]
    fn tree_with_backward_edge_is_rejected() {
        let raw = json!({
            "kind": "tree_ensemble",
            "base_score": [0.0, 0.0],
            "outputs": [[{"nodes": [
                {"feature": 0, "threshold": 1.0, "left": 0, "right": 1},
                {"leaf": 1.0}
            ]}], []]
        })
        .to_string();
        assert!(ScoreModel::from_json(&raw).is_err());
    }

    #[test]
    fn scaler_standardises_and_guards_zero_scale() {
        let mut mean = vec![0.0; FEATURE_COUNT];
        let mut scale = vec![1.0; FEATURE_COUNT];
        mean[0] = 10.0;
        scale[0] = 2.0;
        mean[1] = 5.0;
        scale[1] = 0.0;
        let raw = json!({"mean_": mean, "scale_": scale}).to_string();
        let scaler = StandardScaler::from_json(&raw).unwrap();

        let mut x = vec![0.0; FEATURE_COUNT];
        x[0] = 14.0;
        x[1] = 7.0;
        let out = scaler.transform(&x);
        assert_eq!(out[0], 2.0);
        assert_eq!(out[1], 2.0);
        assert_eq!(out.len(), FEATURE_COUNT);
    }

    #[test]
    fn identity_scaler_is_noop() {
        let x = vec![1.0, -2.0, 3.5];
        assert_eq!(IdentityScaler.transform(&x), x);
    }

    #[test]
    fn missing_file_is_error() {
        assert!(ScoreModel::load(Path::new("/nonexistent/model.json")).is_err());
        assert!(StandardScaler::load(Path::new("/nonexistent/scaler.json")).is_err());
    }
}
