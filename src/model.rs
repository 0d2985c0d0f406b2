use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::PredictionError;
use crate::features::{feature_index, FeatureVector, FEATURE_NAMES};

pub const MODEL_FILE: &str = "best_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const FEATURES_FILE: &str = "feature_columns.json";

/// A trained model mapping a scaled feature row to a demand estimate.
pub trait Regressor: Send + Sync {
    fn predict(&self, x: &[f64]) -> Result<f64, PredictionError>;

    /// Expected input width, when the model knows it.
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str;
}

/// A fitted transform applied to a feature row before inference.
pub trait Scaler: Send + Sync {
    fn transform(&self, x: &[f64]) -> Result<Vec<f64>, PredictionError>;

    fn n_features(&self) -> Option<usize> {
        None
    }
}

fn check_len(x: &[f64], expected: usize) -> Result<(), PredictionError> {
    if x.len() != expected {
        return Err(PredictionError::ShapeMismatch { got: x.len(), expected });
    }
    Ok(())
}

// ---------- Scalers ----------

#[derive(Debug, Clone, Default)]
pub struct IdentityScaler;

impl Scaler for IdentityScaler {
    fn transform(&self, x: &[f64]) -> Result<Vec<f64>, PredictionError> {
        Ok(x.to_vec())
    }
}

/// `(x - mean) / scale` per column.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.len() != scale.len() {
            bail!("scaler mean has {} columns but scale has {}", mean.len(), scale.len());
        }
        // constant columns are fitted with scale 0; they pass through unscaled
        let scale = scale.into_iter().map(|s| if s == 0.0 { 1.0 } else { s }).collect();
        Ok(Self { mean, scale })
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, x: &[f64]) -> Result<Vec<f64>, PredictionError> {
        check_len(x, self.mean.len())?;
        Ok(x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.mean.len())
    }
}

// ---------- Regressors ----------

#[derive(Debug, Clone)]
pub struct LinearRegressor {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearRegressor {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self { intercept, coefficients }
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, x: &[f64]) -> Result<f64, PredictionError> {
        check_len(x, self.coefficients.len())?;
        Ok(self.intercept + x.iter().zip(&self.coefficients).map(|(a, b)| a * b).sum::<f64>())
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn name(&self) -> &str {
        "linear"
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Binary regression tree; node 0 is the root, `x[feature] <= threshold`
/// goes left.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Rejects dangling child references and cycles, so `evaluate` always
    /// reaches a leaf.
    pub fn new(nodes: Vec<TreeNode>) -> Result<Self> {
        if nodes.is_empty() {
            bail!("decision tree has no nodes");
        }
        let mut seen = vec![false; nodes.len()];
        let mut stack = vec![0usize];
        while let Some(i) = stack.pop() {
            if seen[i] {
                bail!("decision tree node {} is reachable twice", i);
            }
            seen[i] = true;
            if let TreeNode::Split { left, right, .. } = nodes[i] {
                for child in [left, right] {
                    if child >= nodes.len() {
                        bail!("decision tree node {} references missing child {}", i, child);
                    }
                    stack.push(child);
                }
            }
        }
        Ok(Self { nodes })
    }

    pub fn evaluate(&self, x: &[f64]) -> Result<f64, PredictionError> {
        let (mut parent, mut i) = (0, 0);
        loop {
            match self.nodes.get(i) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let v = x
                        .get(*feature)
                        .ok_or(PredictionError::FeatureIndex { index: *feature, len: x.len() })?;
                    parent = i;
                    i = if *v <= *threshold { *left } else { *right };
                }
                None => return Err(PredictionError::DanglingNode { node: parent, child: i }),
            }
        }
    }
}

impl Regressor for DecisionTree {
    fn predict(&self, x: &[f64]) -> Result<f64, PredictionError> {
        self.evaluate(x)
    }

    fn name(&self) -> &str {
        "decision_tree"
    }
}

/// Mean of its trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(trees: Vec<DecisionTree>) -> Result<Self> {
        if trees.is_empty() {
            bail!("random forest has no trees");
        }
        Ok(Self { trees })
    }
}

impl Regressor for RandomForest {
    fn predict(&self, x: &[f64]) -> Result<f64, PredictionError> {
        let mut sum = 0.0;
        for t in &self.trees {
            sum += t.evaluate(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

// ---------- Artifact files ----------

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelJson {
    Linear { intercept: f64, coefficients: Vec<f64> },
    DecisionTree { nodes: Vec<TreeNode> },
    RandomForest { trees: Vec<TreeJson> },
}

#[derive(Deserialize)]
struct TreeJson {
    nodes: Vec<TreeNode>,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ScalerJson {
    Identity,
    Standard { mean: Vec<f64>, scale: Vec<f64> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureColumnsJson {
    List(Vec<String>),
    Meta {
        feat_list: Vec<String>,
        in_dim: Option<usize>,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&txt).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn load_regressor(path: &Path) -> Result<Box<dyn Regressor>> {
    let model: Box<dyn Regressor> = match read_json::<ModelJson>(path)? {
        ModelJson::Linear { intercept, coefficients } => {
            Box::new(LinearRegressor::new(intercept, coefficients))
        }
        ModelJson::DecisionTree { nodes } => Box::new(DecisionTree::new(nodes)?),
        ModelJson::RandomForest { trees } => {
            let trees = trees
                .into_iter()
                .enumerate()
                .map(|(i, t)| DecisionTree::new(t.nodes).with_context(|| format!("tree {}", i)))
                .collect::<Result<Vec<_>>>()?;
            Box::new(RandomForest::new(trees)?)
        }
    };
    Ok(model)
}

pub fn load_scaler(path: &Path) -> Result<Box<dyn Scaler>> {
    Ok(match read_json::<ScalerJson>(path)? {
        ScalerJson::Identity => Box::new(IdentityScaler),
        ScalerJson::Standard { mean, scale } => Box::new(StandardScaler::new(mean, scale)?),
    })
}

pub fn load_feature_columns(path: &Path) -> Result<Vec<String>> {
    let feat_list = match read_json::<FeatureColumnsJson>(path)? {
        FeatureColumnsJson::List(list) => list,
        FeatureColumnsJson::Meta { feat_list, in_dim } => {
            if let Some(d) = in_dim {
                if d != feat_list.len() {
                    bail!("in_dim ({}) != feat_list.len() ({})", d, feat_list.len());
                }
            }
            feat_list
        }
    };
    if feat_list.is_empty() {
        bail!("feature column list is empty");
    }
    Ok(feat_list)
}

/// The three trained artifacts, loaded once at startup.
pub struct ModelArtifacts {
    pub regressor: Box<dyn Regressor>,
    pub scaler: Box<dyn Scaler>,
    pub feature_columns: Vec<String>,
}

impl ModelArtifacts {
    pub fn load_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            regressor: load_regressor(&dir.join(MODEL_FILE))?,
            scaler: load_scaler(&dir.join(SCALER_FILE))?,
            feature_columns: load_feature_columns(&dir.join(FEATURES_FILE))?,
        })
    }
}

// ---------- Predictor ----------

/// Scaler + regressor over the artifact's column order.
pub struct Predictor {
    regressor: Box<dyn Regressor>,
    scaler: Box<dyn Scaler>,
    columns: Vec<String>,
    projection: Vec<usize>, // artifact column -> FeatureVector index
}

impl Predictor {
    pub fn new(artifacts: ModelArtifacts) -> Result<Self> {
        let ModelArtifacts { regressor, scaler, feature_columns } = artifacts;

        let projection = feature_columns
            .iter()
            .map(|name| {
                feature_index(name).ok_or_else(|| PredictionError::UnknownFeature(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let in_dim = projection.len();
        if let Some(n) = scaler.n_features() {
            if n != in_dim {
                bail!("scaler expects {} features, feature list has {}", n, in_dim);
            }
        }
        if let Some(n) = regressor.n_features() {
            if n != in_dim {
                bail!("{} model expects {} features, feature list has {}", regressor.name(), n, in_dim);
            }
        }

        let predictor = Self { regressor, scaler, columns: feature_columns, projection };

        // Warmup: a zero row must make it through both stages
        let probe = predictor.predict_raw(&vec![0.0; in_dim]).context("warmup prediction failed")?;
        tracing::info!(model = predictor.regressor.name(), in_dim, probe, "warmup forward ok");

        Ok(predictor)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn model_name(&self) -> &str {
        self.regressor.name()
    }

    /// Selects the artifact's columns from the full engineered vector.
    pub fn project(&self, fv: &FeatureVector) -> Vec<f64> {
        let all = fv.as_slice();
        self.projection.iter().map(|&i| all[i]).collect()
    }

    /// Scale then infer on a row already in artifact column order.
    pub fn predict_raw(&self, x: &[f64]) -> Result<f64, PredictionError> {
        if x.len() != self.projection.len() {
            return Err(PredictionError::ShapeMismatch { got: x.len(), expected: self.projection.len() });
        }
        let scaled = self.scaler.transform(x)?;
        let y = self.regressor.predict(&scaled)?;
        if !y.is_finite() {
            return Err(PredictionError::NonFinite(y));
        }
        Ok(y)
    }

    /// Rental count: truncated toward zero, negatives clamped to 0.
    pub fn predict(&self, fv: &FeatureVector) -> Result<u64, PredictionError> {
        let raw = self.predict_raw(&self.project(fv))?;
        Ok(to_count(raw))
    }
}

pub fn to_count(raw: f64) -> u64 {
    if raw <= 0.0 {
        0
    } else {
        raw.trunc() as u64
    }
}

/// Column list every shipped artifact set is trained against.
pub fn default_columns() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}
