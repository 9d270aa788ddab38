//! Pre-trained regression model artifacts
//!
//! Artifacts are produced offline and only loaded here. Two encodings are
//! accepted, chosen by file extension: `.json` (`serde_json`) and
//! `.bin`/`.postcard` (`postcard`). Tree estimators use the flat node-array
//! layout scikit-learn exports, where `children_left[i] == -1` marks a leaf.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::AqiCastError;
use crate::models::FeatureSchema;

const LEAF: i64 = -1;

static SHARED_MODEL: OnceCell<(PathBuf, Arc<Model>)> = OnceCell::const_new();

/// Loaded, validated regression model. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelArtifact")]
pub struct Model {
    pub name: String,
    pub version: Option<String>,
    feature_names: FeatureSchema,
    estimator: Estimator,
}

/// On-disk layout; only reachable through validation
#[derive(Deserialize)]
struct ModelArtifact {
    name: String,
    version: Option<String>,
    feature_names: FeatureSchema,
    estimator: Estimator,
}

impl TryFrom<ModelArtifact> for Model {
    type Error = AqiCastError;

    fn try_from(artifact: ModelArtifact) -> Result<Self, Self::Error> {
        let model = Self {
            name: artifact.name,
            version: artifact.version,
            feature_names: artifact.feature_names,
            estimator: artifact.estimator,
        };
        model.validate()?;
        Ok(model)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    /// Mean of the tree outputs
    RandomForest { trees: Vec<RegressionTree> },
    Linear { intercept: f64, coefficients: Vec<f64> },
}

/// One regression tree in flat node-array form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl RegressionTree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        let n = self.value.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if [
            self.children_left.len(),
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err("tree node arrays differ in length".to_string());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if !self.value[node].is_finite() {
                return Err(format!("node {node} has a non-finite value"));
            }
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {node} has only one child"));
                }
                continue;
            }
            // children must point forward so traversal always terminates
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has invalid child {child}"));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {node} splits on unknown feature {feature}"));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {node} has a non-finite threshold"));
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf; `x` must be schema-width
    #[must_use]
    pub(crate) fn predict(&self, x: &[f64]) -> f64 {
        let mut node = 0;
        loop {
            let left = self.children_left[node];
            if left == LEAF {
                return self.value[node];
            }
            let feature = self.feature[node] as usize;
            node = if x[feature] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

impl Model {
    /// Build and validate a model from its parts
    pub fn new(
        name: impl Into<String>,
        feature_names: FeatureSchema,
        estimator: Estimator,
    ) -> Result<Self, AqiCastError> {
        let model = Self {
            name: name.into(),
            version: None,
            feature_names,
            estimator,
        };
        model.validate()?;
        Ok(model)
    }

    /// Input columns, in order
    #[must_use]
    pub fn feature_schema(&self) -> &FeatureSchema {
        &self.feature_names
    }

    fn validate(&self) -> Result<(), AqiCastError> {
        let n_features = self.feature_names.len();
        match &self.estimator {
            Estimator::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(AqiCastError::model_load("random forest has no trees"));
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(n_features)
                        .map_err(|e| AqiCastError::model_load(format!("tree {i}: {e}")))?;
                }
            }
            Estimator::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != n_features {
                    return Err(AqiCastError::model_load(format!(
                        "linear model has {} coefficients for {n_features} features",
                        coefficients.len()
                    )));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(AqiCastError::model_load("linear model has non-finite weights"));
                }
            }
        }
        Ok(())
    }

    /// Predict a single row; `x` must have one value per schema column
    #[must_use]
    pub fn predict_row(&self, x: &[f64]) -> f64 {
        match &self.estimator {
            Estimator::RandomForest { trees } => {
                trees.iter().map(|t| t.predict(x)).sum::<f64>() / trees.len() as f64
            }
            Estimator::Linear {
                intercept,
                coefficients,
            } => intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>(),
        }
    }

    /// Encode for writing to disk with the format implied by `path`
    pub fn to_bytes(&self, path: &Path) -> Result<Vec<u8>, AqiCastError> {
        match ArtifactFormat::from_path(path)? {
            ArtifactFormat::Json => serde_json::to_vec_pretty(self)
                .map_err(|e| AqiCastError::model_load(format!("failed to encode model: {e}"))),
            ArtifactFormat::Postcard => postcard::to_stdvec(self)
                .map_err(|e| AqiCastError::model_load(format!("failed to encode model: {e}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArtifactFormat {
    Json,
    Postcard,
}

impl ArtifactFormat {
    fn from_path(path: &Path) -> Result<Self, AqiCastError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("bin" | "postcard") => Ok(Self::Postcard),
            other => Err(AqiCastError::model_load(format!(
                "unrecognized model format '{}' for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }
}

/// Read, decode and validate a model artifact
#[instrument]
pub fn load_model(path: &Path) -> Result<Model, AqiCastError> {
    let format = ArtifactFormat::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            AqiCastError::model_load(format!("model file not found: {}", path.display()))
        }
        _ => AqiCastError::model_load(format!("failed to read {}: {e}", path.display())),
    })?;

    let model: Model = match format {
        ArtifactFormat::Json => serde_json::from_slice(&bytes)
            .map_err(|e| AqiCastError::model_load(format!("corrupted model artifact: {e}")))?,
        ArtifactFormat::Postcard => postcard::from_bytes(&bytes)
            .map_err(|e| AqiCastError::model_load(format!("corrupted model artifact: {e}")))?,
    };

    info!(
        "Loaded model '{}' with {} features",
        model.name,
        model.feature_names.len()
    );
    Ok(model)
}

/// Process-wide model, loaded on first use and kept for the process lifetime
pub async fn shared_model(path: &Path) -> Result<Arc<Model>, AqiCastError> {
    let owned = path.to_path_buf();
    let (loaded_from, model) = SHARED_MODEL
        .get_or_try_init(|| async move {
            let path = owned.clone();
            let model = tokio::task::spawn_blocking(move || load_model(&path))
                .await
                .map_err(|e| AqiCastError::model_load(format!("model loader panicked: {e}")))??;
            Ok::<_, AqiCastError>((owned, Arc::new(model)))
        })
        .await?;

    if loaded_from != path {
        warn!(
            "Model already loaded from {}, ignoring {}",
            loaded_from.display(),
            path.display()
        );
    }
    Ok(Arc::clone(model))
}
