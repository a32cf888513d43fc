//! Adapter around the externally trained gradient-boosting models.
//!
//! The regressor provides the continuous score, the classifier the risk
//! level, and an optional explainer per-feature attributions. Each is
//! reached through a small capability trait so the orchestrator does not
//! care whether it talks to a LightGBM dump or something else.

use crate::artifact_validator::read_verified;
use crate::ensemble::TreeEnsemble;
use crate::errors::ModelError;
use crate::language::SupportedLanguage;
use crate::models::{
    FeatureVector, RiskAssessment, RiskLevel, FEATURE_NAMES, LEARNED_MODEL_VERSION, N_FEATURES,
};
use crate::recommendations::generate_recommendations;
use crate::rule_based::clamp_score;
use crate::tree_shap::TreeShap;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub const REGRESSOR_FILE: &str = "foot_risk_regressor.json";
pub const CLASSIFIER_FILE: &str = "foot_risk_classifier.json";

/// Continuous risk score model.
pub trait ScoreRegressor: Send + Sync {
    fn predict_score(&self, input: &[f64]) -> Result<f64, ModelError>;
}

/// Three-class risk level model (0 = low, 1 = moderate, 2 = high).
pub trait RiskClassifier: Send + Sync {
    fn predict_class(&self, input: &[f64]) -> Result<usize, ModelError>;
}

/// Per-feature attribution of the regressor output.
pub trait FeatureExplainer: Send + Sync {
    fn explain(&self, input: &[f64]) -> Result<Vec<f64>, ModelError>;
}

impl ScoreRegressor for TreeEnsemble {
    fn predict_score(&self, input: &[f64]) -> Result<f64, ModelError> {
        if self.is_multiclass() {
            return Err(ModelError::Inference(
                "regressor artifact is a multiclass model".to_string(),
            ));
        }
        self.predict_raw(input)
    }
}

impl RiskClassifier for TreeEnsemble {
    fn predict_class(&self, input: &[f64]) -> Result<usize, ModelError> {
        TreeEnsemble::predict_class(self, input)
    }
}

impl FeatureExplainer for TreeShap {
    fn explain(&self, input: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.shap_values(input)
    }
}

/// Learned prediction path.
#[derive(Clone)]
pub struct LearnedModelAdapter {
    regressor: Arc<dyn ScoreRegressor>,
    classifier: Arc<dyn RiskClassifier>,
    explainer: Option<Arc<dyn FeatureExplainer>>,
}

impl std::fmt::Debug for LearnedModelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearnedModelAdapter")
            .field("explainer", &self.explainer.is_some())
            .finish()
    }
}

impl LearnedModelAdapter {
    pub fn new(
        regressor: Arc<dyn ScoreRegressor>,
        classifier: Arc<dyn RiskClassifier>,
        explainer: Option<Arc<dyn FeatureExplainer>>,
    ) -> Self {
        Self {
            regressor,
            classifier,
            explainer,
        }
    }

    pub fn has_explainer(&self) -> bool {
        self.explainer.is_some()
    }

    /// Runs both models and assembles the shared response.
    ///
    /// Any regressor or classifier failure is returned to the caller, which
    /// falls back to the rule engine. Explainer failures only drop
    /// `shap_values`.
    pub fn predict(
        &self,
        fv: &FeatureVector,
        lang: SupportedLanguage,
    ) -> Result<RiskAssessment, ModelError> {
        let input = fv.to_layout();

        let raw_score = self.regressor.predict_score(&input)?;
        if !raw_score.is_finite() {
            return Err(ModelError::Inference(format!(
                "regressor returned {}",
                raw_score
            )));
        }
        let risk_score = clamp_score(raw_score);

        let class_index = self.classifier.predict_class(&input)?;
        let risk_level =
            RiskLevel::from_class_index(class_index).ok_or(ModelError::UnknownClass(class_index))?;

        let shap_values = self.explain(&input);
        let recommendations = generate_recommendations(fv, risk_score, risk_level, lang);

        Ok(RiskAssessment {
            risk_score,
            risk_level,
            risk_label: lang.risk_label(risk_level).to_string(),
            shap_values,
            recommendations,
            model_version: LEARNED_MODEL_VERSION.to_string(),
            fallback: false,
        })
    }

    fn explain(&self, input: &[f64]) -> Option<BTreeMap<String, f64>> {
        let explainer = self.explainer.as_ref()?;
        match explainer.explain(input) {
            Ok(values) if values.len() == N_FEATURES => Some(
                FEATURE_NAMES
                    .iter()
                    .zip(values)
                    .map(|(name, v)| (name.to_string(), round3(v)))
                    .collect(),
            ),
            Ok(values) => {
                tracing::warn!(
                    "SHAP computation returned {} values for {} features",
                    values.len(),
                    N_FEATURES
                );
                None
            }
            Err(e) => {
                tracing::warn!("SHAP computation failed: {}", e);
                None
            }
        }
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Rejects an artifact whose declared columns differ from the request layout.
fn check_layout(name: &str, ensemble: &TreeEnsemble) -> Result<(), ModelError> {
    if ensemble.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
        return Err(ModelError::LayoutMismatch(format!(
            "{} declares features {:?}, expected {:?}",
            name, ensemble.feature_names, FEATURE_NAMES
        )));
    }
    Ok(())
}

fn load_ensemble(path: &Path) -> Result<TreeEnsemble, ModelError> {
    let artifact = read_verified(path)?;
    let ensemble = TreeEnsemble::from_json(&artifact.contents)?;
    tracing::debug!(
        "Read {} ({} trees, sha256 {}, verified: {})",
        artifact.path.display(),
        ensemble.tree_info.len(),
        artifact.checksum,
        artifact.verified
    );
    Ok(ensemble)
}

/// Loads the regressor and classifier from `dir`.
///
/// # Returns
///
/// * `Ok(None)` - one of the two artifacts is absent; the rule engine should serve.
/// * `Ok(Some(adapter))` - both models loaded; the explainer is attached when
///   `shap_enabled` is set and the regressor carries node sample counts.
/// * `Err(ModelError)` - artifacts present but unusable.
pub fn load_from_dir(
    dir: &Path,
    shap_enabled: bool,
) -> Result<Option<LearnedModelAdapter>, ModelError> {
    let regressor_path = dir.join(REGRESSOR_FILE);
    let classifier_path = dir.join(CLASSIFIER_FILE);

    if !regressor_path.exists() || !classifier_path.exists() {
        return Ok(None);
    }

    let regressor = load_ensemble(&regressor_path)?;
    check_layout(REGRESSOR_FILE, &regressor)?;
    if regressor.is_multiclass() {
        return Err(ModelError::Artifact(format!(
            "{} must be a single-output regression model",
            REGRESSOR_FILE
        )));
    }

    let classifier = load_ensemble(&classifier_path)?;
    check_layout(CLASSIFIER_FILE, &classifier)?;
    if classifier.num_class != RiskLevel::ALL.len()
        || classifier.num_tree_per_iteration != RiskLevel::ALL.len()
    {
        return Err(ModelError::Artifact(format!(
            "{} must be a {}-class model, found num_class = {}",
            CLASSIFIER_FILE,
            RiskLevel::ALL.len(),
            classifier.num_class
        )));
    }

    let explainer: Option<Arc<dyn FeatureExplainer>> = if shap_enabled {
        match TreeShap::new(regressor.clone()) {
            Ok(shap) => Some(Arc::new(shap)),
            Err(e) => {
                tracing::info!("SHAP explainer unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(Some(LearnedModelAdapter::new(
        Arc::new(regressor),
        Arc::new(classifier),
        explainer,
    )))
}
