//! Prediction orchestration.
//!
//! Per request: validate, pick the learned or rule-based path, fall back to
//! the rule engine at most once if the learned path fails, and answer with a
//! single [`RiskAssessment`]. Whether a learned model is available is decided
//! once at startup and carried in an immutable [`ModelRuntime`].

use crate::errors::{ModelError, ValidationError};
use crate::language::SupportedLanguage;
use crate::learned_model::{load_from_dir, LearnedModelAdapter};
use crate::models::{
    FeatureVector, HealthStatus, RiskAssessment, BOOLEAN_FIELDS, LEARNED_MODEL_VERSION,
    REQUIRED_FIELDS, RULE_BASED_MODEL_VERSION,
};
use crate::rule_based::RuleBasedScorer;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// Something that turns a validated observation into a full assessment.
pub trait RiskPredictor: Send + Sync {
    fn model_version(&self) -> &'static str;

    fn predict(
        &self,
        fv: &FeatureVector,
        lang: SupportedLanguage,
    ) -> Result<RiskAssessment, ModelError>;
}

impl RiskPredictor for RuleBasedScorer {
    fn model_version(&self) -> &'static str {
        RULE_BASED_MODEL_VERSION
    }

    fn predict(
        &self,
        fv: &FeatureVector,
        lang: SupportedLanguage,
    ) -> Result<RiskAssessment, ModelError> {
        Ok(self.assess(fv, lang))
    }
}

impl RiskPredictor for LearnedModelAdapter {
    fn model_version(&self) -> &'static str {
        LEARNED_MODEL_VERSION
    }

    fn predict(
        &self,
        fv: &FeatureVector,
        lang: SupportedLanguage,
    ) -> Result<RiskAssessment, ModelError> {
        LearnedModelAdapter::predict(self, fv, lang)
    }
}

// ============ Startup State ============

/// Outcome of the startup model load. Read-only for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct ModelRuntime {
    learned: Option<Arc<LearnedModelAdapter>>,
}

impl ModelRuntime {
    pub fn rule_based() -> Self {
        Self { learned: None }
    }

    pub fn with_learned(adapter: LearnedModelAdapter) -> Self {
        Self {
            learned: Some(Arc::new(adapter)),
        }
    }

    /// Loads models from `dir`. Never fails: unusable artifacts are logged
    /// and the service runs on the rule engine.
    pub fn load(dir: &Path, shap_enabled: bool) -> Self {
        match load_from_dir(dir, shap_enabled) {
            Ok(Some(adapter)) => {
                tracing::info!(
                    "LightGBM models loaded successfully from {} (SHAP: {})",
                    dir.display(),
                    adapter.has_explainer()
                );
                Self::with_learned(adapter)
            }
            Ok(None) => {
                tracing::info!(
                    "No LightGBM models found in {}, using rule-based scoring",
                    dir.display()
                );
                Self::rule_based()
            }
            Err(e) => {
                tracing::error!(
                    "Failed to load LightGBM models from {}: {}. Using rule-based scoring",
                    dir.display(),
                    e
                );
                Self::rule_based()
            }
        }
    }

    pub fn learned_active(&self) -> bool {
        self.learned.is_some()
    }

    pub fn shap_available(&self) -> bool {
        self.learned
            .as_ref()
            .map(|a| a.has_explainer())
            .unwrap_or(false)
    }
}

// ============ Validation ============

/// A request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRequest {
    pub features: FeatureVector,
    pub lang: SupportedLanguage,
}

/// Validates and coerces a raw request body.
///
/// All missing required fields are reported together. Unknown keys are ignored.
pub fn validate_request(body: &Value) -> Result<PredictionRequest, ValidationError> {
    let map = body.as_object().ok_or_else(|| {
        ValidationError::InvalidBody("request body must be a JSON object".to_string())
    })?;

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|f| map.get(**f).map(Value::is_null).unwrap_or(true))
        .map(|f| f.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let mut values = [0.0; REQUIRED_FIELDS.len()];
    for (slot, field) in values.iter_mut().zip(REQUIRED_FIELDS) {
        *slot = coerce_number(field, map.get(field).unwrap_or(&Value::Null))?;
    }
    let [hba1c, crp, creatinine, albumin, esr, sodium, age, diabetes_duration_years] = values;
    let [has_hypertension, has_neuropathy, has_pvd] = BOOLEAN_FIELDS.map(|f| coerce_flag(map, f));

    let lang = SupportedLanguage::resolve(map.get("lang").and_then(Value::as_str));

    Ok(PredictionRequest {
        features: FeatureVector {
            hba1c,
            crp,
            creatinine,
            albumin,
            esr,
            sodium,
            age,
            diabetes_duration_years,
            has_hypertension,
            has_neuropathy,
            has_pvd,
        },
        lang,
    })
}

fn coerce_number(field: &str, value: &Value) -> Result<f64, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let number = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid("number out of range"))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid("expected a number"))?,
        _ => return Err(invalid("expected a number")),
    };

    if !number.is_finite() {
        return Err(invalid("number must be finite"));
    }
    Ok(number)
}

fn coerce_flag(map: &Map<String, Value>, field: &str) -> bool {
    match map.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "0" | "no" | "off"
        ),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

// ============ Orchestrator ============

/// Which path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionPath {
    Learned,
    RuleBased,
    /// Learned path failed; rule engine answered.
    Fallback,
}

/// Stateless apart from the startup [`ModelRuntime`]; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct PredictionOrchestrator {
    runtime: ModelRuntime,
    rules: RuleBasedScorer,
}

impl PredictionOrchestrator {
    pub fn new(runtime: ModelRuntime) -> Self {
        Self {
            runtime,
            rules: RuleBasedScorer::new(),
        }
    }

    /// Validates `body` and scores it.
    pub fn predict(&self, body: &Value) -> Result<RiskAssessment, ValidationError> {
        let request = validate_request(body)?;
        Ok(self.assess(&request.features, request.lang))
    }

    /// Scores an already validated observation. Always produces an assessment.
    pub fn assess(&self, fv: &FeatureVector, lang: SupportedLanguage) -> RiskAssessment {
        let (assessment, path) = self.assess_with_path(fv, lang);
        tracing::debug!(
            "Prediction served via {:?}: score {} ({})",
            path,
            assessment.risk_score,
            assessment.risk_level
        );
        assessment
    }

    pub fn assess_with_path(
        &self,
        fv: &FeatureVector,
        lang: SupportedLanguage,
    ) -> (RiskAssessment, PredictionPath) {
        let Some(learned) = self.runtime.learned.as_deref() else {
            return (self.rules.assess(fv, lang), PredictionPath::RuleBased);
        };

        match RiskPredictor::predict(learned, fv, lang) {
            Ok(assessment) => (assessment, PredictionPath::Learned),
            Err(e) => {
                tracing::warn!(
                    "LightGBM prediction failed: {}, falling back to rule-based",
                    e
                );
                let mut assessment = self.rules.assess(fv, lang);
                assessment.fallback = true;
                (assessment, PredictionPath::Fallback)
            }
        }
    }

    /// Read-only view for the health endpoint.
    pub fn status(&self) -> HealthStatus {
        let model = match self.runtime.learned.as_deref() {
            Some(learned) => learned.model_version(),
            None => self.rules.model_version(),
        };
        HealthStatus {
            status: "ok".to_string(),
            model: model.to_string(),
            shap_available: self.runtime.shap_available(),
        }
    }
}
