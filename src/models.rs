use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============ Feature Layout ============

/// Continuous fields a prediction request must carry.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "hba1c",
    "crp",
    "creatinine",
    "albumin",
    "esr",
    "sodium",
    "age",
    "diabetes_duration_years",
];

/// Comorbidity flags, optional on the wire and false when absent.
pub const BOOLEAN_FIELDS: [&str; 3] = ["has_hypertension", "has_neuropathy", "has_pvd"];

/// Column order expected by the learned models. Continuous fields first, then flags.
pub const FEATURE_NAMES: [&str; 11] = [
    "hba1c",
    "crp",
    "creatinine",
    "albumin",
    "esr",
    "sodium",
    "age",
    "diabetes_duration_years",
    "has_hypertension",
    "has_neuropathy",
    "has_pvd",
];

pub const N_FEATURES: usize = FEATURE_NAMES.len();

/// Identifier reported when the rule engine produced the result.
pub const RULE_BASED_MODEL_VERSION: &str = "rule_based_v1";
/// Identifier reported when the gradient-boosting models produced the result.
pub const LEARNED_MODEL_VERSION: &str = "lightgbm_v1";

// ============ Clinical Input ============

/// One validated patient observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Glycated hemoglobin (%).
    pub hba1c: f64,
    /// C-reactive protein (mg/L).
    pub crp: f64,
    /// Serum creatinine (mg/dL).
    pub creatinine: f64,
    /// Serum albumin (g/dL).
    pub albumin: f64,
    /// Erythrocyte sedimentation rate (mm/h).
    pub esr: f64,
    /// Serum sodium (mEq/L).
    pub sodium: f64,
    /// Age in years.
    pub age: f64,
    /// Years since diabetes diagnosis.
    pub diabetes_duration_years: f64,
    #[serde(default)]
    pub has_hypertension: bool,
    #[serde(default)]
    pub has_neuropathy: bool,
    /// Peripheral vascular disease.
    #[serde(default)]
    pub has_pvd: bool,
}

impl Default for FeatureVector {
    /// Values the rule engine assumes for a field it was not given.
    fn default() -> Self {
        Self {
            hba1c: 5.0,
            crp: 0.0,
            creatinine: 0.8,
            albumin: 4.0,
            esr: 10.0,
            sodium: 140.0,
            age: 30.0,
            diabetes_duration_years: 0.0,
            has_hypertension: false,
            has_neuropathy: false,
            has_pvd: false,
        }
    }
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order, flags encoded as 0.0 / 1.0.
    pub fn to_layout(&self) -> [f64; N_FEATURES] {
        [
            self.hba1c,
            self.crp,
            self.creatinine,
            self.albumin,
            self.esr,
            self.sodium,
            self.age,
            self.diabetes_duration_years,
            flag(self.has_hypertension),
            flag(self.has_neuropathy),
            flag(self.has_pvd),
        ]
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Observation where any field may be missing.
///
/// Used by callers of the rule engine that do not go through request
/// validation; missing fields take the rule engine defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct PartialFeatureVector {
    pub hba1c: Option<f64>,
    pub crp: Option<f64>,
    pub creatinine: Option<f64>,
    pub albumin: Option<f64>,
    pub esr: Option<f64>,
    pub sodium: Option<f64>,
    pub age: Option<f64>,
    pub diabetes_duration_years: Option<f64>,
    pub has_hypertension: Option<bool>,
    pub has_neuropathy: Option<bool>,
    pub has_pvd: Option<bool>,
}

impl PartialFeatureVector {
    pub fn with_defaults(&self) -> FeatureVector {
        let d = FeatureVector::default();
        FeatureVector {
            hba1c: self.hba1c.unwrap_or(d.hba1c),
            crp: self.crp.unwrap_or(d.crp),
            creatinine: self.creatinine.unwrap_or(d.creatinine),
            albumin: self.albumin.unwrap_or(d.albumin),
            esr: self.esr.unwrap_or(d.esr),
            sodium: self.sodium.unwrap_or(d.sodium),
            age: self.age.unwrap_or(d.age),
            diabetes_duration_years: self
                .diabetes_duration_years
                .unwrap_or(d.diabetes_duration_years),
            has_hypertension: self.has_hypertension.unwrap_or(d.has_hypertension),
            has_neuropathy: self.has_neuropathy.unwrap_or(d.has_neuropathy),
            has_pvd: self.has_pvd.unwrap_or(d.has_pvd),
        }
    }
}

impl From<FeatureVector> for PartialFeatureVector {
    fn from(fv: FeatureVector) -> Self {
        Self {
            hba1c: Some(fv.hba1c),
            crp: Some(fv.crp),
            creatinine: Some(fv.creatinine),
            albumin: Some(fv.albumin),
            esr: Some(fv.esr),
            sodium: Some(fv.sodium),
            age: Some(fv.age),
            diabetes_duration_years: Some(fv.diabetes_duration_years),
            has_hypertension: Some(fv.has_hypertension),
            has_neuropathy: Some(fv.has_neuropathy),
            has_pvd: Some(fv.has_pvd),
        }
    }
}

// ============ Risk Output ============

/// Inclusive upper bound of the low band.
pub const LOW_RISK_MAX: u8 = 30;
/// Inclusive upper bound of the moderate band.
pub const MODERATE_RISK_MAX: u8 = 60;

/// Three-way partition of the 0-100 risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Classifier output order.
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High];

    /// Shared threshold partition used by every prediction path.
    pub fn from_score(score: u8) -> Self {
        if score <= LOW_RISK_MAX {
            RiskLevel::Low
        } else if score <= MODERATE_RISK_MAX {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }

    /// Maps a classifier class index (0 = low, 1 = moderate, 2 = high).
    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response contract shared by the rule-based and learned paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Integer score in [0, 100].
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    /// `risk_level` rendered in the request language.
    pub risk_label: String,
    /// Per-feature attributions; only set on the learned path when the explainer succeeded.
    pub shap_values: Option<BTreeMap<String, f64>>,
    /// Urgency-first, reproducible for identical input.
    pub recommendations: Vec<String>,
    pub model_version: String,
    /// True only when the learned path failed and the rule engine answered instead.
    pub fallback: bool,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    /// Model version serving predictions.
    pub model: String,
    pub shap_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(31), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(61), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
    }

    #[test]
    fn test_class_index_mapping() {
        assert_eq!(RiskLevel::from_class_index(0), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_class_index(2), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_class_index(3), None);
    }

    #[test]
    fn test_partial_defaults() {
        let fv = PartialFeatureVector {
            hba1c: Some(8.0),
            ..Default::default()
        }
        .with_defaults();

        assert_eq!(fv.hba1c, 8.0);
        assert_eq!(fv.creatinine, 0.8);
        assert_eq!(fv.esr, 10.0);
        assert_eq!(fv.sodium, 140.0);
        assert!(!fv.has_pvd);
    }

    #[test]
    fn test_layout_order() {
        let fv = FeatureVector {
            has_neuropathy: true,
            ..Default::default()
        };
        let layout = fv.to_layout();
        assert_eq!(layout[0], 5.0);
        assert_eq!(layout[8], 0.0);
        assert_eq!(layout[9], 1.0);
        assert_eq!(layout[10], 0.0);
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&RiskLevel::Moderate).unwrap();
        assert_eq!(json, "\"moderate\"");
    }
}
