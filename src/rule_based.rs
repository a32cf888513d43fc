//! Rule-based diabetic foot risk scorer
//!
//! Additive scoring over clinically weighted threshold bands. Each factor
//! contributes a fixed number of points depending on which band its value
//! falls in; the sum is rounded and clamped to 0-100.
//!
//! | Factor | Max |
//! |---|---|
//! | HbA1c | 20 |
//! | CRP, creatinine, diabetes duration | 15 each |
//! | albumin, ESR, age | 10 each |
//! | sodium, neuropathy, PVD | 5 each |
//! | hypertension | 3 |

use crate::language::SupportedLanguage;
use crate::models::{
    FeatureVector, PartialFeatureVector, RiskAssessment, RiskLevel, RULE_BASED_MODEL_VERSION,
};
use crate::recommendations::generate_recommendations;

/// Points contributed by each factor for one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RulePoints {
    pub hba1c: f64,
    pub crp: f64,
    pub creatinine: f64,
    pub diabetes_duration: f64,
    pub albumin: f64,
    pub esr: f64,
    pub age: f64,
    pub sodium: f64,
    pub neuropathy: f64,
    pub pvd: f64,
    pub hypertension: f64,
}

impl RulePoints {
    pub fn total(&self) -> f64 {
        self.hba1c
            + self.crp
            + self.creatinine
            + self.diabetes_duration
            + self.albumin
            + self.esr
            + self.age
            + self.sodium
            + self.neuropathy
            + self.pvd
            + self.hypertension
    }
}

/// Stateless scorer; safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedScorer;

impl RuleBasedScorer {
    pub fn new() -> Self {
        Self
    }

    /// Per-factor points.
    pub fn points(&self, fv: &FeatureVector) -> RulePoints {
        RulePoints {
            hba1c: hba1c_points(fv.hba1c),
            crp: crp_points(fv.crp),
            creatinine: creatinine_points(fv.creatinine),
            diabetes_duration: duration_points(fv.diabetes_duration_years),
            albumin: albumin_points(fv.albumin),
            esr: esr_points(fv.esr),
            age: age_points(fv.age),
            sodium: sodium_points(fv.sodium),
            neuropathy: if fv.has_neuropathy { 5.0 } else { 0.0 },
            pvd: if fv.has_pvd { 5.0 } else { 0.0 },
            hypertension: if fv.has_hypertension { 3.0 } else { 0.0 },
        }
    }

    /// Risk score in [0, 100].
    pub fn score(&self, fv: &FeatureVector) -> u8 {
        clamp_score(self.points(fv).total())
    }

    /// Scores an observation with missing fields, filling the documented defaults.
    pub fn score_partial(&self, partial: &PartialFeatureVector) -> u8 {
        self.score(&partial.with_defaults())
    }

    /// Full rule-path result: score, level, label and recommendations.
    pub fn assess(&self, fv: &FeatureVector, lang: SupportedLanguage) -> RiskAssessment {
        let risk_score = self.score(fv);
        let risk_level = RiskLevel::from_score(risk_score);

        RiskAssessment {
            risk_score,
            risk_level,
            risk_label: lang.risk_label(risk_level).to_string(),
            shap_values: None,
            recommendations: generate_recommendations(fv, risk_score, risk_level, lang),
            model_version: RULE_BASED_MODEL_VERSION.to_string(),
            fallback: false,
        }
    }
}

/// Rounds a raw score and clamps it into [0, 100]. NaN maps to 0.
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

fn hba1c_points(hba1c: f64) -> f64 {
    if hba1c >= 9.0 {
        20.0
    } else if hba1c >= 7.5 {
        14.0
    } else if hba1c >= 6.5 {
        8.0
    } else {
        2.0
    }
}

fn crp_points(crp: f64) -> f64 {
    if crp >= 10.0 {
        15.0
    } else if crp >= 3.0 {
        10.0
    } else if crp >= 1.0 {
        5.0
    } else {
        0.0
    }
}

fn creatinine_points(creatinine: f64) -> f64 {
    if creatinine >= 2.0 {
        15.0
    } else if creatinine >= 1.3 {
        10.0
    } else if creatinine >= 1.0 {
        5.0
    } else {
        0.0
    }
}

fn duration_points(years: f64) -> f64 {
    if years >= 20.0 {
        15.0
    } else if years >= 10.0 {
        10.0
    } else if years >= 5.0 {
        5.0
    } else {
        0.0
    }
}

// Low albumin is worse.
fn albumin_points(albumin: f64) -> f64 {
    if albumin < 2.5 {
        10.0
    } else if albumin < 3.5 {
        6.0
    } else {
        1.0
    }
}

fn esr_points(esr: f64) -> f64 {
    if esr >= 40.0 {
        10.0
    } else if esr >= 20.0 {
        6.0
    } else {
        1.0
    }
}

fn age_points(age: f64) -> f64 {
    if age >= 70.0 {
        10.0
    } else if age >= 60.0 {
        7.0
    } else if age >= 50.0 {
        4.0
    } else {
        0.0
    }
}

// Hyponatremia.
fn sodium_points(sodium: f64) -> f64 {
    if sodium < 130.0 {
        5.0
    } else if sodium < 135.0 {
        3.0
    } else {
        0.0
    }
}
