//! Clinical recommendations shared by both prediction paths.
//!
//! Rules are evaluated in a fixed order, urgency first, and the general
//! hygiene advice always closes the list.

use crate::language::SupportedLanguage;
use crate::models::{FeatureVector, RiskLevel, LOW_RISK_MAX, MODERATE_RISK_MAX};

/// Builds the ordered recommendation list for one assessment.
///
/// `level` is accepted for parity with the learned path, which derives its
/// level from a classifier; the guards themselves only look at `score` and
/// the raw measurements.
pub fn generate_recommendations(
    fv: &FeatureVector,
    score: u8,
    _level: RiskLevel,
    lang: SupportedLanguage,
) -> Vec<String> {
    let texts = &lang.catalog().recommendations;

    let rules: [(bool, &str); 9] = [
        (score > MODERATE_RISK_MAX, texts.urgent),
        (score > LOW_RISK_MAX, texts.exam),
        (fv.hba1c >= 7.5, texts.hba1c),
        (fv.crp >= 3.0, texts.crp),
        (fv.creatinine >= 1.3, texts.kidney),
        (fv.albumin < 3.5, texts.nutrition),
        (fv.esr >= 20.0, texts.esr),
        (fv.has_neuropathy, texts.neuropathy),
        (fv.has_pvd, texts.pvd),
    ];

    let mut recs: Vec<String> = rules
        .iter()
        .filter(|(applies, _)| *applies)
        .map(|(_, text)| text.to_string())
        .collect();

    recs.push(texts.hygiene.to_string());
    recs
}
