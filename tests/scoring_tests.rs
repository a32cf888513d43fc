/// Rule-based scoring and recommendation scenarios
/// Exercises the public scoring API the way the HTTP layer uses it
use foot_risk_api::language::SupportedLanguage;
use foot_risk_api::models::{FeatureVector, PartialFeatureVector, RiskLevel, RULE_BASED_MODEL_VERSION};
use foot_risk_api::recommendations::generate_recommendations;
use foot_risk_api::rule_based::RuleBasedScorer;

fn worst_case() -> FeatureVector {
    FeatureVector {
        hba1c: 10.0,
        crp: 12.0,
        creatinine: 2.5,
        albumin: 2.0,
        esr: 50.0,
        sodium: 125.0,
        age: 75.0,
        diabetes_duration_years: 25.0,
        has_hypertension: true,
        has_neuropathy: true,
        has_pvd: true,
    }
}

fn moderate_case() -> FeatureVector {
    FeatureVector {
        hba1c: 8.0,
        crp: 4.0,
        creatinine: 1.1,
        albumin: 3.9,
        esr: 15.0,
        sodium: 138.0,
        age: 55.0,
        diabetes_duration_years: 12.0,
        has_hypertension: false,
        has_neuropathy: false,
        has_pvd: false,
    }
}

#[test]
fn test_worst_case_is_clamped_high_with_every_recommendation() {
    let result = RuleBasedScorer::new().assess(&worst_case(), SupportedLanguage::Fr);
    let texts = &SupportedLanguage::Fr.catalog().recommendations;

    assert_eq!(result.risk_score, 100);
    assert_eq!(result.risk_level, RiskLevel::High);
    assert_eq!(result.risk_label, "Risque Eleve");
    assert_eq!(result.model_version, RULE_BASED_MODEL_VERSION);
    assert!(result.shap_values.is_none());
    assert!(!result.fallback);

    let expected: Vec<String> = [
        texts.urgent,
        texts.exam,
        texts.hba1c,
        texts.crp,
        texts.kidney,
        texts.nutrition,
        texts.esr,
        texts.neuropathy,
        texts.pvd,
        texts.hygiene,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(result.recommendations, expected);
}

#[test]
fn test_default_patient_is_low_with_hygiene_only() {
    let result = RuleBasedScorer::new().assess(&FeatureVector::default(), SupportedLanguage::Fr);
    assert_eq!(result.risk_score, 4);
    assert_eq!(result.risk_level, RiskLevel::Low);
    assert_eq!(
        result.recommendations,
        vec!["Hygiene des pieds quotidienne et chaussures adaptees".to_string()]
    );
}

#[test]
fn test_moderate_case() {
    // 14 + 10 + 5 + 1 + 1 + 0 + 4 + 10
    let scorer = RuleBasedScorer::new();
    let fv = moderate_case();
    assert_eq!(scorer.score(&fv), 45);

    let result = scorer.assess(&fv, SupportedLanguage::Sw);
    let texts = &SupportedLanguage::Sw.catalog().recommendations;
    assert_eq!(result.risk_level, RiskLevel::Moderate);
    assert_eq!(result.risk_label, SupportedLanguage::Sw.risk_label(RiskLevel::Moderate));
    assert_eq!(
        result.recommendations,
        vec![
            texts.exam.to_string(),
            texts.hba1c.to_string(),
            texts.crp.to_string(),
            texts.hygiene.to_string(),
        ]
    );
}

#[test]
fn test_partial_observation_uses_defaults() {
    let scorer = RuleBasedScorer::new();
    let partial = PartialFeatureVector {
        hba1c: Some(9.5),
        ..Default::default()
    };
    // Only hba1c moves from the default band: 20 instead of 2
    assert_eq!(scorer.score_partial(&partial), 22);
    assert_eq!(scorer.score_partial(&PartialFeatureVector::default()), 4);
}

#[test]
fn test_every_language_yields_same_structure() {
    let scorer = RuleBasedScorer::new();
    let reference = scorer.assess(&worst_case(), SupportedLanguage::Fr);
    for lang in SupportedLanguage::ALL {
        let result = scorer.assess(&worst_case(), lang);
        assert_eq!(result.risk_score, reference.risk_score);
        assert_eq!(result.recommendations.len(), reference.recommendations.len());
        assert_eq!(
            result.recommendations.last().map(String::as_str),
            Some(lang.catalog().recommendations.hygiene)
        );
    }
}

#[test]
fn test_recommendations_ignore_level_argument() {
    let fv = moderate_case();
    let a = generate_recommendations(&fv, 45, RiskLevel::Moderate, SupportedLanguage::Ln);
    let b = generate_recommendations(&fv, 45, RiskLevel::High, SupportedLanguage::Ln);
    assert_eq!(a, b);
}

#[test]
fn test_documented_high_risk_patient() {
    let fv = FeatureVector {
        hba1c: 9.5,
        crp: 12.0,
        creatinine: 2.1,
        albumin: 2.2,
        esr: 45.0,
        sodium: 128.0,
        age: 72.0,
        diabetes_duration_years: 22.0,
        has_hypertension: true,
        has_neuropathy: true,
        has_pvd: true,
    };
    let result = RuleBasedScorer::new().assess(&fv, SupportedLanguage::Fr);
    assert_eq!(result.risk_score, 100);
    assert_eq!(result.risk_level, RiskLevel::High);
    assert_eq!(result.recommendations.len(), 10);
    assert_eq!(
        result.recommendations,
        RuleBasedScorer::new()
            .assess(&worst_case(), SupportedLanguage::Fr)
            .recommendations
    );
}

#[test]
fn test_documented_low_risk_patient() {
    let fv = FeatureVector {
        hba1c: 5.5,
        crp: 0.5,
        creatinine: 0.7,
        albumin: 4.2,
        esr: 5.0,
        sodium: 140.0,
        age: 25.0,
        diabetes_duration_years: 0.0,
        has_hypertension: false,
        has_neuropathy: false,
        has_pvd: false,
    };
    let result = RuleBasedScorer::new().assess(&fv, SupportedLanguage::Fr);
    assert_eq!(result.risk_score, 4);
    assert_eq!(result.risk_level, RiskLevel::Low);
    assert_eq!(result.recommendations.len(), 1);
}
