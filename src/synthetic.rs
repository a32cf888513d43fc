//! Synthetic ground truth for diabetic foot risk.
//!
//! Two parts, both reproducible from a seed:
//!
//! - a population sampler drawing biomarkers from distributions typical of a
//!   diabetic clinic population, with comorbidity correlations;
//! - a non-linear risk function with smooth per-factor curves and explicit
//!   interaction terms, plus Gaussian measurement noise.
//!
//! The risk function is what the gradient-boosting models are trained to
//! approximate. It is a different theory of risk from the threshold bands in
//! [`crate::rule_based`] and the two must stay separate: the gap between them
//! is the non-linear structure a learned model has to pick up.

use crate::models::{FeatureVector, RiskLevel, FEATURE_NAMES};
use crate::rule_based::clamp_score;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::io::Write;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_SAMPLES: usize = 5000;

/// Standard deviation of the measurement noise added to the true score.
pub const NOISE_SIGMA: f64 = 3.0;

// ============ Sampling ============

/// Draws reproducible patient populations.
pub struct PopulationSampler {
    rng: ChaCha8Rng,
}

impl PopulationSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws one patient. Every field is clipped to its clinically valid range.
    pub fn sample_patient(&mut self) -> FeatureVector {
        let rng = &mut self.rng;

        let hba1c = normal(rng, 7.5, 1.8).clamp(4.0, 15.0);
        // Most patients low, a long tail of inflamed ones
        let crp = log_normal(rng, 1.0, 1.0).clamp(0.1, 100.0);
        let creatinine = normal(rng, 1.2, 0.6).clamp(0.4, 10.0);
        let albumin = normal(rng, 3.8, 0.7).clamp(1.5, 5.5);
        let esr = log_normal(rng, 2.5, 0.7).clamp(1.0, 120.0);
        let sodium = normal(rng, 139.0, 4.0).clamp(120.0, 155.0);
        let age = normal(rng, 58.0, 15.0).clamp(18.0, 95.0).trunc();
        let diabetes_duration_years = exponential(rng, 10.0).clamp(0.0, 45.0).trunc();

        let mut has_hypertension = rng.gen_bool(0.60);
        let mut has_neuropathy = rng.gen_bool(0.30);
        let mut has_pvd = rng.gen_bool(0.20);

        // Adjustment draws are taken for every patient so the stream stays
        // aligned regardless of which conditions hold.
        let neuropathy_draw: f64 = rng.gen();
        let pvd_draw: f64 = rng.gen();
        let hypertension_draw: f64 = rng.gen();

        if diabetes_duration_years > 15.0 {
            has_neuropathy |= neuropathy_draw < 0.4;
            has_pvd |= pvd_draw < 0.25;
        }
        if age > 65.0 {
            has_hypertension |= hypertension_draw < 0.3;
        }

        FeatureVector {
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
        }
    }

    pub fn sample_population(&mut self, n: usize) -> Vec<FeatureVector> {
        (0..n).map(|_| self.sample_patient()).collect()
    }

    /// Measurement noise, N(0, sigma).
    pub fn noise(&mut self, sigma: f64) -> f64 {
        normal(&mut self.rng, 0.0, sigma)
    }
}

/// Box-Muller transform.
fn standard_normal(rng: &mut impl Rng) -> f64 {
    // 1 - [0, 1) keeps u1 away from zero
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn normal(rng: &mut impl Rng, mean: f64, std_dev: f64) -> f64 {
    mean + std_dev * standard_normal(rng)
}

fn log_normal(rng: &mut impl Rng, mu: f64, sigma: f64) -> f64 {
    normal(rng, mu, sigma).exp()
}

fn exponential(rng: &mut impl Rng, scale: f64) -> f64 {
    let u: f64 = rng.gen();
    -scale * (1.0 - u).ln()
}

// ============ Risk Function ============

/// Non-linear interaction terms layered on top of the per-factor curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    /// Neuropathy with poor glycemic control; grows with HbA1c.
    NeuropathyHyperglycemia,
    /// PVD with low albumin, i.e. poor healing capacity.
    PvdHypoalbuminemia,
    /// Elderly patient with long-standing diabetes.
    AgeDuration,
    /// Neuropathy, PVD and inflammation together.
    TripleThreat,
    /// Renal impairment with inflammation.
    RenalInflammation,
    /// Hypertension with PVD.
    VascularSynergy,
}

impl Interaction {
    pub const ALL: [Interaction; 6] = [
        Interaction::NeuropathyHyperglycemia,
        Interaction::PvdHypoalbuminemia,
        Interaction::AgeDuration,
        Interaction::TripleThreat,
        Interaction::RenalInflammation,
        Interaction::VascularSynergy,
    ];

    /// Bonus points for this term, 0.0 when its condition does not hold.
    /// Never negative.
    pub fn bonus(&self, fv: &FeatureVector) -> f64 {
        match self {
            Interaction::NeuropathyHyperglycemia if fv.has_neuropathy && fv.hba1c >= 8.0 => {
                6.0 * (1.0 + (fv.hba1c - 8.0) * 0.3)
            }
            Interaction::PvdHypoalbuminemia if fv.has_pvd && fv.albumin < 3.5 => {
                5.0 * (1.0 + (3.5 - fv.albumin) * 0.8)
            }
            Interaction::AgeDuration if fv.age >= 65.0 && fv.diabetes_duration_years >= 15.0 => {
                4.0
            }
            Interaction::TripleThreat if fv.has_neuropathy && fv.has_pvd && fv.crp >= 5.0 => 7.0,
            Interaction::RenalInflammation if fv.creatinine >= 1.5 && fv.crp >= 5.0 => 4.0,
            Interaction::VascularSynergy if fv.has_hypertension && fv.has_pvd => 3.0,
            _ => 0.0,
        }
    }
}

/// Whether the interaction terms take part in the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Enabled,
    Disabled,
}

/// The "true" risk function the learned models approximate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroundTruthModel {
    pub interactions: InteractionMode,
}

impl GroundTruthModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_interactions() -> Self {
        Self {
            interactions: InteractionMode::Disabled,
        }
    }

    /// Sum of the smooth per-factor curves and comorbidity points.
    pub fn base_score(&self, fv: &FeatureVector) -> f64 {
        let mut score = 0.0;

        // HbA1c: accelerating above 7.5, steepest between 7.5 and 9
        score += if fv.hba1c >= 9.0 {
            18.0 + (fv.hba1c - 9.0) * 2.0
        } else if fv.hba1c >= 7.5 {
            8.0 + (fv.hba1c - 7.5) * 6.67
        } else if fv.hba1c >= 6.5 {
            3.0 + (fv.hba1c - 6.5) * 5.0
        } else {
            ((fv.hba1c - 4.0) * 1.2).max(0.0)
        };

        score += (fv.crp.ln_1p() * 3.2).min(15.0);

        score += if fv.creatinine >= 2.0 {
            14.0
        } else if fv.creatinine >= 1.3 {
            5.0 + (fv.creatinine - 1.3) * 12.86
        } else if fv.creatinine >= 1.0 {
            (fv.creatinine - 1.0) * 16.67
        } else {
            0.0
        };

        score += if fv.albumin < 2.5 {
            10.0
        } else if fv.albumin < 3.5 {
            10.0 - (fv.albumin - 2.5) * 4.0
        } else {
            (2.0 - (fv.albumin - 3.5) * 2.0).max(0.0)
        };

        score += (fv.esr.ln_1p() * 2.0).min(10.0);

        score += if fv.sodium < 130.0 {
            5.0
        } else if fv.sodium < 135.0 {
            (135.0 - fv.sodium) * 0.6
        } else {
            0.0
        };

        score += if fv.age >= 70.0 {
            9.0
        } else if fv.age >= 60.0 {
            4.0 + (fv.age - 60.0) * 0.5
        } else if fv.age >= 50.0 {
            (fv.age - 50.0) * 0.4
        } else {
            0.0
        };

        score += (fv.diabetes_duration_years * 0.7).min(14.0);

        if fv.has_neuropathy {
            score += 5.0;
        }
        if fv.has_pvd {
            score += 5.0;
        }
        if fv.has_hypertension {
            score += 3.0;
        }

        score
    }

    /// Sum of all interaction bonuses, zero when interactions are disabled.
    pub fn interaction_score(&self, fv: &FeatureVector) -> f64 {
        match self.interactions {
            InteractionMode::Enabled => Interaction::ALL.iter().map(|i| i.bonus(fv)).sum(),
            InteractionMode::Disabled => 0.0,
        }
    }

    /// Interactions that fire for this patient, with their bonus.
    pub fn active_interactions(&self, fv: &FeatureVector) -> Vec<(Interaction, f64)> {
        if self.interactions == InteractionMode::Disabled {
            return Vec::new();
        }
        Interaction::ALL
            .iter()
            .map(|i| (*i, i.bonus(fv)))
            .filter(|(_, bonus)| *bonus > 0.0)
            .collect()
    }

    /// Noise-free continuous score. Not clamped.
    pub fn raw_score(&self, fv: &FeatureVector) -> f64 {
        self.base_score(fv) + self.interaction_score(fv)
    }

    /// Final label: raw score plus noise, rounded and clamped to [0, 100].
    pub fn label(&self, fv: &FeatureVector, noise: f64) -> (u8, RiskLevel) {
        let score = clamp_score(self.raw_score(fv) + noise);
        (score, RiskLevel::from_score(score))
    }
}

// ============ Dataset ============

/// One training row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    #[serde(flatten)]
    pub features: FeatureVector,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDataset {
    pub seed: u64,
    pub records: Vec<LabeledRecord>,
}

/// Generates `n` labeled patients from `seed` using the full ground-truth model.
pub fn generate_dataset(n: usize, seed: u64) -> SyntheticDataset {
    generate_dataset_with(GroundTruthModel::new(), n, seed)
}

pub fn generate_dataset_with(model: GroundTruthModel, n: usize, seed: u64) -> SyntheticDataset {
    let mut sampler = PopulationSampler::new(seed);
    let population = sampler.sample_population(n);

    // Noise is drawn after the whole population, one value per patient
    let records = population
        .into_iter()
        .map(|features| {
            let noise = sampler.noise(NOISE_SIGMA);
            let (risk_score, risk_level) = model.label(&features, noise);
            LabeledRecord {
                features,
                risk_score,
                risk_level,
            }
        })
        .collect();

    SyntheticDataset { seed, records }
}

impl SyntheticDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record counts for low, moderate and high.
    pub fn level_counts(&self) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for record in &self.records {
            counts[record.risk_level as usize] += 1;
        }
        counts
    }

    /// Writes the dataset as CSV: the 11 features, then `risk_score,risk_level`.
    ///
    /// Floats use a fixed four-decimal format so output is byte-stable.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(writer, "{},risk_score,risk_level", FEATURE_NAMES.join(","))?;
        for r in &self.records {
            let f = &r.features;
            writeln!(
                writer,
                "{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{},{},{},{},{},{},{}",
                f.hba1c,
                f.crp,
                f.creatinine,
                f.albumin,
                f.esr,
                f.sodium,
                f.age as i64,
                f.diabetes_duration_years as i64,
                u8::from(f.has_hypertension),
                u8::from(f.has_neuropathy),
                u8::from(f.has_pvd),
                r.risk_score,
                r.risk_level,
            )?;
        }
        writer.flush()
    }
}

// ============ Agreement ============

/// How closely a scorer reproduces the ground-truth labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreAgreement {
    /// Records the scorer produced a result for.
    pub samples: usize,
    /// Records the scorer declined or failed on.
    pub skipped: usize,
    /// Mean absolute error in score points.
    pub mae: f64,
    /// Coefficient of determination against the labeled scores.
    pub r2: f64,
    /// Share of scored records whose level matches the label.
    pub level_agreement: f64,
    /// Levels the scorer assigned, indexed low, moderate, high.
    pub level_counts: [usize; 3],
}

impl ScoreAgreement {
    /// Compares `scorer` with the labels in `records`. Records the scorer
    /// returns `None` for are counted as skipped. Returns `None` when nothing
    /// was scored.
    pub fn measure<F>(records: &[LabeledRecord], mut scorer: F) -> Option<Self>
    where
        F: FnMut(&FeatureVector) -> Option<(u8, RiskLevel)>,
    {
        let mut scored = Vec::with_capacity(records.len());
        let mut skipped = 0usize;
        for record in records {
            match scorer(&record.features) {
                Some(prediction) => scored.push((record, prediction)),
                None => skipped += 1,
            }
        }
        if scored.is_empty() {
            return None;
        }

        let n = scored.len() as f64;
        let mean_truth = scored
            .iter()
            .map(|(r, _)| r.risk_score as f64)
            .sum::<f64>()
            / n;

        let mut abs_err = 0.0;
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        let mut matches = 0usize;
        let mut level_counts = [0usize; 3];

        for (record, (score, level)) in &scored {
            let truth = record.risk_score as f64;
            let diff = *score as f64 - truth;
            abs_err += diff.abs();
            ss_res += diff * diff;
            ss_tot += (truth - mean_truth).powi(2);
            if *level == record.risk_level {
                matches += 1;
            }
            level_counts[*level as usize] += 1;
        }

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else {
            0.0
        };

        Some(Self {
            samples: scored.len(),
            skipped,
            mae: abs_err / n,
            r2,
            level_agreement: matches as f64 / n,
            level_counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_patient() -> FeatureVector {
        FeatureVector {
            hba1c: 5.0,
            crp: 0.0,
            creatinine: 0.8,
            albumin: 4.5,
            esr: 0.0,
            sodium: 140.0,
            age: 30.0,
            diabetes_duration_years: 0.0,
            has_hypertension: false,
            has_neuropathy: false,
            has_pvd: false,
        }
    }

    #[test]
    fn test_quiet_patient_base_score() {
        // Only HbA1c contributes: (5.0 - 4.0) * 1.2
        let model = GroundTruthModel::new();
        let score = model.raw_score(&quiet_patient());
        assert!((score - 1.2).abs() < 1e-9, "score = {}", score);
    }

    #[test]
    fn test_hba1c_curve_is_continuous_at_knots() {
        let model = GroundTruthModel::without_interactions();
        let at = |hba1c: f64| {
            model.base_score(&FeatureVector {
                hba1c,
                ..quiet_patient()
            })
        };
        assert!((at(6.5) - 3.0).abs() < 1e-9);
        // Left limit at 9.0 is 8 + 1.5 * 6.67 = 18.005
        assert!((at(8.9999) - 18.0).abs() < 0.01);
        assert!((at(9.0) - 18.0).abs() < 1e-9);
        assert!(at(12.0) > at(9.0));
    }

    #[test]
    fn test_each_interaction_fires() {
        let fv = FeatureVector {
            hba1c: 10.0,
            crp: 6.0,
            creatinine: 1.6,
            albumin: 3.0,
            age: 70.0,
            diabetes_duration_years: 20.0,
            has_hypertension: true,
            has_neuropathy: true,
            has_pvd: true,
            ..quiet_patient()
        };
        let model = GroundTruthModel::new();
        let active = model.active_interactions(&fv);
        assert_eq!(active.len(), 6);

        let neuro = Interaction::NeuropathyHyperglycemia.bonus(&fv);
        assert!((neuro - 6.0 * 1.6).abs() < 1e-9);
        let pvd = Interaction::PvdHypoalbuminemia.bonus(&fv);
        assert!((pvd - 5.0 * 1.4).abs() < 1e-9);

        let expected = neuro + pvd + 4.0 + 7.0 + 4.0 + 3.0;
        assert!((model.interaction_score(&fv) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_interactions_contribute_nothing() {
        let fv = FeatureVector {
            hba1c: 11.0,
            has_neuropathy: true,
            ..quiet_patient()
        };
        let model = GroundTruthModel::without_interactions();
        assert_eq!(model.interaction_score(&fv), 0.0);
        assert!(model.active_interactions(&fv).is_empty());
    }

    #[test]
    fn test_label_clamps() {
        let model = GroundTruthModel::new();
        let (score, level) = model.label(&quiet_patient(), -50.0);
        assert_eq!(score, 0);
        assert_eq!(level, RiskLevel::Low);
    }

    #[test]
    fn test_samplers_are_seeded() {
        let mut a = PopulationSampler::new(7);
        let mut b = PopulationSampler::new(7);
        assert_eq!(a.sample_population(20), b.sample_population(20));
    }

    #[test]
    fn test_exponential_is_non_negative() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(exponential(&mut rng, 10.0) >= 0.0);
            assert!(standard_normal(&mut rng).is_finite());
        }
    }

    #[test]
    fn test_agreement_of_perfect_scorer() {
        let dataset = generate_dataset(200, 3);
        let lookup: Vec<(u8, RiskLevel)> = dataset
            .records
            .iter()
            .map(|r| (r.risk_score, r.risk_level))
            .collect();
        let mut idx = 0;
        let agreement = ScoreAgreement::measure(&dataset.records, |_| {
            let out = lookup[idx];
            idx += 1;
            Some(out)
        })
        .unwrap();
        assert_eq!(agreement.mae, 0.0);
        assert_eq!(agreement.level_agreement, 1.0);
        assert_eq!(agreement.skipped, 0);
        assert_eq!(agreement.level_counts, dataset.level_counts());
        assert!(ScoreAgreement::measure(&[], |_| Some((0, RiskLevel::Low))).is_none());
    }

    #[test]
    fn test_agreement_skips_failed_records() {
        let dataset = generate_dataset(10, 3);
        let mut idx = 0;
        let agreement = ScoreAgreement::measure(&dataset.records, |_| {
            idx += 1;
            (idx % 2 == 0).then_some((90, RiskLevel::High))
        })
        .unwrap();
        assert_eq!(agreement.samples, 5);
        assert_eq!(agreement.skipped, 5);
        assert_eq!(agreement.level_counts, [0, 0, 5]);

        assert!(ScoreAgreement::measure(&dataset.records, |_| None).is_none());
    }
}
