//! Generates the synthetic training dataset and reports how the scorers
//! compare with its ground-truth labels.

use dotenvy::dotenv;
use foot_risk_api::language::SupportedLanguage;
use foot_risk_api::learned_model::load_from_dir;
use foot_risk_api::models::RiskLevel;
use foot_risk_api::rule_based::RuleBasedScorer;
use foot_risk_api::synthetic::{generate_dataset, ScoreAgreement, DEFAULT_SAMPLES, DEFAULT_SEED};
use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, v)),
        _ => Ok(default),
    }
}

fn print_agreement(name: &str, agreement: &ScoreAgreement) {
    println!(
        "{:<12} MAE {:>6.2}  R2 {:>6.3}  level agreement {:>5.1}%  ({} scored, {} skipped)",
        name,
        agreement.mae,
        agreement.r2,
        agreement.level_agreement * 100.0,
        agreement.samples,
        agreement.skipped
    );
    let levels: Vec<String> = RiskLevel::ALL
        .iter()
        .zip(agreement.level_counts)
        .map(|(level, count)| format!("{} {}", level.as_str(), count))
        .collect();
    println!("{:<12} predicted levels: {}", "", levels.join(", "));
}

/// Main entry point for the dataset generator.
///
/// Writes the labeled CSV, prints the level distribution, then scores every
/// record with the rule engine (and the learned models, if loadable).
fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let seed: u64 = env_or("SYNTHETIC_SEED", DEFAULT_SEED)?;
    let samples: usize = env_or("SYNTHETIC_SAMPLES", DEFAULT_SAMPLES)?;
    let output = PathBuf::from(
        env::var("SYNTHETIC_OUTPUT").unwrap_or_else(|_| "training/synthetic_data.csv".to_string()),
    );
    let models_dir = PathBuf::from(env::var("MODELS_DIR").unwrap_or_else(|_| "models".to_string()));

    let dataset = generate_dataset(samples, seed);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    dataset.write_csv(BufWriter::new(File::create(&output)?))?;
    println!(
        "Wrote {} records (seed {}) to {}",
        dataset.len(),
        dataset.seed,
        output.display()
    );

    println!("Level distribution:");
    for (level, count) in RiskLevel::ALL.iter().zip(dataset.level_counts()) {
        let share = if dataset.is_empty() {
            0.0
        } else {
            count as f64 * 100.0 / dataset.len() as f64
        };
        println!("  {:<9} {:>6} ({:.1}%)", level.as_str(), count, share);
    }

    println!();
    println!("Agreement with ground truth:");
    let rules = RuleBasedScorer::new();
    if let Some(agreement) = ScoreAgreement::measure(&dataset.records, |fv| {
        let score = rules.score(fv);
        Some((score, RiskLevel::from_score(score)))
    }) {
        print_agreement("rule_based", &agreement);
    }

    match load_from_dir(&models_dir, false) {
        Ok(Some(adapter)) => {
            // Failed records are skipped rather than replaced by rule scores
            match ScoreAgreement::measure(&dataset.records, |fv| {
                adapter
                    .predict(fv, SupportedLanguage::Fr)
                    .ok()
                    .map(|r| (r.risk_score, r.risk_level))
            }) {
                Some(agreement) => print_agreement("lightgbm", &agreement),
                None => println!("lightgbm     failed on all {} records", dataset.len()),
            }
        }
        Ok(None) => println!("No learned models in {}", models_dir.display()),
        Err(e) => println!("Learned models unusable: {}", e),
    }

    Ok(())
}
