//! Helpers shared by the integration tests: minimal LightGBM dumps written
//! into a temporary models directory.
#![allow(dead_code)]

use foot_risk_api::artifact_validator::{compute_checksum, sidecar_path};
use foot_risk_api::learned_model::{CLASSIFIER_FILE, REGRESSOR_FILE};
use foot_risk_api::models::FEATURE_NAMES;
use serde_json::{json, Value};
use std::path::Path;

fn leaf(value: f64, count: u32) -> Value {
    json!({"leaf_value": value, "leaf_count": count})
}

/// Split on hba1c (column 0) at 7.0.
fn hba1c_split(left: Value, right: Value, count: u32) -> Value {
    json!({
        "split_index": 0,
        "split_feature": 0,
        "threshold": 7.0,
        "decision_type": "<=",
        "default_left": true,
        "internal_value": 0.0,
        "internal_count": count,
        "left_child": left,
        "right_child": right
    })
}

/// Score 20 when hba1c <= 7, else 70. Baseline (cover-weighted) is 40.
pub fn regressor_dump() -> Value {
    json!({
        "name": "tree",
        "num_class": 1,
        "num_tree_per_iteration": 1,
        "objective": "regression",
        "feature_names": FEATURE_NAMES,
        "tree_info": [
            {"tree_index": 0, "tree_structure": hba1c_split(leaf(20.0, 60), leaf(70.0, 40), 100)}
        ]
    })
}

/// Low when hba1c <= 7, high otherwise.
pub fn classifier_dump() -> Value {
    json!({
        "name": "tree",
        "num_class": 3,
        "num_tree_per_iteration": 3,
        "objective": "multiclass num_class:3",
        "feature_names": FEATURE_NAMES,
        "tree_info": [
            {"tree_index": 0, "tree_structure": hba1c_split(leaf(1.0, 60), leaf(-1.0, 40), 100)},
            {"tree_index": 1, "tree_structure": {"leaf_value": 0.0}},
            {"tree_index": 2, "tree_structure": hba1c_split(leaf(-1.0, 60), leaf(1.0, 40), 100)}
        ]
    })
}

pub fn write_dump(dir: &Path, file: &str, dump: &Value) {
    std::fs::write(dir.join(file), dump.to_string()).unwrap();
}

pub fn write_models(dir: &Path) {
    write_dump(dir, REGRESSOR_FILE, &regressor_dump());
    write_dump(dir, CLASSIFIER_FILE, &classifier_dump());
}

/// Writes a matching `.sha256` sidecar for `file`.
pub fn sign(dir: &Path, file: &str) {
    let path = dir.join(file);
    let digest = compute_checksum(&std::fs::read(&path).unwrap());
    std::fs::write(sidecar_path(&path), digest).unwrap();
}

pub fn valid_body() -> Value {
    json!({
        "hba1c": 8.0,
        "crp": 4.0,
        "creatinine": 1.1,
        "albumin": 3.9,
        "esr": 15,
        "sodium": 138,
        "age": 55,
        "diabetes_duration_years": 12
    })
}
