//! Diabetic Foot Risk API Library
//!
//! Scores the risk of diabetic foot complications from routine lab values and
//! clinical flags. A learned gradient-boosting model is used when its
//! artifacts are present; a deterministic rule engine serves otherwise and
//! whenever the learned path fails.
//!
//! # Modules
//!
//! - `api`: API-layer namespace.
//! - `core`: Domain model namespace.
//! - `artifact_validator`: Checksum validation of model artifacts.
//! - `config`: Configuration management.
//! - `ensemble`: LightGBM tree dump parsing and inference.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `language`: Supported languages and localized texts.
//! - `learned_model`: Learned model adapter and loader.
//! - `models`: Core data models.
//! - `orchestrator`: Validation, path selection and fallback.
//! - `recommendations`: Clinical recommendation generation.
//! - `rule_based`: Rule-based scorer.
//! - `synthetic`: Ground-truth model and synthetic dataset generation.
//! - `tree_shap`: TreeSHAP attributions.

pub mod api;
pub mod core;

// Re-export primary modules for shared use in tests and other binaries
pub mod artifact_validator;
pub mod config;
pub mod ensemble;
pub mod errors;
pub mod handlers;
pub mod language;
pub mod learned_model;
pub mod models;
pub mod orchestrator;
pub mod recommendations;
pub mod rule_based;
pub mod synthetic;
pub mod tree_shap;
