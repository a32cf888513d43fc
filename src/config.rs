use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub models_dir: PathBuf,
    pub shap_enabled: bool,
    /// Requests per second per client IP on `/predict`; 0 disables the limiter.
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            models_dir: PathBuf::from("models"),
            shap_enabled: true,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Models directory: {}", config.models_dir.display());
        tracing::debug!("SHAP enabled: {}", config.shap_enabled);
        if config.rate_limit_per_second == 0 {
            tracing::info!("Rate limiting disabled");
        } else {
            tracing::debug!(
                "Rate limit: {} req/s per IP, burst {}",
                config.rate_limit_per_second,
                config.rate_limit_burst
            );
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            port: match var("PORT") {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
                None => defaults.port,
            },
            models_dir: var("MODELS_DIR")
                .map(|v| PathBuf::from(v.trim()))
                .unwrap_or(defaults.models_dir),
            shap_enabled: match var("SHAP_ENABLED") {
                Some(v) => parse_bool(&v)
                    .ok_or_else(|| anyhow::anyhow!("SHAP_ENABLED must be true or false"))?,
                None => defaults.shap_enabled,
            },
            rate_limit_per_second: match var("RATE_LIMIT_PER_SECOND") {
                Some(v) => v.trim().parse().map_err(|_| {
                    anyhow::anyhow!("RATE_LIMIT_PER_SECOND must be a non-negative integer")
                })?,
                None => defaults.rate_limit_per_second,
            },
            rate_limit_burst: match var("RATE_LIMIT_BURST") {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("RATE_LIMIT_BURST must be a positive integer"))
                    .and_then(|burst: u32| {
                        if burst == 0 {
                            anyhow::bail!("RATE_LIMIT_BURST cannot be zero");
                        }
                        Ok(burst)
                    })?,
                None => defaults.rate_limit_burst,
            },
            max_body_bytes: match var("MAX_BODY_BYTES") {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a positive integer"))
                    .and_then(|limit: usize| {
                        if limit == 0 {
                            anyhow::bail!("MAX_BODY_BYTES cannot be zero");
                        }
                        Ok(limit)
                    })?,
                None => defaults.max_body_bytes,
            },
        };

        Ok(config)
    }

    pub fn rate_limit_enabled(&self) -> bool {
        self.rate_limit_per_second > 0
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
