//! Validates model artifact integrity using SHA-256 checksums
//!
//! A model file may ship with a sidecar `<file>.sha256` holding the hex
//! digest (the `sha256sum` output format is accepted). When the sidecar
//! exists the artifact is only loaded if the digest matches; a tampered or
//! truncated artifact is rejected and the service stays on the rule engine.

use crate::errors::ModelError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Artifact bytes together with their checksum.
#[derive(Debug, Clone)]
pub struct VerifiedArtifact {
    pub path: PathBuf,
    pub contents: String,
    /// SHA-256 of `contents` (hex encoded)
    pub checksum: String,
    /// Whether a sidecar file was present and matched
    pub verified: bool,
}

/// Computes SHA-256 checksum of the data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Location of the sidecar checksum file for `path`.
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Reads an artifact and checks it against its sidecar, if any.
///
/// # Returns
///
/// * `Ok(VerifiedArtifact)` - artifact contents; `verified` tells whether a checksum was checked.
/// * `Err(ModelError::Artifact)` - unreadable file, unreadable sidecar, or checksum mismatch.
pub fn read_verified(path: &Path) -> Result<VerifiedArtifact, ModelError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ModelError::Artifact(format!("failed to read {}: {}", path.display(), e)))?;
    let checksum = compute_checksum(&bytes);

    let sidecar = sidecar_path(path);
    let verified = if sidecar.exists() {
        let expected = std::fs::read_to_string(&sidecar).map_err(|e| {
            ModelError::Artifact(format!("failed to read {}: {}", sidecar.display(), e))
        })?;
        let expected = expected
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if expected != checksum {
            // Checksum mismatch - artifact corrupted or replaced
            tracing::warn!(
                "Model artifact checksum mismatch for {}. Expected: {}, computed: {}",
                path.display(),
                expected,
                checksum
            );
            return Err(ModelError::Artifact(format!(
                "checksum mismatch for {}",
                path.display()
            )));
        }
        true
    } else {
        false
    };

    let contents = String::from_utf8(bytes).map_err(|_| {
        ModelError::Artifact(format!("{} is not valid UTF-8", path.display()))
    })?;

    Ok(VerifiedArtifact {
        path: path.to_path_buf(),
        contents,
        checksum,
        verified,
    })
}
