//! Model artifacts
//!
//! A trained predictor is written as a versioned JSON document. Floats are
//! written in shortest round-trip form, so a reloaded model predicts exactly
//! what the saved one did.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::Predictor;
use crate::{FootballError, Result};

/// Bumped whenever the artifact layout changes
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct ArtifactRef<'a> {
    format_version: u32,
    predictor: &'a Predictor,
}

#[derive(Deserialize)]
struct Artifact {
    format_version: u32,
    predictor: Predictor,
}

#[derive(Deserialize)]
struct ArtifactHeader {
    format_version: u32,
}

fn persistence_error(path: &Path, message: impl ToString) -> FootballError {
    FootballError::Persistence {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

/// Write a predictor to `path`, replacing any previous artifact
pub fn save<P: AsRef<Path>>(predictor: &Predictor, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| persistence_error(path, e))?;
        }
    }

    let artifact = ArtifactRef {
        format_version: FORMAT_VERSION,
        predictor,
    };
    let json = serde_json::to_string(&artifact).map_err(|e| persistence_error(path, e))?;

    // Write beside the target, then rename over it
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| persistence_error(path, e))?;
    std::fs::rename(&tmp, path).map_err(|e| persistence_error(path, e))?;

    log::info!("Saved {} model to {}", predictor.kind(), path.display());
    Ok(())
}

/// Read a predictor back from `path`
pub fn load<P: AsRef<Path>>(path: P) -> Result<Predictor> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| persistence_error(path, e))?;

    let header: ArtifactHeader =
        serde_json::from_str(&json).map_err(|e| persistence_error(path, e))?;
    if header.format_version != FORMAT_VERSION {
        return Err(persistence_error(
            path,
            format!(
                "format version {} is not supported (expected {})",
                header.format_version, FORMAT_VERSION
            ),
        ));
    }

    let artifact: Artifact = serde_json::from_str(&json).map_err(|e| persistence_error(path, e))?;
    log::info!(
        "Loaded {} model (format {}) from {}",
        artifact.predictor.kind(),
        artifact.format_version,
        path.display()
    );
    Ok(artifact.predictor)
}
