//! Persisted buildpack state.
//!
//! The state file is a JSON object mapping buildpack GUID to the last
//! `updated_at` this program acted on:
//!
//! ```json
//! {
//!   "1f3c8e2a-...": { "LastUpdatedAt": "2020-06-01T00:00:00Z" }
//! }
//! ```
//!
//! It is read once at startup and written once at the end of the run. A dry
//! run never advances it: [`copy_state`] reproduces the input byte for byte
//! instead of serialising the in-memory map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::core::NotifierError;
use crate::utils::fs::atomic_write;

/// Last observed update of one buildpack.
///
/// Per key, the stored timestamp never moves backwards: a record is only
/// replaced when the platform reports a strictly later `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackRecord {
    /// RFC 3339 timestamp as reported by the platform.
    #[serde(rename = "LastUpdatedAt")]
    pub last_updated_at: String,
}

impl BuildpackRecord {
    pub fn new(last_updated_at: impl Into<String>) -> Self {
        Self {
            last_updated_at: last_updated_at.into(),
        }
    }
}

/// Buildpack GUID to record, ordered so that saved files are stable.
pub type BuildpackState = BTreeMap<String, BuildpackRecord>;

/// Load state from `path`. A missing or unparseable file is fatal.
pub fn load_state(path: &Path) -> Result<BuildpackState, NotifierError> {
    let content = std::fs::read(path).map_err(|e| NotifierError::StateLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let state: BuildpackState =
        serde_json::from_slice(&content).map_err(|e| NotifierError::StateLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    debug!(path = %path.display(), records = state.len(), "Loaded buildpack state");
    Ok(state)
}

/// Atomically persist `state` to `path`.
pub fn save_state(state: &BuildpackState, path: &Path) -> Result<(), NotifierError> {
    let mut content = serde_json::to_vec(state).map_err(|e| NotifierError::StateSave {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    content.push(b'\n');

    atomic_write(path, &content).map_err(|e| NotifierError::StateSave {
        path: path.display().to_string(),
        reason: format!("{e:#}"),
    })?;

    debug!(path = %path.display(), records = state.len(), "Saved buildpack state");
    Ok(())
}

/// Copy the input state file to the output path unchanged (dry run).
pub fn copy_state(in_path: &Path, out_path: &Path) -> Result<(), NotifierError> {
    let content = std::fs::read(in_path).map_err(|e| NotifierError::StateLoad {
        path: in_path.display().to_string(),
        reason: e.to_string(),
    })?;

    atomic_write(out_path, &content).map_err(|e| NotifierError::StateSave {
        path: out_path.display().to_string(),
        reason: format!("{e:#}"),
    })?;

    debug!(from = %in_path.display(), to = %out_path.display(), "Copied buildpack state unchanged");
    Ok(())
}
