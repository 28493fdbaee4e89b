use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Result of the last release check (update_status.yaml in the cache directory)
///
/// Written by `fixum check-update`; read by the action menu to decide
/// whether to offer the update item, and by the installer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatus {
    /// A newer release than the running one exists
    #[serde(default)]
    pub available: bool,

    /// Version of that release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Download URL of the release's `.alfredworkflow` file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl UpdateStatus {
    /// Load status from a YAML file. A missing file means no update is known.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read update status: {}", path.display()))?;
        let status: UpdateStatus = serde_yml::from_str(&content)
            .with_context(|| format!("failed to parse update status: {}", path.display()))?;
        Ok(status)
    }

    /// Save status to a YAML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yml::to_string(self).context("failed to serialize update status")?;
        fs::write(path, content)
            .with_context(|| format!("failed to write update status: {}", path.display()))?;
        Ok(())
    }
}

/// True if the status file is missing or was written more than `max_age` ago
pub fn is_stale(path: &Path, max_age: Duration) -> bool {
    let modified = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(time) => time,
        Err(_) => return true,
    };

    SystemTime::now()
        .duration_since(modified)
        .map(|age| age > max_age)
        .unwrap_or(false)
}
