use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default depth of the walk that looks for a bundled library copy
pub const DEFAULT_SEARCH_DEPTH: usize = 6;

/// User configuration (config.yaml in the data directory)
///
/// Every field is optional; the file itself may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Reference copy of Alfred-Workflow installed into outdated workflows
    /// (default: `workflow/` next to the executable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_dir: Option<PathBuf>,

    /// Alfred preference file to read the sync folder from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PathBuf>,

    /// Maximum directory depth searched for a bundled library
    #[serde(default = "default_search_depth")]
    pub search_depth: usize,
}

fn default_search_depth() -> usize {
    DEFAULT_SEARCH_DEPTH
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library_dir: None,
            preferences: None,
            search_depth: DEFAULT_SEARCH_DEPTH,
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: Config = serde_yml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        Ok(config)
    }
}
