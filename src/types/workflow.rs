use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::plist::read_plist;

use super::LibraryVersion;

/// Manifest file name inside every workflow directory
pub const MANIFEST_FILE: &str = "info.plist";

/// The parts of a workflow's `info.plist` fixum cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowManifest {
    /// Display name
    pub name: String,
    /// Bundle identifier; empty when the author never set one
    pub bundle_id: String,
}

impl WorkflowManifest {
    /// Load the manifest from a workflow directory's `info.plist`
    ///
    /// A missing `bundleid` key reads as an empty bundle ID. A missing
    /// `name` is an error: Alfred always writes one.
    pub fn load(path: &Path) -> Result<Self> {
        let plist = read_plist(path)?;

        let name = plist
            .get_str("name")
            .with_context(|| format!("no 'name' in manifest: {}", path.display()))?;
        let bundle_id = plist.get_str("bundleid").unwrap_or_default();

        Ok(Self {
            name: name.to_string(),
            bundle_id: bundle_id.trim().to_string(),
        })
    }
}

/// A copy of Alfred-Workflow bundled inside a workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryInfo {
    /// The `workflow` package directory
    pub dir: PathBuf,
    /// Version read from its `version` file
    pub version: LibraryVersion,
}

/// An installed workflow that bundles Alfred-Workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub name: String,
    pub bundle_id: String,
    /// Workflow directory (contains `info.plist`)
    pub dir: PathBuf,
    pub library: LibraryInfo,
}

impl Workflow {
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Directory name under the workflows root, used in log messages
    pub fn dir_name(&self) -> String {
        self.dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.dir.display().to_string())
    }
}
