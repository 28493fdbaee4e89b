use std::path::Path;

use anyhow::{Context, Result};

use crate::plist::read_plist;

/// Alfred's preference file (`com.runningwithcrayons.Alfred-Preferences-3.plist`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlfredPrefs {
    /// User-configured sync folder holding `Alfred.alfredpreferences`
    ///
    /// Alfred may leave this set after sync has been turned off, so it is
    /// only ever a candidate, never trusted outright.
    pub sync_folder: Option<String>,
}

impl AlfredPrefs {
    /// Load preferences from a (usually binary) property list
    pub fn load(path: &Path) -> Result<Self> {
        let plist = read_plist(path)
            .with_context(|| format!("failed to read Alfred preferences: {}", path.display()))?;

        if plist.as_dict().is_none() {
            anyhow::bail!(
                "Alfred preferences are not a dictionary: {}",
                path.display()
            );
        }

        let sync_folder = plist
            .get_str("syncfolder")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self { sync_folder })
    }
}
