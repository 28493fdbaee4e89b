use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::types::{ASSUMED_VERSION, LibraryInfo, LibraryVersion};

/// Name of the Alfred-Workflow package directory
pub const LIBRARY_DIR_NAME: &str = "workflow";

/// Main module of the package
pub const LIBRARY_MAIN_FILE: &str = "workflow.py";

/// Version file inside the package
pub const LIBRARY_VERSION_FILE: &str = "version";

/// Author line present in every genuine `workflow.py`
///
/// Other libraries also ship a `workflow/workflow.py`; those must be left
/// alone.
pub const LIBRARY_SIGNATURE: &str = "Dean Jackson <deanishe@deanishe.net>";

/// Find the bundled copy of Alfred-Workflow inside a workflow directory
///
/// Walks at most `max_depth` levels below `workflow_dir`, in file-name
/// order, without following symlinks, and stops at the first genuine copy.
/// Returns `Ok(None)` if there is none, and an error if the copy's version
/// file cannot be read or parsed.
pub fn find_library(workflow_dir: &Path, max_depth: usize) -> Result<Option<LibraryInfo>> {
    let walker = WalkDir::new(workflow_dir)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        if !entry.file_type().is_dir() || entry.file_name() != LIBRARY_DIR_NAME {
            continue;
        }

        let main_file = entry.path().join(LIBRARY_MAIN_FILE);
        if !main_file.is_file() {
            continue;
        }

        if !is_genuine(&main_file)? {
            debug!("non-AW workflow.py ignored: {}", main_file.display());
            continue;
        }

        let version = read_version(entry.path(), workflow_dir)?;
        return Ok(Some(LibraryInfo {
            dir: entry.into_path(),
            version,
        }));
    }

    Ok(None)
}

/// Read the version of a library copy bundled in `workflow_dir`
///
/// A missing version file means a release old enough to predate it.
pub fn read_version(library_dir: &Path, workflow_dir: &Path) -> Result<LibraryVersion> {
    let path = library_dir.join(LIBRARY_VERSION_FILE);
    if !path.exists() {
        warn!(
            "no version file in {}, assuming a very old version",
            workflow_dir.display()
        );
        return Ok(ASSUMED_VERSION);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read library version: {}", path.display()))?;
    LibraryVersion::parse(&content)
        .with_context(|| format!("invalid library version in {}", path.display()))
}

/// Read the version of the reference copy, which must have a version file
pub fn reference_version(library_dir: &Path) -> Result<LibraryVersion> {
    let path = library_dir.join(LIBRARY_VERSION_FILE);
    let content = fs::read_to_string(&path).with_context(|| {
        format!("failed to read reference library version: {}", path.display())
    })?;
    LibraryVersion::parse(&content)
        .with_context(|| format!("invalid reference library version in {}", path.display()))
}

fn is_genuine(main_file: &Path) -> Result<bool> {
    let bytes = fs::read(main_file)
        .with_context(|| format!("failed to read {}", main_file.display()))?;
    Ok(String::from_utf8_lossy(&bytes).contains(LIBRARY_SIGNATURE))
}
