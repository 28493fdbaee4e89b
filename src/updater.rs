//! Replacing a bundled Alfred-Workflow copy with the reference copy.
//!
//! The outdated copy is never deleted: it is renamed to `workflow.old`
//! (or `workflow.old.1`, `workflow.old.2`, ...) before the new copy goes in.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use filetime::FileTime;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::types::Workflow;

/// Suffix of the backup of a replaced library copy
pub const BACKUP_SUFFIX: &str = ".old";

/// Empty file telling Alfred the library has been version-checked
pub const VERSION_CHECKED_MARKER: &str = ".alfredversionchecked";

/// Replace a workflow's bundled library with the reference copy
///
/// Returns the path the old copy was moved to.
pub fn update_workflow(workflow: &Workflow, reference: &Path) -> Result<PathBuf> {
    let library_dir = &workflow.library.dir;
    info!("    updating \"{}\" ...", workflow.name);

    let backup = backup_path(library_dir);
    debug!(
        "    moving {} to {} ...",
        library_dir.display(),
        backup.display()
    );
    fs::rename(library_dir, &backup).with_context(|| {
        format!(
            "failed to move {} to {}",
            library_dir.display(),
            backup.display()
        )
    })?;

    debug!("    copying new version of AW to {} ...", library_dir.display());
    copy_tree(reference, library_dir)?;
    info!("    installed new version of Alfred-Workflow");

    let marker = library_dir.join(VERSION_CHECKED_MARKER);
    File::create(&marker)
        .with_context(|| format!("failed to create {}", marker.display()))?;

    // Alfred notices changed workflows by their info.plist
    touch(&workflow.manifest_path())?;

    Ok(backup)
}

/// First unused backup name for `library_dir`
///
/// `<dir>.old`, then `<dir>.old.1`, `<dir>.old.2`, ...
pub fn backup_path(library_dir: &Path) -> PathBuf {
    let mut base = library_dir.as_os_str().to_owned();
    base.push(BACKUP_SUFFIX);
    let base = PathBuf::from(base);

    let mut candidate = base.clone();
    let mut n = 1u32;
    while path_exists(&candidate) {
        let mut name = OsString::from(base.as_os_str());
        name.push(format!(".{}", n));
        candidate = PathBuf::from(name);
        n += 1;
    }

    candidate
}

/// Recursively copy the directory `src` to `dst`, which must not exist
///
/// Symlinks in `src` are followed and copied as regular files/directories.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    if path_exists(dst) {
        bail!("destination already exists: {}", dst.display());
    }

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.with_context(|| format!("failed to read {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create directory: {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }

    Ok(())
}

/// Set access and modification time of `path` to now, creating it if needed
pub fn touch(path: &Path) -> Result<()> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let now = FileTime::now();
    filetime::set_file_times(path, now, now)
        .with_context(|| format!("failed to touch {}", path.display()))?;
    Ok(())
}

/// Like `Path::exists`, but true for dangling symlinks too
fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
