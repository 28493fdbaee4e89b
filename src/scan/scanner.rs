use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::types::{Blacklist, MANIFEST_FILE, Workflow, WorkflowManifest};

use super::library::find_library;

/// Options for scanning the workflows directory
pub struct ScanOptions<'a> {
    /// Bundle ID of the running workflow, which is never updated
    pub own_bundle_id: &'a str,
    /// Bundle-ID patterns to leave alone
    pub blacklist: &'a Blacklist,
    /// Maximum depth searched for a bundled library
    pub search_depth: usize,
}

/// Why an entry of the workflows directory was not considered for update
#[derive(Debug)]
pub enum SkipReason {
    Symlink,
    NotDirectory,
    /// No `info.plist`
    NoManifest,
    /// `info.plist` or the library version file could not be read
    Malformed(anyhow::Error),
    /// Empty bundle ID, so it cannot use Alfred-Workflow
    NoBundleId,
    /// No genuine copy of Alfred-Workflow inside
    NoLibrary,
    /// The running workflow itself
    IsSelf,
    /// Bundle ID matches this blacklist pattern
    Blacklisted(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Symlink => write!(f, "symlink"),
            SkipReason::NotDirectory => write!(f, "not a directory"),
            SkipReason::NoManifest => write!(f, "no {}", MANIFEST_FILE),
            SkipReason::Malformed(e) => write!(f, "could not read workflow: {:#}", e),
            SkipReason::NoBundleId => write!(f, "no bundle ID"),
            SkipReason::NoLibrary => write!(f, "not an AW workflow"),
            SkipReason::IsSelf => write!(f, "fixum itself"),
            SkipReason::Blacklisted(pattern) => write!(f, "blacklisted by '{}'", pattern),
        }
    }
}

/// Result of inspecting one entry of the workflows directory
#[derive(Debug)]
pub enum ScanEntry {
    Workflow(Workflow),
    Skipped { name: String, reason: SkipReason },
}

/// Inspect every entry directly under the workflows directory, in name order
///
/// Only failing to list `root` itself is an error; problems with individual
/// entries become `ScanEntry::Skipped`.
pub fn scan_workflows(root: &Path, opts: &ScanOptions<'_>) -> Result<Vec<ScanEntry>> {
    let mut paths = fs::read_dir(root)
        .with_context(|| format!("failed to read workflow directory: {}", root.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<PathBuf>>>()
        .with_context(|| format!("failed to read workflow directory: {}", root.display()))?;
    paths.sort();

    let entries = paths
        .iter()
        .map(|path| match inspect(path, opts) {
            Ok(workflow) => ScanEntry::Workflow(workflow),
            Err(reason) => {
                let name = entry_name(path);
                log_skip(&name, &reason);
                ScanEntry::Skipped { name, reason }
            }
        })
        .collect();

    Ok(entries)
}

/// Decide whether a single directory is an updatable Alfred-Workflow workflow
pub fn inspect(path: &Path, opts: &ScanOptions<'_>) -> Result<Workflow, SkipReason> {
    let meta = fs::symlink_metadata(path).map_err(|e| SkipReason::Malformed(e.into()))?;
    if meta.file_type().is_symlink() {
        return Err(SkipReason::Symlink);
    }
    if !meta.is_dir() {
        return Err(SkipReason::NotDirectory);
    }

    let manifest_path = path.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Err(SkipReason::NoManifest);
    }

    let manifest = WorkflowManifest::load(&manifest_path).map_err(SkipReason::Malformed)?;
    if manifest.bundle_id.is_empty() {
        return Err(SkipReason::NoBundleId);
    }

    let library = find_library(path, opts.search_depth)
        .map_err(SkipReason::Malformed)?
        .ok_or(SkipReason::NoLibrary)?;

    if manifest.bundle_id == opts.own_bundle_id {
        return Err(SkipReason::IsSelf);
    }

    if let Some(pattern) = opts.blacklist.matching_pattern(&manifest.bundle_id) {
        debug!("blacklisted: \"{}\" matches \"{}\"", manifest.bundle_id, pattern);
        return Err(SkipReason::Blacklisted(pattern.to_string()));
    }

    Ok(Workflow {
        name: manifest.name,
        bundle_id: manifest.bundle_id,
        dir: path.to_path_buf(),
        library,
    })
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn log_skip(name: &str, reason: &SkipReason) {
    match reason {
        SkipReason::Symlink => info!("ignoring symlink: {}", name),
        SkipReason::Blacklisted(_) => info!("skipping blacklisted workflow: {}", name),
        SkipReason::Malformed(e) => error!("could not read workflow: {}: {:#}", name, e),
        SkipReason::IsSelf => debug!("ignoring self"),
        reason => debug!("ignoring {}: {}", name, reason),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::scan::library::tests::make_library;
    use tempfile::TempDir;

    /// Create a workflow directory with an `info.plist`
    pub(crate) fn make_workflow(dir: &Path, name: &str, bundle_id: &str) {
        fs::create_dir_all(dir).unwrap();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<plist version=\"1.0\">\n<dict>\n\
             \t<key>bundleid</key>\n\t<string>{}</string>\n\
             \t<key>name</key>\n\t<string>{}</string>\n</dict>\n</plist>\n",
            bundle_id, name
        );
        fs::write(dir.join(MANIFEST_FILE), xml).unwrap();
    }

    fn opts<'a>(blacklist: &'a Blacklist) -> ScanOptions<'a> {
        ScanOptions {
            own_bundle_id: "net.deanishe.alfred.fixum",
            blacklist,
            search_depth: 6,
        }
    }

    fn skip_reason(path: &Path, opts: &ScanOptions<'_>) -> SkipReason {
        match inspect(path, opts) {
            Err(reason) => reason,
            Ok(wf) => panic!("expected skip, got workflow {:?}", wf.bundle_id),
        }
    }

    #[test]
    fn test_inspect_aw_workflow() {
        let dir = TempDir::new().unwrap();
        let wf_dir = dir.path().join("user.workflow.A");
        make_workflow(&wf_dir, "Reddit", "net.deanishe.alfred-reddit");
        make_library(&wf_dir.join("workflow"), Some("1.20"));

        let blacklist = Blacklist::default();
        let wf = inspect(&wf_dir, &opts(&blacklist)).unwrap();
        assert_eq!(wf.name, "Reddit");
        assert_eq!(wf.bundle_id, "net.deanishe.alfred-reddit");
        assert_eq!(wf.dir, wf_dir);
        assert_eq!(wf.library.dir, wf_dir.join("workflow"));
    }

    #[test]
    fn test_skip_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hi").unwrap();

        let blacklist = Blacklist::default();
        assert!(matches!(
            skip_reason(&path, &opts(&blacklist)),
            SkipReason::NotDirectory
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_skip_symlink() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        make_workflow(&real, "Real", "com.acme.real");
        make_library(&real.join("workflow"), Some("1.0"));
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let blacklist = Blacklist::default();
        assert!(matches!(
            skip_reason(&link, &opts(&blacklist)),
            SkipReason::Symlink
        ));
    }

    #[test]
    fn test_skip_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let blacklist = Blacklist::default();
        assert!(matches!(
            skip_reason(dir.path(), &opts(&blacklist)),
            SkipReason::NoManifest
        ));
    }

    #[test]
    fn test_skip_malformed_manifest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "<plist><dict><key>name").unwrap();

        let blacklist = Blacklist::default();
        assert!(matches!(
            skip_reason(dir.path(), &opts(&blacklist)),
            SkipReason::Malformed(_)
        ));
    }

    #[test]
    fn test_skip_empty_bundle_id() {
        let dir = TempDir::new().unwrap();
        make_workflow(dir.path(), "Scratch", "");
        make_library(&dir.path().join("workflow"), Some("1.0"));

        let blacklist = Blacklist::default();
        assert!(matches!(
            skip_reason(dir.path(), &opts(&blacklist)),
            SkipReason::NoBundleId
        ));
    }

    #[test]
    fn test_skip_without_library() {
        let dir = TempDir::new().unwrap();
        make_workflow(dir.path(), "Shell", "com.acme.shell");

        let blacklist = Blacklist::default();
        assert!(matches!(
            skip_reason(dir.path(), &opts(&blacklist)),
            SkipReason::NoLibrary
        ));
    }

    #[test]
    fn test_skip_self_regardless_of_version() {
        let dir = TempDir::new().unwrap();
        make_workflow(dir.path(), "Fixum", "net.deanishe.alfred.fixum");
        make_library(&dir.path().join("workflow"), None);

        let blacklist = Blacklist::default();
        assert!(matches!(
            skip_reason(dir.path(), &opts(&blacklist)),
            SkipReason::IsSelf
        ));
    }

    #[test]
    fn test_skip_blacklisted() {
        let dir = TempDir::new().unwrap();
        make_workflow(dir.path(), "Foo", "com.acme.foo");
        make_library(&dir.path().join("workflow"), Some("1.0"));

        let blacklist = Blacklist::parse("com.acme.*");
        match skip_reason(dir.path(), &opts(&blacklist)) {
            SkipReason::Blacklisted(pattern) => assert_eq!(pattern, "com.acme.*"),
            other => panic!("expected blacklisted, got {}", other),
        }
    }

    #[test]
    fn test_blacklist_other_publisher_kept() {
        let dir = TempDir::new().unwrap();
        make_workflow(dir.path(), "Foo", "com.other.foo");
        make_library(&dir.path().join("workflow"), Some("1.0"));

        let blacklist = Blacklist::parse("com.acme.*");
        assert!(inspect(dir.path(), &opts(&blacklist)).is_ok());
    }

    #[test]
    fn test_scan_sorted_and_complete() {
        let dir = TempDir::new().unwrap();
        make_workflow(&dir.path().join("b"), "B", "com.acme.b");
        make_library(&dir.path().join("b/workflow"), Some("1.0"));
        make_workflow(&dir.path().join("a"), "A", "");
        fs::write(dir.path().join("c.txt"), "").unwrap();

        let blacklist = Blacklist::default();
        let entries = scan_workflows(dir.path(), &opts(&blacklist)).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(matches!(
            &entries[0],
            ScanEntry::Skipped { name, reason: SkipReason::NoBundleId } if name == "a"
        ));
        assert!(matches!(&entries[1], ScanEntry::Workflow(wf) if wf.name == "B"));
        assert!(matches!(
            &entries[2],
            ScanEntry::Skipped { reason: SkipReason::NotDirectory, .. }
        ));
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = TempDir::new().unwrap();
        let blacklist = Blacklist::default();
        assert!(scan_workflows(&dir.path().join("missing"), &opts(&blacklist)).is_err());
    }
}
