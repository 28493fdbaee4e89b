use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

use crate::context::{Context, expand_home};
use crate::types::AlfredPrefs;

/// Workflows directory, relative to a candidate Alfred directory
pub const WORKFLOWS_SUBPATH: &str = "Alfred.alfredpreferences/workflows";

/// Find Alfred's workflows directory
///
/// Reads the preference file (fatal if unreadable), then returns the first
/// candidate containing `Alfred.alfredpreferences/workflows`, or `None`.
pub fn find_workflows_dir(ctx: &Context) -> Result<Option<PathBuf>> {
    let prefs = AlfredPrefs::load(&ctx.preferences)?;
    let candidates = candidate_dirs(ctx, &prefs);
    Ok(find_workflows_dir_in(&candidates))
}

/// Candidate Alfred directories, most specific first
///
/// 1. The sync folder from the preferences. Alfred can leave this set after
///    sync is disabled, so the other candidates are still tried.
/// 2. The default location under Application Support.
/// 3. The grandparent of the working directory. Alfred runs workflows from
///    their own directory, so this is only tried when running inside Alfred.
pub fn candidate_dirs(ctx: &Context, prefs: &AlfredPrefs) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(sync) = &prefs.sync_folder {
        candidates.push(expand_home(Path::new(sync), &ctx.home));
    }

    candidates.push(ctx.default_alfred_dir.clone());

    match &ctx.launcher_cwd {
        Some(cwd) => {
            if let Some(grandparent) = cwd.parent().and_then(Path::parent) {
                candidates.push(grandparent.to_path_buf());
            }
        }
        None => warn!("fixum is not being run from Alfred"),
    }

    candidates
        .into_iter()
        .map(|p| std::path::absolute(&p).unwrap_or(p))
        .collect()
}

/// Return the first `<candidate>/Alfred.alfredpreferences/workflows` that exists
pub fn find_workflows_dir_in(candidates: &[PathBuf]) -> Option<PathBuf> {
    for candidate in candidates {
        debug!("looking for workflows in {} ...", candidate.display());
        let workflows = candidate.join(WORKFLOWS_SUBPATH);
        if workflows.exists() {
            return Some(workflows);
        }
    }

    debug!("workflow directory not found");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::test_context;
    use std::fs;
    use tempfile::TempDir;

    fn make_alfred_dir(path: &Path) -> PathBuf {
        let workflows = path.join(WORKFLOWS_SUBPATH);
        fs::create_dir_all(&workflows).unwrap();
        workflows
    }

    #[test]
    fn test_candidates_outside_launcher() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());

        let candidates = candidate_dirs(&ctx, &AlfredPrefs::default());
        assert_eq!(candidates, vec![ctx.default_alfred_dir.clone()]);
    }

    #[test]
    fn test_candidates_order() {
        let dir = TempDir::new().unwrap();
        let mut ctx = test_context(dir.path());
        ctx.launcher_cwd = Some(
            dir.path()
                .join("sync/Alfred.alfredpreferences/workflows/user.workflow.1"),
        );
        let prefs = AlfredPrefs {
            sync_folder: Some("~/Dropbox/Alfred".to_string()),
        };

        let candidates = candidate_dirs(&ctx, &prefs);
        assert_eq!(
            candidates,
            vec![
                ctx.home.join("Dropbox/Alfred"),
                ctx.default_alfred_dir.clone(),
                dir.path().join("sync/Alfred.alfredpreferences"),
            ]
        );
    }

    #[test]
    fn test_sync_folder_wins() {
        let dir = TempDir::new().unwrap();
        let sync = dir.path().join("sync");
        let default = dir.path().join("default");
        let expected = make_alfred_dir(&sync);
        make_alfred_dir(&default);

        assert_eq!(find_workflows_dir_in(&[sync, default]), Some(expected));
    }

    #[test]
    fn test_stale_sync_folder_falls_back() {
        let dir = TempDir::new().unwrap();
        let sync = dir.path().join("sync-disabled");
        let default = dir.path().join("default");
        let expected = make_alfred_dir(&default);

        assert_eq!(find_workflows_dir_in(&[sync, default]), Some(expected));
    }

    #[test]
    fn test_not_found() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_workflows_dir_in(&[dir.path().join("nothing")]), None);
    }

    #[test]
    fn test_find_reads_preferences() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        let sync = dir.path().join("Dropbox/Alfred");
        let expected = make_alfred_dir(&sync);
        fs::write(
            &ctx.preferences,
            format!(
                "<plist><dict><key>syncfolder</key><string>{}</string></dict></plist>",
                sync.display()
            ),
        )
        .unwrap();

        assert_eq!(find_workflows_dir(&ctx).unwrap(), Some(expected));
    }

    #[test]
    fn test_unreadable_preferences_is_fatal() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(dir.path());
        make_alfred_dir(&ctx.default_alfred_dir);

        assert!(find_workflows_dir(&ctx).is_err());
    }
}
