use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::context::Context;
use crate::output::Output;
use crate::scan::{self, ScanEntry, ScanOptions, SkipReason};
use crate::types::{LibraryVersion, Workflow};
use crate::updater::update_workflow;

/// Options for the update pass
pub struct FixOptions {
    /// Only count what would be updated
    pub dry_run: bool,
}

/// Conditions that abort the whole pass
#[derive(Debug, Error)]
pub enum FixError {
    #[error("could not find workflow directory")]
    WorkflowsDirNotFound,
}

/// What happened to one entry of the workflows directory
#[derive(Debug)]
pub enum Outcome {
    Skipped(SkipReason),
    /// Bundled library is at least the reference version
    Current,
    /// Outdated, left alone because of a dry run
    WouldUpdate,
    /// Replaced; the old copy lives at `backup`
    Updated { backup: PathBuf },
    Failed(anyhow::Error),
}

/// Counts for one pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FixReport {
    pub dry_run: bool,
    /// Updated workflows, or would-be updates on a dry run
    pub updated: usize,
    pub failed: usize,
    pub current: usize,
    pub skipped: usize,
}

impl FixReport {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Current => self.current += 1,
            Outcome::WouldUpdate | Outcome::Updated { .. } => self.updated += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }

    /// True unless an update failed
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    /// The one-line result printed at the end of the pass
    pub fn summary_line(&self) -> String {
        if self.dry_run {
            format!("Would update {} workflow(s)", self.updated)
        } else if self.failed > 0 {
            format!(
                "ERROR: Failed to update {}/{} workflow(s)",
                self.failed,
                self.failed + self.updated
            )
        } else {
            format!("Updated {} workflow(s)", self.updated)
        }
    }
}

/// Find every workflow bundling an outdated Alfred-Workflow and replace
/// the bundled copy with the reference one
///
/// Per-workflow problems are counted in the report; only a missing
/// workflows directory, unreadable preferences or an unreadable reference
/// version abort the pass.
pub fn fix(ctx: &Context, opts: FixOptions, out: &Output) -> Result<FixReport> {
    let root = scan::find_workflows_dir(ctx)?.ok_or(FixError::WorkflowsDirNotFound)?;
    info!("workflow directory: {}", root.display());

    let minimum = scan::reference_version(&ctx.library_dir)?;
    info!("minimum Alfred-Workflow version: {}", minimum);

    let blacklist = ctx.load_blacklist()?;
    debug!("{} blacklist pattern(s) loaded", blacklist.len());

    if opts.dry_run {
        info!("dry run: no workflows will be changed");
    }

    let scan_opts = ScanOptions {
        own_bundle_id: &ctx.bundle_id,
        blacklist: &blacklist,
        search_depth: ctx.search_depth,
    };

    let mut report = FixReport {
        dry_run: opts.dry_run,
        ..Default::default()
    };

    for entry in scan::scan_workflows(&root, &scan_opts)? {
        let outcome = match entry {
            ScanEntry::Skipped { reason, .. } => Outcome::Skipped(reason),
            ScanEntry::Workflow(workflow) => {
                process(&workflow, &minimum, &ctx.library_dir, &opts, out)
            }
        };
        report.record(&outcome);
    }

    info!(
        "{} updated, {} failed, {} current, {} skipped",
        report.updated, report.failed, report.current, report.skipped
    );

    Ok(report)
}

fn process(
    workflow: &Workflow,
    minimum: &LibraryVersion,
    reference: &Path,
    opts: &FixOptions,
    out: &Output,
) -> Outcome {
    let version = &workflow.library.version;
    debug!(
        "found AW workflow \"{}\" ({}) in {}",
        workflow.name,
        workflow.bundle_id,
        workflow.dir_name()
    );

    if !version.is_older_than(minimum) {
        info!("[OK] \"{}\" ({}) AW v{}", workflow.name, workflow.bundle_id, version);
        out.verbose(&format!("{} is current ({})", workflow.name, version));
        return Outcome::Current;
    }

    info!(
        "[!!] \"{}\" ({}) AW v{} < v{}",
        workflow.name, workflow.bundle_id, version, minimum
    );
    out.status("Outdated", &format!("{} ({} < {})", workflow.name, version, minimum));

    if opts.dry_run {
        return Outcome::WouldUpdate;
    }

    out.status("Updating", &workflow.name);
    match update_workflow(workflow, reference) {
        Ok(backup) => {
            info!("old version moved to {}", backup.display());
            Outcome::Updated { backup }
        }
        Err(e) => {
            error!("failed to update \"{}\": {:#}", workflow.name, e);
            out.status("Failed", &format!("{}: {:#}", workflow.name, e));
            Outcome::Failed(e)
        }
    }
}
