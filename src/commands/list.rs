use anyhow::Result;
use tracing::debug;

use crate::context::Context;
use crate::feedback::{Feedback, ICON_UPDATE, ICON_WARNING, Item};
use crate::filter::{ALL_RULES, filter};
use crate::output::Output;
use crate::types::UpdateStatus;

use super::update::{self, UPDATE_QUERY};

/// Minimum score for an action to survive a non-empty query
pub const MIN_SCORE: f64 = 50.0;

/// A fixed entry of the action menu
struct Action {
    title: &'static str,
    subtitle: &'static str,
    /// Passed to the workflow's next step, also used as the item uid
    arg: &'static str,
}

const ACTIONS: &[Action] = &[
    Action {
        title: "Dry Run",
        subtitle: "Show what the workflow would update",
        arg: "dryrun",
    },
    Action {
        title: "View Log File",
        subtitle: "Open the log file in Console.app",
        arg: "log",
    },
    Action {
        title: "Edit Blacklist",
        subtitle: "List of workflows to *not* update",
        arg: "blacklist",
    },
    Action {
        title: "Fix Workflows",
        subtitle: "Replace broken versions of Alfred-Workflow within your workflows",
        arg: "fix",
    },
];

/// Print the action menu for `query` as Alfred feedback
///
/// The update query installs the pending update instead.
pub fn list(ctx: &Context, query: &str, out: &Output) -> Result<()> {
    if query.trim() == UPDATE_QUERY {
        let message = update::install_update(ctx)?;
        let mut feedback = Feedback::default();
        feedback.push(Item::new(message, "Alfred will ask you to confirm").icon(ICON_UPDATE));
        out.result(&feedback.to_json()?);
        return Ok(());
    }

    update::check_update_in_background(ctx);

    let status = ctx.load_update_status();
    if let Some(version) = status.version.as_deref().filter(|_| status.available) {
        debug!("update available: {}", version);
    }

    let feedback = menu(query, &status);
    out.verbose(&format!("{} item(s) for query \"{}\"", feedback.items.len(), query));
    out.result(&feedback.to_json()?);
    Ok(())
}

/// Build the action menu
///
/// The update notice, if any, comes first and is never filtered.
pub fn menu(query: &str, status: &UpdateStatus) -> Feedback {
    let mut feedback = Feedback::default();

    if status.available {
        feedback.push(
            Item::new(
                "A newer version of Fixum is available",
                "⇥ or ↩ to install update",
            )
            .autocomplete(UPDATE_QUERY)
            .icon(ICON_UPDATE),
        );
    }

    let actions: Vec<&Action> = ACTIONS.iter().collect();
    let actions = filter(query, actions, |a| a.title, ALL_RULES, MIN_SCORE);

    if actions.is_empty() {
        feedback.push(Item::new("No matching actions", "Try a different query").icon(ICON_WARNING));
    }

    for action in actions {
        feedback.push(Item::new(action.title, action.subtitle).action(action.arg, action.arg));
    }

    feedback
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(feedback: &Feedback) -> Vec<&str> {
        feedback.items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_empty_query_lists_all_actions() {
        let fb = menu("", &UpdateStatus::default());
        assert_eq!(
            titles(&fb),
            vec!["Dry Run", "View Log File", "Edit Blacklist", "Fix Workflows"]
        );
        assert!(fb.items.iter().all(|i| i.valid));
        assert_eq!(fb.items[3].arg.as_deref(), Some("fix"));
        assert_eq!(fb.items[3].uid.as_deref(), Some("fix"));
    }

    #[test]
    fn test_query_filters_actions() {
        let fb = menu("log", &UpdateStatus::default());
        assert_eq!(titles(&fb), vec!["View Log File"]);
        assert_eq!(fb.items[0].arg.as_deref(), Some("log"));
    }

    #[test]
    fn test_no_match_placeholder() {
        let fb = menu("zzz", &UpdateStatus::default());
        assert_eq!(fb.items.len(), 1);
        assert_eq!(fb.items[0].title, "No matching actions");
        assert!(!fb.items[0].valid);
        assert_eq!(fb.items[0].icon.as_ref().unwrap().path, ICON_WARNING);
    }

    #[test]
    fn test_update_item_first_and_unfiltered() {
        let status = UpdateStatus {
            available: true,
            version: Some("1.3".to_string()),
            ..Default::default()
        };

        let fb = menu("dry", &status);
        assert_eq!(
            titles(&fb),
            vec!["A newer version of Fixum is available", "Dry Run"]
        );
        let update = &fb.items[0];
        assert!(!update.valid);
        assert_eq!(update.autocomplete.as_deref(), Some("workflow:update"));
        assert_eq!(update.icon.as_ref().unwrap().path, ICON_UPDATE);
    }

    #[test]
    fn test_update_item_with_placeholder() {
        let status = UpdateStatus {
            available: true,
            ..Default::default()
        };
        let fb = menu("zzz", &status);
        assert_eq!(
            titles(&fb),
            vec!["A newer version of Fixum is available", "No matching actions"]
        );
    }
}
