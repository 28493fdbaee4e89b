mod blacklist;
mod config;
mod prefs;
mod update_status;
mod version;
mod workflow;

pub use blacklist::Blacklist;
pub use config::{Config, DEFAULT_SEARCH_DEPTH};
pub use prefs::AlfredPrefs;
pub use update_status::{UpdateStatus, is_stale};
pub use version::{ASSUMED_VERSION, LibraryVersion, VersionError};
pub use workflow::{LibraryInfo, MANIFEST_FILE, Workflow, WorkflowManifest};
