use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::output::Output;
use crate::types::{Blacklist, Config, UpdateStatus};

/// Bundle ID used when not running inside Alfred
pub const DEFAULT_BUNDLE_ID: &str = "net.deanishe.alfred.fixum";

/// Alfred preference file, relative to the home directory
const PREFS_FILE: &str = "Library/Preferences/com.runningwithcrayons.Alfred-Preferences-3.plist";

/// Alfred's directory under Application Support
const ALFRED_DIR: &str = "Alfred 3";

/// Workflow data directories, relative to Application Support
const DATA_DIR: &str = "Alfred 3/Workflow Data";

/// Workflow cache directories, relative to Caches
const CACHE_DIR: &str = "com.runningwithcrayons.Alfred-3/Workflow Data";

/// Reference library directory name, next to the executable
const LIBRARY_DIR: &str = "workflow";

const BLACKLIST_FILE: &str = "blacklist.txt";
const CONFIG_FILE: &str = "config.yaml";
const UPDATE_STATUS_FILE: &str = "update_status.yaml";

/// Everything a run needs to know about its environment
///
/// Built once in `main` from Alfred's environment variables, the platform
/// directories and the optional config file, then passed by reference.
#[derive(Debug, Clone)]
pub struct Context {
    /// Bundle ID of the running workflow; never updated by fixum itself
    pub bundle_id: String,
    /// User home directory, for `~` expansion
    pub home: PathBuf,
    /// Persistent data directory (blacklist, config)
    pub data_dir: PathBuf,
    /// Cache directory (log file, update status)
    pub cache_dir: PathBuf,
    /// Alfred preference file
    pub preferences: PathBuf,
    /// Alfred's default application-support directory
    pub default_alfred_dir: PathBuf,
    /// Working directory when running inside Alfred, `None` otherwise
    pub launcher_cwd: Option<PathBuf>,
    /// Reference copy of Alfred-Workflow
    pub library_dir: PathBuf,
    /// Maximum depth searched for bundled library copies
    pub search_depth: usize,
}

impl Context {
    /// Build the context from the process environment
    pub fn from_env(out: &Output) -> Result<Self> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let app_support = dirs::data_dir().unwrap_or_else(|| home.join("Library/Application Support"));
        let caches = dirs::cache_dir().unwrap_or_else(|| home.join("Library/Caches"));

        let bundle_id = env_var("alfred_workflow_bundleid")
            .unwrap_or_else(|| DEFAULT_BUNDLE_ID.to_string());

        let data_dir = env_var("alfred_workflow_data")
            .map(PathBuf::from)
            .unwrap_or_else(|| app_support.join(DATA_DIR).join(&bundle_id));
        let cache_dir = env_var("alfred_workflow_cache")
            .map(PathBuf::from)
            .unwrap_or_else(|| caches.join(CACHE_DIR).join(&bundle_id));

        let config = load_config(&data_dir.join(CONFIG_FILE), out);

        let launcher_cwd = match env_var("alfred_version") {
            Some(_) => Some(env::current_dir().context("failed to get current directory")?),
            None => None,
        };

        let library_dir = match config.library_dir {
            Some(dir) => expand_home(&dir, &home),
            None => default_library_dir()?,
        };

        let preferences = config
            .preferences
            .map(|p| expand_home(&p, &home))
            .unwrap_or_else(|| home.join(PREFS_FILE));

        Ok(Self {
            bundle_id,
            default_alfred_dir: app_support.join(ALFRED_DIR),
            home,
            data_dir,
            cache_dir,
            preferences,
            launcher_cwd,
            library_dir,
            search_depth: config.search_depth,
        })
    }

    /// Get the blacklist file path
    pub fn blacklist_path(&self) -> PathBuf {
        self.data_dir.join(BLACKLIST_FILE)
    }

    /// Get the log file path (opened by the "View Log File" action)
    pub fn log_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{}.log", self.bundle_id))
    }

    /// Get the update status file path
    pub fn update_status_path(&self) -> PathBuf {
        self.cache_dir.join(UPDATE_STATUS_FILE)
    }

    /// Load the user's blacklist
    pub fn load_blacklist(&self) -> Result<Blacklist> {
        Blacklist::load(&self.blacklist_path())
    }

    /// Load the last update check result; unreadable status means no update
    pub fn load_update_status(&self) -> UpdateStatus {
        UpdateStatus::load(&self.update_status_path()).unwrap_or_default()
    }

    /// True when invoked by Alfred rather than from a terminal
    pub fn in_launcher(&self) -> bool {
        self.launcher_cwd.is_some()
    }
}

/// Load `config.yaml`, falling back to defaults
///
/// Runs before logging is set up, so a file that exists but cannot be
/// loaded is reported on the terminal.
pub(crate) fn load_config(path: &Path, out: &Output) -> Config {
    if !path.exists() {
        return Config::default();
    }

    Config::load(path).unwrap_or_else(|e| {
        out.warn(&format!("{:#}; using default settings", e));
        Config::default()
    })
}

/// Read a non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// The `workflow/` directory shipped next to the executable
fn default_library_dir() -> Result<PathBuf> {
    let exe = env::current_exe().context("failed to locate the fixum executable")?;
    let dir = exe
        .parent()
        .with_context(|| format!("executable has no parent directory: {}", exe.display()))?;
    Ok(dir.join(LIBRARY_DIR))
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
