//! Self-update from GitHub releases.
//!
//! `check-update` compares the newest release against the running version
//! and records the result in the cache directory. The action menu offers
//! the update when one is recorded, and selecting it downloads the
//! `.alfredworkflow` file and hands it to Alfred with `open`.

use std::env;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::output::Output;
use crate::types::{LibraryVersion, UpdateStatus, is_stale};

/// GitHub repository releases are fetched from
pub const GITHUB_SLUG: &str = "deanishe/alfred-fixum";

/// Query that installs a pending update
pub const UPDATE_QUERY: &str = "workflow:update";

/// How long a release check stays fresh
pub const CHECK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Timeout for HTTP requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// File extensions of installable workflow bundles
const WORKFLOW_EXTENSIONS: &[&str] = &[".alfredworkflow", ".alfred3workflow"];

/// A GitHub release, as returned by the releases API
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

/// Newest published release that ships a workflow bundle
///
/// Drafts, pre-releases and tags that are not versions are ignored.
pub fn newest_release(releases: &[Release]) -> Option<(LibraryVersion, &Asset)> {
    releases
        .iter()
        .filter(|r| !r.draft && !r.prerelease)
        .filter_map(|r| {
            let version = match LibraryVersion::parse(&r.tag_name) {
                Ok(v) => v,
                Err(e) => {
                    debug!("ignoring release {}: {}", r.tag_name, e);
                    return None;
                }
            };
            let asset = r
                .assets
                .iter()
                .find(|a| WORKFLOW_EXTENSIONS.iter().any(|ext| a.name.ends_with(ext)))?;
            Some((version, asset))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
}

/// Decide whether `releases` hold something newer than `current`
pub fn status_for(releases: &[Release], current: &LibraryVersion) -> UpdateStatus {
    match newest_release(releases) {
        Some((version, asset)) if current.is_older_than(&version) => UpdateStatus {
            available: true,
            version: Some(version.to_string()),
            download_url: Some(asset.browser_download_url.clone()),
        },
        _ => UpdateStatus::default(),
    }
}

/// Query GitHub for the newest release and record the result
pub fn check_update(ctx: &Context, out: &Output) -> Result<UpdateStatus> {
    let current = LibraryVersion::parse(env!("FIXUM_VERSION"))
        .context("running version is not a valid version")?;

    let releases = fetch_releases(&client()?)?;
    let status = status_for(&releases, &current);

    fs::create_dir_all(&ctx.cache_dir).with_context(|| {
        format!("failed to create cache directory: {}", ctx.cache_dir.display())
    })?;
    status.save(&ctx.update_status_path())?;

    match status.version.as_deref() {
        Some(version) if status.available => {
            info!("update available: {} -> {}", current, version);
            out.status("Available", &format!("fixum {}", version));
        }
        _ => {
            info!("fixum {} is up to date", current);
            out.verbose("fixum is up to date");
        }
    }

    Ok(status)
}

/// Run `fixum check-update` detached if the last check is stale
pub fn check_update_in_background(ctx: &Context) {
    if !is_stale(&ctx.update_status_path(), CHECK_INTERVAL) {
        return;
    }

    let exe = match env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            warn!("could not locate executable for update check: {}", e);
            return;
        }
    };

    match Command::new(exe)
        .arg("check-update")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => debug!("started update check (pid {})", child.id()),
        Err(e) => warn!("could not start update check: {}", e),
    }
}

/// Download the recorded release and open it, which makes Alfred install it
///
/// Returns a message for the user.
pub fn install_update(ctx: &Context) -> Result<String> {
    let status = UpdateStatus::load(&ctx.update_status_path())?;
    let (version, url) = match (status.available, status.version, status.download_url) {
        (true, Some(version), Some(url)) => (version, url),
        _ => return Ok("No update available".to_string()),
    };

    let name = url
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("Fixum.alfredworkflow");
    let dest = ctx.cache_dir.join(name);

    download(&client()?, &url, &dest)?;

    info!("installing {}", dest.display());
    let result = Command::new("open")
        .arg(&dest)
        .status()
        .with_context(|| format!("failed to open {}", dest.display()))?;
    if !result.success() {
        bail!("open failed for {}", dest.display());
    }

    Ok(format!("Installing Fixum {}", version))
}

fn client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("fixum/", env!("FIXUM_VERSION")))
        .build()
        .context("failed to create HTTP client")
}

fn fetch_releases(client: &Client) -> Result<Vec<Release>> {
    let url = format!("https://api.github.com/repos/{}/releases", GITHUB_SLUG);
    info!("fetching releases from {}", url);

    let response = client
        .get(&url)
        .send()
        .with_context(|| format!("failed to fetch {}", url))?;
    if !response.status().is_success() {
        bail!("HTTP {} from {}", response.status(), url);
    }

    response.json().context("failed to parse releases")
}

/// Download `url` to `dest` via a temporary file
fn download(client: &Client, url: &str, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    info!("downloading {} ...", url);
    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("failed to fetch {}", url))?;
    if !response.status().is_success() {
        bail!("HTTP {} from {}", response.status(), url);
    }

    let temp = dest.with_extension("tmp");
    let mut file =
        File::create(&temp).with_context(|| format!("failed to create {}", temp.display()))?;
    io::copy(&mut response, &mut file)
        .with_context(|| format!("failed to write {}", temp.display()))?;
    fs::rename(&temp, dest).with_context(|| {
        format!("failed to move {} to {}", temp.display(), dest.display())
    })?;

    Ok(())
}
