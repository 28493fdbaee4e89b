use std::process::Command;

/// Resolve the version reported by `fixum --version`.
///
/// Precedence:
/// 1. RELEASE_VERSION env var (set by the release script)
/// 2. git describe against release tags (vX.Y.Z, not vX.Y.Z-suffix)
/// 3. 0.0.0-g<hash> when the checkout has no release tags
/// 4. Cargo.toml version
fn main() {
    let version = release_version()
        .or_else(git_version)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=FIXUM_VERSION={}", version);
    println!("cargo:rerun-if-env-changed=RELEASE_VERSION");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}

fn release_version() -> Option<String> {
    std::env::var("RELEASE_VERSION").ok().filter(|s| !s.is_empty())
}

fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--match", "v[0-9]*", "--exclude", "*-*", "--always"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let describe = String::from_utf8(output.stdout).ok()?;
    let describe = describe.trim();

    match describe.strip_prefix('v') {
        // v1.2.0-3-gabcdef -> 1.2.0-3-gabcdef
        Some(tagged) => Some(tagged.to_string()),
        None if !describe.is_empty() => Some(format!("0.0.0-g{}", describe)),
        None => None,
    }
}
