use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glob::Pattern;
use tracing::warn;

/// Bundle-ID patterns of workflows that must never be updated
/// (`blacklist.txt` in the data directory, edited by the user)
///
/// One glob pattern per line. Blank lines and lines starting with `#` are
/// ignored. Matching is case-sensitive and `*` also matches `.`, so
/// `com.acme.*` covers every workflow published under `com.acme`.
///
/// Patterns follow `fnmatch` rules: `**` is the same as `*`, and a `[`
/// without a closing `]` is a literal bracket.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    /// (pattern as written, compiled pattern)
    patterns: Vec<(String, Pattern)>,
}

impl Blacklist {
    /// Load the blacklist from a file. A missing file is an empty blacklist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read blacklist: {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Parse blacklist file content. Invalid patterns are logged and dropped.
    pub fn parse(content: &str) -> Self {
        let patterns = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| match Pattern::new(&fnmatch_to_glob(line)) {
                Ok(pattern) => Some((line.to_string(), pattern)),
                Err(e) => {
                    warn!("ignoring invalid blacklist pattern '{}': {}", line, e);
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    /// Return the first pattern matching `bundle_id`
    pub fn matching_pattern(&self, bundle_id: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, p)| p.matches(bundle_id))
            .map(|(line, _)| line.as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Rewrite an `fnmatch` pattern into one `glob::Pattern` accepts
///
/// Runs of `*` collapse to one, and an unclosed `[` is escaped as `[[]`.
fn fnmatch_to_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while i + 1 < chars.len() && chars[i + 1] == '*' {
                    i += 1;
                }
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end;
                }
                None => out.push_str("[[]"),
            },
            c => out.push(c),
        }
        i += 1;
    }

    out
}

/// Index of the `]` closing the class opened at `start`, if any
///
/// A `]` right after `[` or `[!` belongs to the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_wildcard_matches_publisher() {
        let blacklist = Blacklist::parse("com.acme.*\n");
        assert_eq!(blacklist.matching_pattern("com.acme.foo"), Some("com.acme.*"));
        assert_eq!(blacklist.matching_pattern("com.other.foo"), None);
    }

    #[test]
    fn test_exact_id() {
        let blacklist = Blacklist::parse("net.deanishe.alfred-reddit");
        assert!(blacklist.matching_pattern("net.deanishe.alfred-reddit").is_some());
        assert!(blacklist.matching_pattern("net.deanishe.alfred-reddit2").is_none());
    }

    #[test]
    fn test_case_sensitive() {
        let blacklist = Blacklist::parse("com.Acme.*");
        assert!(blacklist.matching_pattern("com.acme.foo").is_none());
        assert!(blacklist.matching_pattern("com.Acme.foo").is_some());
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let content = "# workflows I maintain myself\n\n   \n  com.acme.*  \n#com.other.*\n";
        let blacklist = Blacklist::parse(content);
        assert_eq!(blacklist.len(), 1);
        assert!(blacklist.matching_pattern("com.other.foo").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let blacklist = Blacklist::parse("com.acme.*\n*.foo\n");
        assert_eq!(blacklist.matching_pattern("com.acme.foo"), Some("com.acme.*"));
        assert_eq!(blacklist.matching_pattern("org.x.foo"), Some("*.foo"));
    }

    #[test]
    fn test_character_class() {
        let blacklist = Blacklist::parse("com.acme.v[12]");
        assert!(blacklist.matching_pattern("com.acme.v1").is_some());
        assert!(blacklist.matching_pattern("com.acme.v3").is_none());
    }

    #[test]
    fn test_double_star_matches_like_single() {
        let blacklist = Blacklist::parse("com.acme.**\n");
        assert_eq!(blacklist.len(), 1);
        assert_eq!(blacklist.matching_pattern("com.acme.foo"), Some("com.acme.**"));
        assert!(blacklist.matching_pattern("com.other.foo").is_none());
    }

    #[test]
    fn test_unclosed_bracket_is_literal() {
        let blacklist = Blacklist::parse("com.acme[\n");
        assert_eq!(blacklist.len(), 1);
        assert_eq!(blacklist.matching_pattern("com.acme["), Some("com.acme["));
        assert!(blacklist.matching_pattern("com.acme").is_none());
    }

    #[test]
    fn test_leading_bracket_in_class() {
        let blacklist = Blacklist::parse("com.acme.[]x]\ncom.acme.v[!12]");
        assert!(blacklist.matching_pattern("com.acme.]").is_some());
        assert!(blacklist.matching_pattern("com.acme.v3").is_some());
        assert!(blacklist.matching_pattern("com.acme.v1").is_none());
    }

    #[test]
    fn test_fnmatch_to_glob() {
        assert_eq!(fnmatch_to_glob("a***b"), "a*b");
        assert_eq!(fnmatch_to_glob("a[b"), "a[[]b");
        assert_eq!(fnmatch_to_glob("a[bc]d"), "a[bc]d");
        assert_eq!(fnmatch_to_glob("[[x"), "[[][[]x");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let blacklist = Blacklist::load(&dir.path().join("blacklist.txt")).unwrap();
        assert!(blacklist.is_empty());
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blacklist.txt");
        fs::write(&path, "com.acme.*\n").unwrap();
        let blacklist = Blacklist::load(&path).unwrap();
        assert!(blacklist.matching_pattern("com.acme.tool").is_some());
    }
}
