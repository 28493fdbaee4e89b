//! Fuzzy filtering of menu items against a user query.
//!
//! Each query word is scored against an item's key by the first rule that
//! matches; an item survives only if every word matches, and its score is
//! the sum over the words. Shorter keys score higher for the same match.

/// How a query word can match a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Key starts with the word: "dry" -> "Dry Run"
    StartsWith,
    /// Word is a prefix of the key's capital letters: "fw" -> "Fix Workflows"
    Capitals,
    /// Word is one of the key's words: "log" -> "View Log File"
    Atom,
    /// Word is a prefix of the key's word initials: "vl" -> "view log file"
    InitialsStartsWith,
    /// Word occurs anywhere in the key
    Substring,
}

/// All rules, in the order they are tried
pub const ALL_RULES: &[MatchRule] = &[
    MatchRule::StartsWith,
    MatchRule::Capitals,
    MatchRule::Atom,
    MatchRule::InitialsStartsWith,
    MatchRule::Substring,
];

/// Score one lower-cased query word against `value`
///
/// Returns the score and the rule that produced it, or `None` if no enabled
/// rule matches.
pub fn score(value: &str, word: &str, rules: &[MatchRule]) -> Option<(f64, MatchRule)> {
    let lower = value.to_lowercase();

    // Cheap reject: every character of the word must occur somewhere
    if !word.chars().all(|c| lower.contains(c)) {
        return None;
    }

    let word_len = word.chars().count() as f64;
    let penalty = |len: usize| len as f64 / word_len;
    let value_len = value.chars().count();

    if rules.contains(&MatchRule::StartsWith) && lower.starts_with(word) {
        return Some((100.0 - penalty(value_len), MatchRule::StartsWith));
    }

    if rules.contains(&MatchRule::Capitals) {
        let capitals: String = value
            .chars()
            .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            .collect::<String>()
            .to_lowercase();
        if capitals.starts_with(word) {
            return Some((100.0 - penalty(capitals.chars().count()), MatchRule::Capitals));
        }
    }

    let atoms: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| !s.is_empty())
        .collect();
    let initials: String = atoms.iter().filter_map(|a| a.chars().next()).collect();

    if rules.contains(&MatchRule::Atom) && atoms.contains(&word) {
        return Some((100.0 - penalty(value_len), MatchRule::Atom));
    }

    if rules.contains(&MatchRule::InitialsStartsWith) && initials.starts_with(word) {
        return Some((
            100.0 - penalty(initials.chars().count()),
            MatchRule::InitialsStartsWith,
        ));
    }

    if rules.contains(&MatchRule::Substring) && lower.contains(word) {
        return Some((90.0 - penalty(value_len), MatchRule::Substring));
    }

    None
}

/// Filter `items` by `query`, best matches first
///
/// An empty query returns the items unchanged. Items whose total score is
/// not strictly greater than `min_score` are dropped. Ties are broken by
/// the lower-cased key.
pub fn filter<T>(
    query: &str,
    items: Vec<T>,
    key: impl Fn(&T) -> &str,
    rules: &[MatchRule],
    min_score: f64,
) -> Vec<T> {
    let query = query.to_lowercase();
    let words: Vec<&str> = query.split(' ').map(str::trim).filter(|w| !w.is_empty()).collect();
    if words.is_empty() {
        return items;
    }

    let mut scored: Vec<(f64, String, T)> = Vec::new();

    for item in items {
        let value = key(&item).trim().to_string();
        if value.is_empty() {
            continue;
        }

        let total = words
            .iter()
            .map(|word| score(&value, word, rules).map(|(s, _)| s))
            .sum::<Option<f64>>();

        if let Some(total) = total
            && total > min_score
        {
            scored.push((total, value.to_lowercase(), item));
        }
    }

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLES: &[&str] = &["Dry Run", "View Log File", "Edit Blacklist", "Fix Workflows"];

    fn run(query: &str, min_score: f64) -> Vec<&'static str> {
        filter(query, TITLES.to_vec(), |t| *t, ALL_RULES, min_score)
    }

    fn rule(value: &str, word: &str) -> Option<MatchRule> {
        score(value, word, ALL_RULES).map(|(_, r)| r)
    }

    #[test]
    fn test_starts_with() {
        let (s, r) = score("Dry Run", "dry", ALL_RULES).unwrap();
        assert_eq!(r, MatchRule::StartsWith);
        assert!((s - (100.0 - 7.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_capitals() {
        let (s, r) = score("Fix Workflows", "fw", ALL_RULES).unwrap();
        assert_eq!(r, MatchRule::Capitals);
        assert!((s - 99.0).abs() < 1e-9);
    }

    #[test]
    fn test_atom() {
        assert_eq!(rule("View Log File", "log"), Some(MatchRule::Atom));
        assert_eq!(rule("Replace Alfred-Workflow", "workflow"), Some(MatchRule::Atom));
    }

    #[test]
    fn test_initials_lowercase_value() {
        assert_eq!(rule("view log file", "vl"), Some(MatchRule::InitialsStartsWith));
    }

    #[test]
    fn test_substring() {
        let (s, r) = score("Edit Blacklist", "black", ALL_RULES).unwrap();
        assert_eq!(r, MatchRule::Substring);
        assert!((s - (90.0 - 14.0 / 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(rule("Dry Run", "xyz"), None);
        assert_eq!(rule("Dry Run", "nur"), None);
    }

    #[test]
    fn test_disabled_rules() {
        assert_eq!(
            score("Fix Workflows", "fw", &[MatchRule::Substring]).map(|(_, r)| r),
            None
        );
    }

    #[test]
    fn test_empty_query_returns_all() {
        assert_eq!(run("", 50.0), TITLES.to_vec());
        assert_eq!(run("   ", 50.0), TITLES.to_vec());
    }

    #[test]
    fn test_sorted_by_score() {
        assert_eq!(run("f", 50.0), vec!["Fix Workflows", "View Log File"]);
    }

    #[test]
    fn test_all_words_must_match() {
        assert_eq!(run("edit black", 50.0), vec!["Edit Blacklist"]);
        assert!(run("edit zebra", 50.0).is_empty());
    }

    #[test]
    fn test_min_score_threshold() {
        let items = vec!["Replace broken versions of Alfred-Workflow"];
        // Substring only: 90 - 42/1 = 48
        assert!(filter("w", items.clone(), |t| *t, ALL_RULES, 50.0).is_empty());
        assert_eq!(filter("w", items.clone(), |t| *t, ALL_RULES, 40.0), items);
    }

    #[test]
    fn test_case_insensitive_query() {
        assert_eq!(run("DRY", 50.0), vec!["Dry Run"]);
    }
}
