//! Fuzzy matching of query text against candidate strings.
//!
//! Scoring is delegated to `nucleo-matcher`; this module only adapts it to an
//! `extract`-style call: score every candidate, rank best first, keep the top
//! `limit`.
//!
//! Query text is taken literally; fzf operators such as `!`, `^`, `$` and `'`
//! have no special meaning.

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

/// A ranked candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredMatch {
    /// Position of the candidate in the input slice.
    pub index: usize,
    /// Match quality; higher is better, 0 when the candidate does not match.
    pub score: u32,
}

/// Ranking function over candidate strings.
pub trait FuzzyMatcher: Send + Sync {
    /// Returns up to `limit` candidates, strongest match first.
    ///
    /// Every candidate is eligible, including non-matching ones, so the result
    /// has `min(limit, choices.len())` entries. Equal scores keep input order.
    fn extract(&self, query: &str, choices: &[&str], limit: usize) -> Vec<ScoredMatch>;
}

/// [`FuzzyMatcher`] backed by `nucleo-matcher`.
#[derive(Clone)]
pub struct NucleoMatcher {
    config: Config,
}

impl NucleoMatcher {
    /// Creates a matcher with the default scoring configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            config: Config::DEFAULT,
        }
    }
}

impl Default for NucleoMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher for NucleoMatcher {
    fn extract(&self, query: &str, choices: &[&str], limit: usize) -> Vec<ScoredMatch> {
        if limit == 0 || choices.is_empty() {
            return Vec::new();
        }

        let mut matcher = Matcher::new(self.config.clone());
        let pattern = Pattern::new(
            query,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );
        let mut buffer = Vec::new();

        let mut scored: Vec<ScoredMatch> = choices
            .iter()
            .enumerate()
            .map(|(index, choice)| ScoredMatch {
                index,
                score: pattern
                    .score(Utf32Str::new(choice, &mut buffer), &mut matcher)
                    .unwrap_or(0),
            })
            .collect();

        scored.sort_by(|left, right| right.score.cmp(&left.score));
        scored.truncate(limit);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn indices(matches: &[ScoredMatch]) -> Vec<usize> {
        matches.iter().map(|m| m.index).collect()
    }

    #[rstest]
    fn test_extract_prefers_closest_candidate() {
        let matcher = NucleoMatcher::new();
        let choices = ["Beta", "Alpha", "Gamma"];

        let matches = matcher.extract("Alph", &choices, 1);

        assert_eq!(indices(&matches), vec![1]);
        assert!(matches[0].score > 0);
    }

    #[rstest]
    fn test_extract_is_case_insensitive() {
        let matcher = NucleoMatcher::new();
        let choices = ["Gamma", "ALPHA"];

        let matches = matcher.extract("alpha", &choices, 1);

        assert_eq!(indices(&matches), vec![1]);
    }

    #[rstest]
    #[case("!Beta", 1)]
    #[case("^Beta", 2)]
    #[case("Beta$", 3)]
    fn test_extract_treats_operators_as_literal_text(#[case] query: &str, #[case] expected: usize) {
        let matcher = NucleoMatcher::new();
        let choices = ["Alpha", "!Beta", "^Beta", "Beta$"];

        let matches = matcher.extract(query, &choices, 1);

        assert_eq!(indices(&matches), vec![expected]);
    }

    #[rstest]
    fn test_extract_keeps_non_matching_candidates_up_to_limit() {
        let matcher = NucleoMatcher::new();
        let choices = ["Alpha", "Beta", "Gamma"];

        let matches = matcher.extract("Alph", &choices, 3);

        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].index, 0);
        assert_eq!(indices(&matches[1..]), vec![1, 2]);
        assert!(matches[1..].iter().all(|m| m.score == 0));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(2, 2)]
    #[case(10, 3)]
    fn test_extract_respects_limit(#[case] limit: usize, #[case] expected: usize) {
        let matcher = NucleoMatcher::new();
        let choices = ["one", "two", "three"];

        assert_eq!(matcher.extract("o", &choices, limit).len(), expected);
    }

    #[rstest]
    fn test_extract_without_choices() {
        let matcher = NucleoMatcher::new();
        assert!(matcher.extract("anything", &[], 5).is_empty());
    }
}
