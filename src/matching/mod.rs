//! Fuzzy ranking of known names and resolution of partial input to one of them.

mod disambiguate;

pub use disambiguate::{AmbiguousChoice, Disambiguator, Resolution};

use strsim::normalized_levenshtein;

/// Ranks candidate strings against an optional search term.
pub trait Matcher {
    /// Up to `limit` candidates with their scores, best first.
    ///
    /// Without a term the first `limit` candidates come back unfiltered with a score of 1.0.
    fn rank(&self, candidates: &[String], term: Option<&str>, limit: usize) -> Vec<(String, f64)>;
}

/// Case-insensitive similarity matcher.
///
/// A candidate containing the term scores 1.0. Otherwise the score is the best of the
/// whole-string similarity and the best similarity of any term-sized window of the
/// candidate. Candidates below `threshold` are dropped.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    threshold: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self { threshold: 0.6 }
    }
}

impl FuzzyMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn score(term: &str, candidate: &str) -> f64 {
        let term = term.trim().to_lowercase();
        let candidate = candidate.to_lowercase();
        if term.is_empty() || candidate.contains(&term) {
            return 1.0;
        }
        normalized_levenshtein(&term, &candidate).max(partial_ratio(&term, &candidate))
    }
}

impl Matcher for FuzzyMatcher {
    fn rank(&self, candidates: &[String], term: Option<&str>, limit: usize) -> Vec<(String, f64)> {
        let term = term.map(str::trim).filter(|term| !term.is_empty());
        let Some(term) = term else {
            return candidates
                .iter()
                .take(limit)
                .map(|candidate| (candidate.clone(), 1.0))
                .collect();
        };

        let mut scored: Vec<(String, f64)> = candidates
            .iter()
            .map(|candidate| (candidate.clone(), Self::score(term, candidate)))
            .filter(|(_, score)| *score >= self.threshold)
            .collect();
        // stable: equal scores keep candidate order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);
        tracing::debug!(term, matches = scored.len(), "ranked candidates");
        scored
    }
}

/// Best similarity between `term` and any window of `candidate` with the term's length.
fn partial_ratio(term: &str, candidate: &str) -> f64 {
    let window = term.chars().count();
    let chars: Vec<char> = candidate.chars().collect();
    if window == 0 || chars.len() <= window {
        return normalized_levenshtein(term, candidate);
    }
    chars
        .windows(window)
        .map(|slice| normalized_levenshtein(term, &slice.iter().collect::<String>()))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> Vec<String> {
        [
            "Assets:Bank:Checking",
            "Expenses:Food:Groceries",
            "Expenses:Food:Restaurant",
            "Expenses:Transport",
            "Income:Salary",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn no_term_enumerates_in_order() {
        let ranked = FuzzyMatcher::default().rank(&accounts(), None, 2);
        assert_eq!(
            ranked,
            vec![
                ("Assets:Bank:Checking".to_string(), 1.0),
                ("Expenses:Food:Groceries".to_string(), 1.0)
            ]
        );
    }

    #[test]
    fn substring_matches_are_case_insensitive() {
        let ranked = FuzzyMatcher::default().rank(&accounts(), Some("food"), 5);
        let names: Vec<_> = ranked.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Expenses:Food:Groceries", "Expenses:Food:Restaurant"]
        );
    }

    #[test]
    fn typos_still_match() {
        let ranked = FuzzyMatcher::default().rank(&accounts(), Some("grocreies"), 5);
        assert_eq!(ranked[0].0, "Expenses:Food:Groceries");
        assert!(ranked[0].1 < 1.0);
    }

    #[test]
    fn limit_and_threshold_apply() {
        let strict = FuzzyMatcher::new(1.0).rank(&accounts(), Some("xyz"), 5);
        assert!(strict.is_empty());
        let ranked = FuzzyMatcher::new(0.0).rank(&accounts(), Some("e"), 3);
        assert_eq!(ranked.len(), 3);
    }
}
