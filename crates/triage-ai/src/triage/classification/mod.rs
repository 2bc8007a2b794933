//! Keyword classifiers over call transcripts.
//!
//! Both classifiers share one contract: the winning label is the one with the
//! most keyword hits, and ties resolve to the label declared first in the
//! rule table (see [`rules::KeywordRuleSet`]).

mod emotion;
pub mod rules;
mod situation;

pub use emotion::EmotionClassifier;
pub use rules::{ConfidenceCurve, KeywordRuleSet};
pub use situation::SituationClassifier;

use super::domain::{Classification, Evidence};

/// Lowercase and trim, the normal form every rule is matched against.
pub(crate) fn normalize_transcript(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Picks the label with the highest hit count. A later label only replaces
/// the current best on a strictly greater count, so the first-declared label
/// wins ties.
pub(crate) fn best_by_count<L: Copy + Ord>(
    matches: Vec<(L, Vec<&'static str>)>,
    curve: &ConfidenceCurve,
) -> Option<Classification<L>> {
    let mut best: Option<(L, usize)> = None;
    for (label, keywords) in &matches {
        let count = keywords.len();
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((*label, count)),
        }
    }

    let (label, count) = best?;
    let evidence: Evidence<L> = matches.into_iter().collect();

    Some(Classification {
        label,
        confidence: curve.at(count),
        evidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Probe {
        First,
        Second,
    }

    const CURVE: ConfidenceCurve = ConfidenceCurve {
        base: 0.5,
        per_match: 0.1,
        cap: 0.95,
    };

    #[test]
    fn tie_goes_to_first_declared_label() {
        let matches = vec![(Probe::Second, vec!["b"]), (Probe::First, vec!["a"])];
        let result = best_by_count(matches, &CURVE).expect("match present");
        assert_eq!(result.label, Probe::Second);
        assert_eq!(result.evidence.len(), 2);
    }

    #[test]
    fn higher_count_beats_declaration_order() {
        let matches = vec![(Probe::First, vec!["a"]), (Probe::Second, vec!["b", "c"])];
        let result = best_by_count(matches, &CURVE).expect("match present");
        assert_eq!(result.label, Probe::Second);
        assert!((result.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn empty_matches_yield_none() {
        assert!(best_by_count::<Probe>(Vec::new(), &CURVE).is_none());
    }

    #[test]
    fn normalization_lowercases_and_trims() {
        assert_eq!(normalize_transcript("  We Are SAFE \n"), "we are safe");
    }
}
