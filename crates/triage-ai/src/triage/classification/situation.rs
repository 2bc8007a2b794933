use super::super::domain::{Evidence, SituationClassification, SituationLabel};
use super::rules::{
    matching_phrases, KeywordRuleSet, SAFE_CONFIDENCE, SAFE_PHRASES, SITUATION_CONFIDENCE,
    SITUATION_RULES, UNKNOWN_CONFIDENCE,
};
use super::{best_by_count, normalize_transcript};

/// Maps a transcript to a situation label.
///
/// Any safe phrase short-circuits to `SAFE` no matter how many other
/// keywords appear. Without a safe phrase the best-by-count rule applies,
/// falling back to `UNKNOWN` when nothing matched.
#[derive(Debug, Clone, Copy)]
pub struct SituationClassifier {
    rules: KeywordRuleSet<SituationLabel>,
    safe_phrases: &'static [&'static str],
}

impl Default for SituationClassifier {
    fn default() -> Self {
        Self {
            rules: SITUATION_RULES,
            safe_phrases: SAFE_PHRASES,
        }
    }
}

impl SituationClassifier {
    pub fn classify(&self, transcript: &str) -> SituationClassification {
        let text = normalize_transcript(transcript);

        let safe_hits = matching_phrases(self.safe_phrases, &text);
        if !safe_hits.is_empty() {
            let mut evidence = Evidence::new();
            evidence.insert(SituationLabel::Safe, safe_hits);
            return SituationClassification {
                label: SituationLabel::Safe,
                confidence: SAFE_CONFIDENCE,
                evidence,
            };
        }

        best_by_count(self.rules.scan(&text), &SITUATION_CONFIDENCE).unwrap_or_else(|| {
            SituationClassification {
                label: SituationLabel::Unknown,
                confidence: UNKNOWN_CONFIDENCE,
                evidence: Evidence::new(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> SituationClassification {
        SituationClassifier::default().classify(text)
    }

    #[test]
    fn empty_transcript_is_unknown() {
        let result = classify("");
        assert_eq!(result.label, SituationLabel::Unknown);
        assert_eq!(result.confidence, 0.40);
        assert!(result.evidence.is_empty());
    }

    #[test]
    fn safe_phrase_overrides_other_keywords() {
        let result = classify("We are safe, fire is out");
        assert_eq!(result.label, SituationLabel::Safe);
        assert_eq!(result.confidence, 0.70);
        assert_eq!(
            result.evidence.get(&SituationLabel::Safe),
            Some(&vec!["we are safe"])
        );
        assert!(!result.evidence.contains_key(&SituationLabel::FireSmoke));
    }

    #[test]
    fn safe_wins_over_many_hits() {
        let result = classify("trapped, stuck, buried under rubble but i'm safe now");
        assert_eq!(result.label, SituationLabel::Safe);
        assert_eq!(
            result.evidence[&SituationLabel::Safe],
            vec!["i'm safe", "safe now"]
        );
    }

    #[test]
    fn trapped_with_two_hits() {
        let result = classify("I'm trapped under rubble, please help, panic!");
        assert_eq!(result.label, SituationLabel::Trapped);
        assert!((result.confidence - 0.85).abs() < 1e-9);
        assert_eq!(
            result.evidence[&SituationLabel::Trapped],
            vec!["trapped", "under rubble"]
        );
    }

    #[test]
    fn tie_resolves_to_first_declared_label() {
        // one BLEEDING hit ("blood") and one FIRE_SMOKE hit ("smoke")
        let result = classify("there is smoke and blood");
        assert_eq!(result.label, SituationLabel::Bleeding);
        assert_eq!(result.evidence.len(), 2);

        // one TRAPPED hit beats a later one-hit INJURY
        let result = classify("my arm is broken and I am stuck");
        assert_eq!(result.label, SituationLabel::Trapped);
    }

    #[test]
    fn more_hits_beat_declaration_order() {
        let result = classify("fire and smoke, the flames are near, someone is hurt");
        assert_eq!(result.label, SituationLabel::FireSmoke);
        assert_eq!(result.match_count(), 3);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.evidence[&SituationLabel::Injury], vec!["hurt"]);
    }

    #[test]
    fn confidence_stays_in_range() {
        for text in [
            "",
            "hello",
            "bleeding",
            "bleeding blood cut wound",
            "we are safe",
            "collapsed building fell ruin falling debris",
        ] {
            let confidence = classify(text).confidence;
            assert!((0.40..=0.95).contains(&confidence), "{text}: {confidence}");
        }
    }
}
