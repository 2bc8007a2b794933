use super::super::domain::{EmotionClassification, EmotionLabel, Evidence};
use super::rules::{KeywordRuleSet, EMOTION_CONFIDENCE, EMOTION_RULES, NEUTRAL_CONFIDENCE};
use super::{best_by_count, normalize_transcript};

/// Maps a transcript to an emotional-state label; `NEUTRAL` when no rule hits.
#[derive(Debug, Clone, Copy)]
pub struct EmotionClassifier {
    rules: KeywordRuleSet<EmotionLabel>,
}

impl Default for EmotionClassifier {
    fn default() -> Self {
        Self {
            rules: EMOTION_RULES,
        }
    }
}

impl EmotionClassifier {
    pub fn classify(&self, transcript: &str) -> EmotionClassification {
        let text = normalize_transcript(transcript);

        best_by_count(self.rules.scan(&text), &EMOTION_CONFIDENCE).unwrap_or_else(|| {
            EmotionClassification {
                label: EmotionLabel::Neutral,
                confidence: NEUTRAL_CONFIDENCE,
                evidence: Evidence::new(),
            }
        })
    }
}
