use super::domain::SituationLabel;

/// Confidence below which a classification is sent to a human.
pub const MIN_CONFIDENCE: f64 = 0.55;

/// Decides whether a triage decision needs a dispatcher to confirm it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewFlagPolicy {
    min_confidence: f64,
}

impl Default for ReviewFlagPolicy {
    fn default() -> Self {
        Self {
            min_confidence: MIN_CONFIDENCE,
        }
    }
}

impl ReviewFlagPolicy {
    /// True for an `UNKNOWN` situation or when either confidence is under
    /// the threshold. NaN confidence is treated as low.
    pub fn requires_review(
        &self,
        situation: SituationLabel,
        situation_confidence: f64,
        emotion_confidence: f64,
    ) -> bool {
        situation == SituationLabel::Unknown
            || self.is_low(situation_confidence)
            || self.is_low(emotion_confidence)
    }

    fn is_low(&self, confidence: f64) -> bool {
        confidence.is_nan() || confidence < self.min_confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_situation_is_always_flagged() {
        let policy = ReviewFlagPolicy::default();
        assert!(policy.requires_review(SituationLabel::Unknown, 0.95, 0.95));
    }

    #[test]
    fn threshold_is_inclusive() {
        let policy = ReviewFlagPolicy::default();
        assert!(!policy.requires_review(SituationLabel::Injury, 0.55, 0.55));
        assert!(policy.requires_review(SituationLabel::Injury, 0.54, 0.95));
        assert!(policy.requires_review(SituationLabel::Trapped, 0.95, 0.54));
    }

    #[test]
    fn confident_calls_pass() {
        let policy = ReviewFlagPolicy::default();
        assert!(!policy.requires_review(SituationLabel::Trapped, 0.85, 0.84));
        assert!(!policy.requires_review(SituationLabel::Safe, 0.70, 0.55));
    }

    #[test]
    fn nan_confidence_is_flagged() {
        let policy = ReviewFlagPolicy::default();
        assert!(policy.requires_review(SituationLabel::Bleeding, f64::NAN, 0.9));
    }
}
