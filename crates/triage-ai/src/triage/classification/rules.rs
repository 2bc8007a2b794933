use super::super::domain::{EmotionLabel, SituationLabel};

/// Ordered `(label, keywords)` table. Declaration order is the tie-break
/// order: when two labels match the same number of keywords, the one listed
/// first wins.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRuleSet<L: 'static> {
    rules: &'static [(L, &'static [&'static str])],
}

impl<L: Copy + 'static> KeywordRuleSet<L> {
    pub const fn new(rules: &'static [(L, &'static [&'static str])]) -> Self {
        Self { rules }
    }

    pub fn labels(&self) -> impl Iterator<Item = L> + '_ {
        self.rules.iter().map(|(label, _)| *label)
    }

    /// Every label with at least one keyword present in `text`, in declared
    /// order, together with its matched keywords in declared order.
    ///
    /// `text` must already be lowercased.
    pub(crate) fn scan(&self, text: &str) -> Vec<(L, Vec<&'static str>)> {
        self.rules
            .iter()
            .filter_map(|(label, keywords)| {
                let matched = matching_phrases(keywords, text);
                (!matched.is_empty()).then_some((*label, matched))
            })
            .collect()
    }
}

pub(crate) fn matching_phrases(
    phrases: &'static [&'static str],
    text: &str,
) -> Vec<&'static str> {
    phrases
        .iter()
        .copied()
        .filter(|phrase| text.contains(phrase))
        .collect()
}

/// Confidence as a capped linear function of match count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceCurve {
    pub base: f64,
    pub per_match: f64,
    pub cap: f64,
}

impl ConfidenceCurve {
    pub fn at(&self, matches: usize) -> f64 {
        (self.base + self.per_match * matches as f64).min(self.cap)
    }
}

pub const CONFIDENCE_CAP: f64 = 0.95;

pub const SITUATION_RULES: KeywordRuleSet<SituationLabel> = KeywordRuleSet::new(&[
    (
        SituationLabel::Trapped,
        &["trapped", "under rubble", "can't move", "stuck", "buried"],
    ),
    (
        SituationLabel::Bleeding,
        &["bleeding", "blood", "cut", "wound"],
    ),
    (
        SituationLabel::FireSmoke,
        &["fire", "smoke", "burning", "flames"],
    ),
    (
        SituationLabel::Collapse,
        &["collapsed", "building fell", "ruin", "falling debris"],
    ),
    (
        SituationLabel::Injury,
        &["injured", "hurt", "broken", "pain"],
    ),
]);

/// Phrases that override every other situation rule.
pub const SAFE_PHRASES: &[&str] = &["we are safe", "i'm safe", "no injuries", "safe now"];

pub const SAFE_CONFIDENCE: f64 = 0.70;
pub const UNKNOWN_CONFIDENCE: f64 = 0.40;

pub const SITUATION_CONFIDENCE: ConfidenceCurve = ConfidenceCurve {
    base: 0.55,
    per_match: 0.15,
    cap: CONFIDENCE_CAP,
};

pub const EMOTION_RULES: KeywordRuleSet<EmotionLabel> = KeywordRuleSet::new(&[
    (
        EmotionLabel::Panic,
        &["help!", "please", "panic", "terrified", "emergency", "immediately"],
    ),
    (
        EmotionLabel::Fear,
        &["scared", "afraid", "fear", "worried", "shaking"],
    ),
    (EmotionLabel::Calm, &["calm", "okay", "fine", "under control"]),
]);

pub const NEUTRAL_CONFIDENCE: f64 = 0.55;

pub const EMOTION_CONFIDENCE: ConfidenceCurve = ConfidenceCurve {
    base: 0.60,
    per_match: 0.12,
    cap: CONFIDENCE_CAP,
};
