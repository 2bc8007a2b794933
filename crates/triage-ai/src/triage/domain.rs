use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Coarse physical emergency condition detected from transcript keywords.
///
/// The `Ord` derive follows declaration order, which keeps evidence maps
/// printed in the same order the rule table is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SituationLabel {
    Trapped,
    Bleeding,
    FireSmoke,
    Collapse,
    Injury,
    Safe,
    Unknown,
}

impl SituationLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trapped => "TRAPPED",
            Self::Bleeding => "BLEEDING",
            Self::FireSmoke => "FIRE_SMOKE",
            Self::Collapse => "COLLAPSE",
            Self::Injury => "INJURY",
            Self::Safe => "SAFE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SituationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller's emotional state as inferred from transcript wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmotionLabel {
    Panic,
    Fear,
    Calm,
    Neutral,
}

impl EmotionLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Panic => "PANIC",
            Self::Fear => "FEAR",
            Self::Calm => "CALM",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matched keywords per label, for every label with at least one hit.
pub type Evidence<L> = BTreeMap<L, Vec<&'static str>>;

/// Output of a keyword classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification<L: Ord> {
    pub label: L,
    pub confidence: f64,
    pub evidence: Evidence<L>,
}

impl<L: Ord> Classification<L> {
    /// Number of keywords that matched the winning label.
    pub fn match_count(&self) -> usize {
        self.evidence.get(&self.label).map_or(0, Vec::len)
    }
}

pub type SituationClassification = Classification<SituationLabel>;
pub type EmotionClassification = Classification<EmotionLabel>;
