use serde::Serialize;
use std::fmt;

/// Lowest urgency scored as [`UrgencyLevel::Critical`].
pub const CRITICAL_THRESHOLD: u8 = 80;
/// Lowest urgency scored as [`UrgencyLevel::High`].
pub const HIGH_THRESHOLD: u8 = 60;
/// Lowest urgency scored as [`UrgencyLevel::Medium`].
pub const MEDIUM_THRESHOLD: u8 = 30;

/// Severity bucket for an urgency score. A score equal to a threshold belongs
/// to the higher bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    pub const fn from_score(score: u8) -> Self {
        if score >= CRITICAL_THRESHOLD {
            Self::Critical
        } else if score >= HIGH_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Operator-facing label used by the console views.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
