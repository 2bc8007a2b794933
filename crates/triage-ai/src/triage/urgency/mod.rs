mod levels;

pub use levels::{UrgencyLevel, CRITICAL_THRESHOLD, HIGH_THRESHOLD, MEDIUM_THRESHOLD};

use super::domain::{EmotionLabel, SituationLabel};
use serde::Serialize;

pub const BASE_URGENCY: f64 = 10.0;
/// Largest contribution the stress term can make.
pub const STRESS_TERM_MAX: f64 = 25.0;

pub const fn situation_weight(label: SituationLabel) -> f64 {
    match label {
        SituationLabel::Trapped => 45.0,
        SituationLabel::FireSmoke => 40.0,
        SituationLabel::Bleeding => 35.0,
        SituationLabel::Collapse => 30.0,
        SituationLabel::Injury => 22.0,
        SituationLabel::Safe => -10.0,
        SituationLabel::Unknown => 0.0,
    }
}

pub const fn emotion_weight(label: EmotionLabel) -> f64 {
    match label {
        EmotionLabel::Panic => 20.0,
        EmotionLabel::Fear => 12.0,
        EmotionLabel::Calm => -5.0,
        EmotionLabel::Neutral => 0.0,
    }
}

/// The four signals the fusion formula consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrgencyInputs {
    pub situation: SituationLabel,
    pub emotion: EmotionLabel,
    pub emotion_confidence: f64,
    pub stress_score: f64,
}

/// Every term of the fusion formula, kept for audit. `emotion_confidence`
/// and `stress_score` are recorded as received, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UrgencyBreakdown {
    pub base: f64,
    pub situation_weight: f64,
    pub emotion_weight: f64,
    pub emotion_confidence: f64,
    pub emotion_term: f64,
    pub stress_score: f64,
    pub stress_term: f64,
}

impl UrgencyBreakdown {
    /// Unrounded, unclamped sum of the terms.
    pub fn raw_total(&self) -> f64 {
        self.base + self.situation_weight + self.emotion_term + self.stress_term
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UrgencyAssessment {
    pub score: u8,
    pub level: UrgencyLevel,
    pub breakdown: UrgencyBreakdown,
}

/// Stateless fusion of situation, emotion and stress into a 0..=100 score.
///
/// ```text
/// emotion_term = emotion_weight * clamp(confidence, 0, 1)
/// stress_term  = clamp(stress, 0, 100) / 100 * 25
/// urgency      = clamp(round(10 + situation_weight + emotion_term + stress_term), 0, 100)
/// ```
///
/// Halves round to the nearest even integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrgencyFusionEngine;

impl UrgencyFusionEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn assess(&self, inputs: UrgencyInputs) -> UrgencyAssessment {
        let confidence = clamp_finite(inputs.emotion_confidence, 0.0, 1.0);
        let stress = clamp_finite(inputs.stress_score, 0.0, 100.0);

        let emotion_weight = emotion_weight(inputs.emotion);
        let breakdown = UrgencyBreakdown {
            base: BASE_URGENCY,
            situation_weight: situation_weight(inputs.situation),
            emotion_weight,
            emotion_confidence: inputs.emotion_confidence,
            emotion_term: emotion_weight * confidence,
            stress_score: inputs.stress_score,
            stress_term: stress / 100.0 * STRESS_TERM_MAX,
        };

        let score = breakdown.raw_total().round_ties_even().clamp(0.0, 100.0) as u8;

        UrgencyAssessment {
            score,
            level: UrgencyLevel::from_score(score),
            breakdown,
        }
    }
}

/// Clamps, mapping NaN to `min` and infinities to the nearest bound.
fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
