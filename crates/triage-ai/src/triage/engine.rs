use super::classification::{EmotionClassifier, SituationClassifier};
use super::domain::{
    EmotionClassification, EmotionLabel, Evidence, SituationClassification, SituationLabel,
};
use super::instruction::instruction_for_level;
use super::review::ReviewFlagPolicy;
use super::urgency::{UrgencyBreakdown, UrgencyFusionEngine, UrgencyInputs, UrgencyLevel};
use serde::{Serialize, Serializer};
use tracing::{debug, info};

/// Rule engine from transcript and stress score to a finished [`CallResult`].
///
/// Holds no per-call state; one engine serves every call in a batch.
#[derive(Debug, Clone, Default)]
pub struct TriageEngine {
    situation: SituationClassifier,
    emotion: EmotionClassifier,
    fusion: UrgencyFusionEngine,
    review: ReviewFlagPolicy,
}

impl TriageEngine {
    pub fn assess(
        &self,
        filename: impl Into<String>,
        transcript: impl Into<String>,
        stress: f64,
    ) -> CallResult {
        let filename = filename.into();
        let transcript = transcript.into();

        let situation = self.situation.classify(&transcript);
        let emotion = self.emotion.classify(&transcript);
        let urgency = self.fusion.assess(UrgencyInputs {
            situation: situation.label,
            emotion: emotion.label,
            emotion_confidence: emotion.confidence,
            stress_score: stress,
        });
        let manual_review =
            self.review
                .requires_review(situation.label, situation.confidence, emotion.confidence);

        debug!(
            filename = %filename,
            breakdown = ?urgency.breakdown,
            "urgency breakdown"
        );
        info!(
            filename = %filename,
            situation = %situation.label,
            emotion = %emotion.label,
            urgency = urgency.score,
            level = %urgency.level,
            manual_review,
            "call triaged"
        );

        CallResult {
            filename,
            transcript,
            situation,
            emotion,
            stress,
            urgency: urgency.score,
            level: urgency.level,
            instruction: instruction_for_level(urgency.level),
            breakdown: urgency.breakdown,
            manual_review,
        }
    }
}

/// Triage decision for one analyzed call. Built once by [`TriageEngine`] and
/// read through accessors afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    filename: String,
    transcript: String,
    situation: SituationClassification,
    emotion: EmotionClassification,
    stress: f64,
    urgency: u8,
    level: UrgencyLevel,
    instruction: &'static str,
    breakdown: UrgencyBreakdown,
    manual_review: bool,
}

impl CallResult {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn situation(&self) -> &SituationClassification {
        &self.situation
    }

    pub fn emotion(&self) -> &EmotionClassification {
        &self.emotion
    }

    pub fn stress(&self) -> f64 {
        self.stress
    }

    pub fn urgency(&self) -> u8 {
        self.urgency
    }

    pub fn level(&self) -> UrgencyLevel {
        self.level
    }

    pub fn instruction(&self) -> &'static str {
        self.instruction
    }

    pub fn breakdown(&self) -> &UrgencyBreakdown {
        &self.breakdown
    }

    pub fn manual_review(&self) -> bool {
        self.manual_review
    }

    pub fn evidence(&self) -> CallEvidence<'_> {
        CallEvidence {
            situation_hits: &self.situation.evidence,
            emotion_hits: &self.emotion.evidence,
        }
    }

    pub fn view(&self) -> CallResultView<'_> {
        CallResultView {
            filename: &self.filename,
            transcript: &self.transcript,
            situation: self.situation.label,
            situation_confidence: self.situation.confidence,
            emotion: self.emotion.label,
            emotion_confidence: self.emotion.confidence,
            stress: self.stress,
            urgency: self.urgency,
            level: self.level,
            level_label: self.level.label(),
            instruction: self.instruction,
            breakdown: &self.breakdown,
            evidence: self.evidence(),
            manual_review: self.manual_review,
        }
    }
}

impl Serialize for CallResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view().serialize(serializer)
    }
}

/// Keyword hits behind both classifications.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CallEvidence<'a> {
    pub situation_hits: &'a Evidence<SituationLabel>,
    pub emotion_hits: &'a Evidence<EmotionLabel>,
}

/// Flat response shape shared by the CLI `--json` output and the HTTP API.
#[derive(Debug, Clone, Serialize)]
pub struct CallResultView<'a> {
    pub filename: &'a str,
    pub transcript: &'a str,
    pub situation: SituationLabel,
    pub situation_confidence: f64,
    pub emotion: EmotionLabel,
    pub emotion_confidence: f64,
    pub stress: f64,
    pub urgency: u8,
    pub level: UrgencyLevel,
    pub level_label: &'static str,
    pub instruction: &'static str,
    pub breakdown: &'a UrgencyBreakdown,
    pub evidence: CallEvidence<'a>,
    pub manual_review: bool,
}
