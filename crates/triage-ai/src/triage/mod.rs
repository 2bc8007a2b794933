//! Emergency call triage: keyword classification, acoustic stress, urgency
//! fusion and operator queue ranking, plus the audio and speech boundaries
//! that feed them.

pub mod audio;
pub mod classification;
pub mod domain;
pub mod engine;
pub mod instruction;
pub mod queue;
pub mod review;
pub mod router;
pub mod service;
pub mod stress;
pub mod transcriber;
pub mod urgency;

#[cfg(test)]
mod testing;

pub use audio::{AudioError, AudioFrontEnd, ScopedFile, SymphoniaFrontEnd, Waveform};
pub use classification::{EmotionClassifier, SituationClassifier};
pub use domain::{
    Classification, EmotionClassification, EmotionLabel, Evidence, SituationClassification,
    SituationLabel,
};
pub use engine::{CallEvidence, CallResult, CallResultView, TriageEngine};
pub use instruction::{instruction_for, instruction_for_level};
pub use queue::{CallQueue, QueueEntry, QueueRanker, QueueRow, REPORT_FILE_NAME, TOP_N};
pub use review::ReviewFlagPolicy;
pub use router::triage_router;
pub use service::{AnalysisError, BatchFailure, BatchOutcome, CallSource, CallTriageService};
pub use stress::{StressEstimator, StressFeatures, StressNormalization, FALLBACK_STRESS};
pub use transcriber::{CommandTranscriber, Transcriber, TranscriberService, TranscriptionError};
pub use urgency::{
    UrgencyAssessment, UrgencyBreakdown, UrgencyFusionEngine, UrgencyInputs, UrgencyLevel,
};
