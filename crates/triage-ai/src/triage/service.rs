use super::audio::{
    is_supported_extension, AudioError, AudioFrontEnd, ScopedFile, SymphoniaFrontEnd,
};
use super::engine::{CallResult, TriageEngine};
use super::queue::{CallQueue, QueueRanker};
use super::stress::StressEstimator;
use super::transcriber::{
    CommandTranscriber, Transcriber, TranscriberService, TranscriptionError,
};
use crate::config::AppConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Audio handed to the pipeline: a file already on disk, or uploaded bytes
/// that get staged into the scratch directory first.
#[derive(Debug, Clone)]
pub enum CallSource {
    Path(PathBuf),
    Upload { filename: String, bytes: Vec<u8> },
}

impl CallSource {
    /// Name reported in results and errors.
    pub fn filename(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Upload { filename, .. } => filename.clone(),
        }
    }

    fn extension(&self) -> Option<String> {
        let path = match self {
            Self::Path(path) => path.as_path(),
            Self::Upload { filename, .. } => Path::new(filename),
        };
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }
}

/// Service composing the audio front end, transcriber, stress estimator and
/// rule engine into the per-call pipeline.
pub struct CallTriageService<F, T> {
    front_end: Arc<F>,
    transcriber: Arc<TranscriberService<T>>,
    engine: TriageEngine,
    stress: StressEstimator,
    ranker: QueueRanker,
    temp_dir: PathBuf,
    default_language: Option<String>,
}

impl CallTriageService<SymphoniaFrontEnd, CommandTranscriber> {
    /// Production wiring: symphonia front end plus the local speech command,
    /// loaded on first use.
    pub fn from_config(config: &AppConfig) -> Self {
        let transcriber_config = config.transcriber.clone();
        let transcriber =
            TranscriberService::new(move || CommandTranscriber::load(&transcriber_config));

        Self::new(
            Arc::new(SymphoniaFrontEnd::new(config.audio.clone())),
            Arc::new(transcriber),
            config.audio.temp_dir.clone(),
        )
        .with_default_language(config.transcriber.language.clone())
    }
}

impl<F, T> CallTriageService<F, T>
where
    F: AudioFrontEnd + 'static,
    T: Transcriber + 'static,
{
    pub fn new(
        front_end: Arc<F>,
        transcriber: Arc<TranscriberService<T>>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            front_end,
            transcriber,
            engine: TriageEngine::default(),
            stress: StressEstimator::default(),
            ranker: QueueRanker,
            temp_dir,
            default_language: None,
        }
    }

    /// Language used when a request does not name one.
    pub fn with_default_language(mut self, language: Option<String>) -> Self {
        self.default_language = language;
        self
    }

    /// Runs the rule engine on an existing transcript, skipping audio.
    pub fn score_transcript(&self, filename: &str, transcript: &str, stress: f64) -> CallResult {
        self.engine.assess(filename, transcript, stress)
    }

    /// Clean, transcribe, classify, estimate stress and fuse one call.
    ///
    /// Staged uploads and cleaned audio are scoped files, released before
    /// this returns whether or not the call succeeded.
    pub fn analyze(
        &self,
        source: CallSource,
        language: Option<&str>,
    ) -> Result<CallResult, AnalysisError> {
        let filename = source.filename();
        let extension = source
            .extension()
            .filter(|ext| is_supported_extension(ext))
            .ok_or_else(|| AnalysisError::UnsupportedFormat {
                filename: filename.clone(),
            })?;

        let language = language.or(self.default_language.as_deref());
        let started = Instant::now();

        let result = match source {
            CallSource::Path(path) => self.run(filename, &path, language)?,
            CallSource::Upload { bytes, .. } => {
                let staged =
                    ScopedFile::with_bytes(&self.temp_dir, &format!(".{extension}"), &bytes)
                        .map_err(|source| AnalysisError::Staging {
                            filename: filename.clone(),
                            source,
                        })?;
                self.run(filename, staged.path(), language)?
            }
        };

        info!(
            filename = %result.filename(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "call analyzed"
        );
        Ok(result)
    }

    fn run(
        &self,
        filename: String,
        input: &Path,
        language: Option<&str>,
    ) -> Result<CallResult, AnalysisError> {
        let cleaned = self
            .front_end
            .clean(input)
            .map_err(|source| AnalysisError::Audio {
                filename: filename.clone(),
                source,
            })?;

        let transcript = self
            .transcriber
            .transcribe(cleaned.path(), language)
            .map_err(|source| AnalysisError::Transcription {
                filename: filename.clone(),
                source,
            })?;

        let waveform = self
            .front_end
            .load(cleaned.path())
            .map_err(|source| AnalysisError::Audio {
                filename: filename.clone(),
                source,
            })?;
        let stress = self.stress.estimate(&waveform);

        Ok(self.engine.assess(filename, transcript, stress))
    }

    /// Analyzes every source in order. A failing call is recorded and
    /// skipped; the rest are still ranked.
    pub fn analyze_batch(&self, sources: Vec<CallSource>, language: Option<&str>) -> BatchOutcome {
        let mut results = Vec::with_capacity(sources.len());
        let mut failures = Vec::new();

        for source in sources {
            match self.analyze(source, language) {
                Ok(result) => results.push(result),
                Err(error) => {
                    warn!(
                        filename = %error.filename(),
                        stage = error.stage(),
                        error = %error,
                        "call failed; continuing batch"
                    );
                    failures.push(BatchFailure::from(&error));
                }
            }
        }

        let queue = self.ranker.rank(results);
        info!(ranked = queue.len(), failed = failures.len(), "batch ranked");
        BatchOutcome { queue, failures }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub queue: CallQueue,
    pub failures: Vec<BatchFailure>,
}

/// A call that produced no result, reported next to the ranked queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub filename: String,
    pub stage: &'static str,
    pub error: String,
}

impl From<&AnalysisError> for BatchFailure {
    fn from(error: &AnalysisError) -> Self {
        Self {
            filename: error.filename().to_string(),
            stage: error.stage(),
            error: error.to_string(),
        }
    }
}

/// Error raised while analyzing a single call.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("{filename}: unsupported file type (accepted: wav, mp3, m4a)")]
    UnsupportedFormat { filename: String },
    #[error("{filename}: unable to stage upload: {source}")]
    Staging {
        filename: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{filename}: audio processing failed: {source}")]
    Audio {
        filename: String,
        #[source]
        source: AudioError,
    },
    #[error("{filename}: transcription failed: {source}")]
    Transcription {
        filename: String,
        #[source]
        source: TranscriptionError,
    },
}

impl AnalysisError {
    pub fn filename(&self) -> &str {
        match self {
            Self::UnsupportedFormat { filename }
            | Self::Staging { filename, .. }
            | Self::Audio { filename, .. }
            | Self::Transcription { filename, .. } => filename,
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } | Self::Staging { .. } => "intake",
            Self::Audio { .. } => "audio",
            Self::Transcription { .. } => "transcription",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::domain::SituationLabel;
    use crate::triage::stress::FALLBACK_STRESS;
    use crate::triage::testing::{CopyFrontEnd, ReadBack};
    use std::fs;

    type TestService = CallTriageService<CopyFrontEnd, ReadBack>;

    fn service(scratch: &Path) -> (Arc<CopyFrontEnd>, TestService) {
        let front_end = Arc::new(CopyFrontEnd::new(scratch));
        let service = CallTriageService::new(
            front_end.clone(),
            Arc::new(TranscriberService::ready(ReadBack)),
            scratch.to_path_buf(),
        );
        (front_end, service)
    }

    fn upload(filename: &str, body: &str) -> CallSource {
        CallSource::Upload {
            filename: filename.to_string(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn upload_is_analyzed_and_scratch_is_released() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (front_end, service) = service(dir.path());

        let result = service
            .analyze(upload("call-7.WAV", "there is fire and smoke"), None)
            .expect("analysis succeeds");

        assert_eq!(result.filename(), "call-7.WAV");
        assert_eq!(result.situation().label, SituationLabel::FireSmoke);
        assert_eq!(result.stress(), FALLBACK_STRESS);

        let seen = front_end.seen();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].to_string_lossy().ends_with(".wav"));
        assert!(seen.iter().all(|path| !path.exists()));
    }

    #[test]
    fn unsupported_extension_is_rejected_before_staging() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (_, service) = service(dir.path());

        let err = service
            .analyze(upload("notes.txt", "trapped"), None)
            .expect_err("rejected");
        assert!(matches!(err, AnalysisError::UnsupportedFormat { .. }));
        assert_eq!(err.stage(), "intake");
        assert_eq!(fs::read_dir(dir.path()).expect("listable").count(), 0);
    }

    #[test]
    fn batch_skips_failures_and_cleans_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (_, service) = service(dir.path());

        let outcome = service.analyze_batch(
            vec![
                upload("a.wav", "he is hurt"),
                upload("broken.mp3", "corrupt bytes"),
                upload("b.m4a", "I'm trapped under rubble, please help, panic!"),
                upload("c.flac", "fire"),
            ],
            Some("en"),
        );

        let ranked: Vec<&str> = outcome
            .queue
            .entries()
            .iter()
            .map(|entry| entry.result.filename())
            .collect();
        assert_eq!(ranked, vec!["b.m4a", "a.wav"]);

        let failed: Vec<(&str, &str)> = outcome
            .failures
            .iter()
            .map(|failure| (failure.filename.as_str(), failure.stage))
            .collect();
        assert_eq!(failed, vec![("broken.mp3", "audio"), ("c.flac", "intake")]);
        assert!(outcome.failures[0].error.contains("corrupt header"));

        assert_eq!(fs::read_dir(dir.path()).expect("listable").count(), 0);
    }

    #[test]
    fn transcription_failures_are_isolated_and_cleaned_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scratch = dir.path().join("scratch");
        let (front_end, service) = service(&scratch);

        let recorded = dir.path().join("recorded.wav");
        fs::write(&recorded, "garbled line noise").expect("input written");

        let outcome = service.analyze_batch(
            vec![
                upload("first.wav", "garbled static"),
                upload("second.wav", "there is smoke"),
                CallSource::Path(recorded.clone()),
            ],
            None,
        );

        let ranked: Vec<&str> = outcome
            .queue
            .entries()
            .iter()
            .map(|entry| entry.result.filename())
            .collect();
        assert_eq!(ranked, vec!["second.wav"]);

        let failed: Vec<(&str, &str)> = outcome
            .failures
            .iter()
            .map(|failure| (failure.filename.as_str(), failure.stage))
            .collect();
        assert_eq!(
            failed,
            vec![("first.wav", "transcription"), ("recorded.wav", "transcription")]
        );
        assert!(outcome.failures[0].error.contains("failed to decode speech"));

        assert!(front_end
            .seen()
            .iter()
            .filter(|path| path.starts_with(&scratch))
            .all(|path| !path.exists()));
        assert_eq!(fs::read_dir(&scratch).expect("listable").count(), 0);
        assert!(recorded.exists());
    }

    #[test]
    fn single_transcription_failure_reports_stage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (_, service) = service(dir.path());

        let err = service
            .analyze(upload("call.m4a", "garbled"), Some("en"))
            .expect_err("transcription fails");
        assert!(matches!(err, AnalysisError::Transcription { .. }));
        assert_eq!(err.stage(), "transcription");
        assert_eq!(err.filename(), "call.m4a");
        assert_eq!(fs::read_dir(dir.path()).expect("listable").count(), 0);
    }

    #[test]
    fn path_source_uses_file_name() {
        let source = CallSource::Path(PathBuf::from("/calls/incoming/call-3.mp3"));
        assert_eq!(source.filename(), "call-3.mp3");
        assert_eq!(source.extension().as_deref(), Some("mp3"));
    }

    #[test]
    fn transcript_scoring_skips_audio() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (front_end, service) = service(dir.path());
        let result = service.score_transcript("typed", "we are safe", 30.0);
        assert_eq!(result.situation().label, SituationLabel::Safe);
        assert!(front_end.seen().is_empty());
    }
}
