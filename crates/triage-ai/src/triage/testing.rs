//! In-process fakes for the audio and speech boundaries.

use super::audio::{AudioError, AudioFrontEnd, ScopedFile, Waveform};
use super::transcriber::{Transcriber, TranscriptionError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// "Cleans" by copying the input into a scoped file and serves a 0.1 s
/// silent clip, so stress falls back to its default. Inputs starting with
/// `corrupt` are rejected.
pub(crate) struct CopyFrontEnd {
    scratch: PathBuf,
    seen: Mutex<Vec<PathBuf>>,
}

impl CopyFrontEnd {
    pub(crate) fn new(scratch: &Path) -> Self {
        Self {
            scratch: scratch.to_path_buf(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Cleaned output and input path of every successful call, in pairs.
    pub(crate) fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl AudioFrontEnd for CopyFrontEnd {
    fn clean(&self, input: &Path) -> Result<ScopedFile, AudioError> {
        let bytes = fs::read(input)?;
        if bytes.starts_with(b"corrupt") {
            return Err(AudioError::Unsupported("corrupt header".to_string()));
        }
        let cleaned = ScopedFile::with_bytes(&self.scratch, ".clean.wav", &bytes)?;
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(cleaned.path().to_path_buf());
            seen.push(input.to_path_buf());
        }
        Ok(cleaned)
    }

    fn load(&self, _cleaned: &Path) -> Result<Waveform, AudioError> {
        Ok(Waveform::new(vec![0.0; 1_600], 16_000))
    }
}

/// Uses the cleaned file's text as the transcript. Text starting with
/// `garbled` makes the speech command fail.
pub(crate) struct ReadBack;

impl Transcriber for ReadBack {
    fn transcribe(
        &mut self,
        audio: &Path,
        _language: Option<&str>,
    ) -> Result<String, TranscriptionError> {
        let text = fs::read_to_string(audio).unwrap_or_default();
        if text.starts_with("garbled") {
            return Err(TranscriptionError::Failed {
                status: Some(1),
                stderr: "failed to decode speech".to_string(),
            });
        }
        Ok(text)
    }
}
