//! Speech-to-text boundary.
//!
//! The engine only needs `transcribe(path, language) -> text`. The default
//! backend shells out to a local whisper.cpp-compatible binary; nothing here
//! talks to the network.

use crate::config::TranscriberConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

/// A loaded speech-to-text backend.
///
/// Takes `&mut self`: one instance runs one inference at a time.
pub trait Transcriber: Send {
    /// Returns the trimmed transcript, or an empty string when no speech was
    /// detected.
    fn transcribe(
        &mut self,
        audio: &Path,
        language: Option<&str>,
    ) -> Result<String, TranscriptionError>;
}

type Loader<T> = Box<dyn Fn() -> Result<T, TranscriptionError> + Send + Sync>;

/// Owns a lazily constructed transcriber and serializes access to it.
///
/// The first call pays the load cost; later calls reuse the same instance. A
/// failed load is not cached, so the next call retries.
pub struct TranscriberService<T> {
    loader: Loader<T>,
    instance: Mutex<Option<T>>,
}

impl<T: Transcriber> TranscriberService<T> {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<T, TranscriptionError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            instance: Mutex::new(None),
        }
    }

    /// Wraps an already constructed backend.
    pub fn ready(transcriber: T) -> Self
    where
        T: 'static,
    {
        Self {
            loader: Box::new(|| Err(TranscriptionError::Unavailable)),
            instance: Mutex::new(Some(transcriber)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.instance
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    pub fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
    ) -> Result<String, TranscriptionError> {
        let mut guard = self
            .instance
            .lock()
            .map_err(|_| TranscriptionError::Poisoned)?;

        if guard.is_none() {
            let started = Instant::now();
            let loaded = (self.loader)()?;
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "transcriber loaded"
            );
            *guard = Some(loaded);
        }

        match guard.as_mut() {
            Some(transcriber) => transcriber
                .transcribe(audio, language)
                .map(|text| text.trim().to_string()),
            None => Err(TranscriptionError::Unavailable),
        }
    }
}

impl<T> fmt::Debug for TranscriberService<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriberService").finish_non_exhaustive()
    }
}

/// Runs a whisper.cpp style CLI: `<command> -m <model> -f <wav> -l <lang> -nt -np`.
/// Stdout is taken as the transcript.
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    command: String,
    model: PathBuf,
}

impl CommandTranscriber {
    /// Checks that the model file exists; the binary itself is resolved on
    /// first use.
    pub fn load(config: &TranscriberConfig) -> Result<Self, TranscriptionError> {
        if !config.model.is_file() {
            return Err(TranscriptionError::ModelMissing(config.model.clone()));
        }
        Ok(Self {
            command: config.command.clone(),
            model: config.model.clone(),
        })
    }

    fn arguments(&self, audio: &Path, language: Option<&str>) -> Vec<String> {
        vec![
            "-m".to_string(),
            self.model.display().to_string(),
            "-f".to_string(),
            audio.display().to_string(),
            "-l".to_string(),
            language.unwrap_or("auto").to_string(),
            "-nt".to_string(),
            "-np".to_string(),
        ]
    }
}

impl Transcriber for CommandTranscriber {
    fn transcribe(
        &mut self,
        audio: &Path,
        language: Option<&str>,
    ) -> Result<String, TranscriptionError> {
        let output = Command::new(&self.command)
            .args(self.arguments(audio, language))
            .output()
            .map_err(|source| TranscriptionError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TranscriptionError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = collapse_lines(&String::from_utf8_lossy(&output.stdout));
        debug!(chars = text.len(), "transcription finished");
        Ok(text)
    }
}

/// Joins per-segment lines into one transcript.
fn collapse_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("speech model not found at {}", .0.display())]
    ModelMissing(PathBuf),
    #[error("unable to launch transcriber '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("transcriber exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },
    #[error("transcriber is unavailable")]
    Unavailable,
    #[error("transcriber lock poisoned by an earlier panic")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Echo(String);

    impl Transcriber for Echo {
        fn transcribe(
            &mut self,
            _audio: &Path,
            language: Option<&str>,
        ) -> Result<String, TranscriptionError> {
            Ok(format!("  {} [{}]  ", self.0, language.unwrap_or("auto")))
        }
    }

    #[test]
    fn loads_once_and_reuses_instance() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let service = TranscriberService::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Echo("help".to_string()))
        });

        assert!(!service.is_loaded());
        let first = service
            .transcribe(Path::new("a.wav"), None)
            .expect("transcribes");
        let second = service
            .transcribe(Path::new("b.wav"), Some("en"))
            .expect("transcribes");

        assert_eq!(first, "help [auto]");
        assert_eq!(second, "help [en]");
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(service.is_loaded());
    }

    /// Records how many inferences run at the same time.
    struct Tracked {
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl Transcriber for Tracked {
        fn transcribe(
            &mut self,
            audio: &Path,
            _language: Option<&str>,
        ) -> Result<String, TranscriptionError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(audio.display().to_string())
        }
    }

    #[test]
    fn concurrent_callers_share_one_instance_in_turn() {
        let loads = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (load_counter, active_handle, peak_handle) =
            (loads.clone(), active.clone(), peak.clone());
        let service = Arc::new(TranscriberService::new(move || {
            load_counter.fetch_add(1, Ordering::SeqCst);
            Ok(Tracked {
                active: active_handle.clone(),
                peak: peak_handle.clone(),
            })
        }));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                std::thread::spawn(move || {
                    service.transcribe(Path::new(&format!("call-{i}.wav")), None)
                })
            })
            .collect();

        let mut transcripts: Vec<String> = handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .expect("caller thread finished")
                    .expect("transcribes")
            })
            .collect();
        transcripts.sort();

        assert_eq!(transcripts.len(), 8);
        assert_eq!(transcripts[0], "call-0.wav");
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_load_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let service = TranscriberService::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(TranscriptionError::ModelMissing(PathBuf::from("missing.bin")))
            } else {
                Ok(Echo("ok".to_string()))
            }
        });

        assert!(matches!(
            service.transcribe(Path::new("a.wav"), None),
            Err(TranscriptionError::ModelMissing(_))
        ));
        assert!(service.transcribe(Path::new("a.wav"), None).is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn command_transcriber_requires_model() {
        let config = TranscriberConfig {
            command: "whisper-cli".to_string(),
            model: PathBuf::from("/nonexistent/ggml-tiny.bin"),
            language: None,
        };
        let err = CommandTranscriber::load(&config).expect_err("model missing");
        assert!(err.to_string().contains("ggml-tiny.bin"));
    }

    #[test]
    fn command_arguments_default_to_auto_language() {
        let transcriber = CommandTranscriber {
            command: "whisper-cli".to_string(),
            model: PathBuf::from("model.bin"),
        };
        let args = transcriber.arguments(Path::new("call.wav"), None);
        assert_eq!(
            args,
            vec!["-m", "model.bin", "-f", "call.wav", "-l", "auto", "-nt", "-np"]
        );
    }

    #[test]
    fn missing_binary_is_reported() {
        let mut transcriber = CommandTranscriber {
            command: "definitely-not-a-real-whisper-binary".to_string(),
            model: PathBuf::from("model.bin"),
        };
        let err = transcriber
            .transcribe(Path::new("call.wav"), None)
            .expect_err("binary missing");
        assert!(matches!(err, TranscriptionError::Spawn { .. }));
    }

    #[test]
    fn segments_are_joined() {
        assert_eq!(
            collapse_lines(" I'm trapped \n\n  under rubble\n"),
            "I'm trapped under rubble"
        );
    }
}
