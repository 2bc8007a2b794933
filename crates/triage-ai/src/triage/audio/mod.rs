//! Audio front end: decode, down-mix, resample, cap, normalize and re-encode
//! uploaded calls into a uniform 16-bit mono WAV.

mod cleaner;
mod scoped;

pub use cleaner::SymphoniaFrontEnd;
pub use scoped::ScopedFile;

use std::path::Path;

/// Upload extensions the request boundary accepts.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["wav", "mp3", "m4a"];

/// Peak level applied by normalization, as a fraction of full scale.
pub const PEAK_TARGET: f32 = 0.95;

/// Mono PCM samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Turns an arbitrary recording into the cleaned form the rest of the
/// pipeline consumes.
pub trait AudioFrontEnd: Send + Sync {
    /// Writes a cleaned copy of `input` into a scoped temp file.
    fn clean(&self, input: &Path) -> Result<ScopedFile, AudioError>;

    /// Reads a cleaned file back as a mono waveform.
    fn load(&self, cleaned: &Path) -> Result<Waveform, AudioError>;
}

pub fn is_supported_extension(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(extension))
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("unable to read audio: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported or corrupt audio: {0}")]
    Unsupported(String),
    #[error("no decodable audio track found")]
    NoAudioTrack,
    #[error("decoding failed: {0}")]
    Decode(String),
    #[error("audio contains no samples")]
    Empty,
    #[error("resampling failed: {0}")]
    Resample(String),
    #[error("wav encoding failed: {0}")]
    Wav(#[from] hound::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_supported_extension("WAV"));
        assert!(is_supported_extension("m4a"));
        assert!(!is_supported_extension("flac"));
        assert!(!is_supported_extension(""));
    }

    #[test]
    fn duration_follows_sample_rate() {
        let waveform = Waveform::new(vec![0.0; 8_000], 16_000);
        assert_eq!(waveform.duration_secs(), 0.5);
        assert_eq!(Waveform::new(vec![0.0; 10], 0).duration_secs(), 0.0);
    }
}
