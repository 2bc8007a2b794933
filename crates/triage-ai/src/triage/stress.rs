//! Acoustic stress proxy computed from the cleaned waveform.
//!
//! Three short-time features are averaged over the whole clip:
//! - RMS energy (loudness)
//! - zero-crossing rate (roughness)
//! - spectral centroid in Hz (sharpness)
//!
//! Each is divided by a fixed ceiling, clamped to `[0, 1]` and blended
//! 0.50 / 0.25 / 0.25 into a `0..=100` score.

use super::audio::Waveform;
use realfft::RealFftPlanner;
use serde::Serialize;
use tracing::debug;

pub const FRAME_LENGTH: usize = 2048;
pub const HOP_LENGTH: usize = 512;

/// Clips shorter than this are scored as [`FALLBACK_STRESS`].
pub const MIN_DURATION_SECS: f64 = 0.5;
pub const FALLBACK_STRESS: f64 = 30.0;

const ZERO_THRESHOLD: f64 = 1e-10;

/// Clip-level averages of the three stress features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StressFeatures {
    pub rms: f64,
    pub zero_crossing_rate: f64,
    pub spectral_centroid_hz: f64,
}

/// Heuristic ceilings and blend weights used to turn features into a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressNormalization {
    pub rms_ceiling: f64,
    pub zcr_ceiling: f64,
    pub centroid_ceiling_hz: f64,
    pub rms_weight: f64,
    pub zcr_weight: f64,
    pub centroid_weight: f64,
}

impl Default for StressNormalization {
    fn default() -> Self {
        Self {
            rms_ceiling: 0.12,
            zcr_ceiling: 0.12,
            centroid_ceiling_hz: 3000.0,
            rms_weight: 0.50,
            zcr_weight: 0.25,
            centroid_weight: 0.25,
        }
    }
}

impl StressNormalization {
    pub fn score(&self, features: &StressFeatures) -> f64 {
        let energy = unit(features.rms / self.rms_ceiling);
        let roughness = unit(features.zero_crossing_rate / self.zcr_ceiling);
        let sharpness = unit(features.spectral_centroid_hz / self.centroid_ceiling_hz);

        let blended = self.rms_weight * energy
            + self.zcr_weight * roughness
            + self.centroid_weight * sharpness;
        round_to(blended * 100.0, 2)
    }
}

fn unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else if value == f64::INFINITY {
        1.0
    } else {
        0.0
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[derive(Debug, Clone, Default)]
pub struct StressEstimator {
    normalization: StressNormalization,
}

impl StressEstimator {
    /// Stress score in `[0, 100]`, rounded to two decimals.
    pub fn estimate(&self, waveform: &Waveform) -> f64 {
        match self.features(waveform) {
            Some(features) => {
                let score = self.normalization.score(&features);
                debug!(
                    rms = features.rms,
                    zcr = features.zero_crossing_rate,
                    centroid_hz = features.spectral_centroid_hz,
                    score,
                    "stress features"
                );
                score
            }
            None => FALLBACK_STRESS,
        }
    }

    pub fn score_features(&self, features: &StressFeatures) -> f64 {
        self.normalization.score(features)
    }

    /// `None` when the clip is too short to carry a usable signal.
    pub fn features(&self, waveform: &Waveform) -> Option<StressFeatures> {
        if waveform.sample_rate == 0 || waveform.duration_secs() < MIN_DURATION_SECS {
            return None;
        }

        let samples: Vec<f64> = waveform.samples.iter().map(|&s| f64::from(s)).collect();
        Some(StressFeatures {
            rms: mean_rms(&samples),
            zero_crossing_rate: mean_zero_crossing_rate(&samples),
            spectral_centroid_hz: mean_spectral_centroid(&samples, waveform.sample_rate),
        })
    }
}

#[derive(Clone, Copy)]
enum Padding {
    Zeros,
    Edge,
}

/// Pads half a frame on both sides so frame `t` is centred on sample
/// `t * HOP_LENGTH`.
fn centred(samples: &[f64], padding: Padding) -> Vec<f64> {
    let pad = FRAME_LENGTH / 2;
    let (head, tail) = match padding {
        Padding::Zeros => (0.0, 0.0),
        Padding::Edge => (
            samples.first().copied().unwrap_or(0.0),
            samples.last().copied().unwrap_or(0.0),
        ),
    };

    let mut padded = Vec::with_capacity(samples.len() + 2 * pad);
    padded.resize(pad, head);
    padded.extend_from_slice(samples);
    padded.resize(padded.len() + pad, tail);
    padded
}

fn frames(padded: &[f64]) -> impl Iterator<Item = &[f64]> {
    padded.windows(FRAME_LENGTH).step_by(HOP_LENGTH)
}

fn mean<I: Iterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn mean_rms(samples: &[f64]) -> f64 {
    let padded = centred(samples, Padding::Zeros);
    mean(frames(&padded).map(|frame| {
        let power = frame.iter().map(|s| s * s).sum::<f64>() / frame.len() as f64;
        power.sqrt()
    }))
}

fn mean_zero_crossing_rate(samples: &[f64]) -> f64 {
    let padded = centred(samples, Padding::Edge);
    mean(frames(&padded).map(|frame| {
        let crossings = frame
            .windows(2)
            .filter(|pair| is_negative(pair[0]) != is_negative(pair[1]))
            .count();
        crossings as f64 / frame.len() as f64
    }))
}

/// Near-zero samples count as positive.
fn is_negative(sample: f64) -> bool {
    sample.abs() > ZERO_THRESHOLD && sample.is_sign_negative()
}

fn mean_spectral_centroid(samples: &[f64], sample_rate: u32) -> f64 {
    let padded = centred(samples, Padding::Zeros);
    let window = hann(FRAME_LENGTH);
    let bin_hz = f64::from(sample_rate) / FRAME_LENGTH as f64;

    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(FRAME_LENGTH);
    let mut input = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();

    mean(frames(&padded).map(|frame| {
        for ((slot, sample), weight) in input.iter_mut().zip(frame).zip(&window) {
            *slot = sample * weight;
        }
        if fft.process(&mut input, &mut spectrum).is_err() {
            return 0.0;
        }

        let (weighted, total) = spectrum.iter().enumerate().fold(
            (0.0, 0.0),
            |(weighted, total), (bin, value)| {
                let magnitude = value.norm();
                (weighted + bin as f64 * bin_hz * magnitude, total + magnitude)
            },
        );

        if total > f64::MIN_POSITIVE {
            weighted / total
        } else {
            0.0
        }
    }))
}

/// Periodic Hann window, as used for spectral analysis.
fn hann(length: usize) -> Vec<f64> {
    (0..length)
        .map(|n| {
            0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / length as f64).cos()
        })
        .collect()
}
