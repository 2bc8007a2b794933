use super::{AudioError, AudioFrontEnd, ScopedFile, Waveform, PEAK_TARGET};
use crate::config::AudioConfig;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::fs::File;
use std::io;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Front end built on symphonia (decode), rubato (resample) and hound (encode).
#[derive(Debug, Clone)]
pub struct SymphoniaFrontEnd {
    config: AudioConfig,
}

impl SymphoniaFrontEnd {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }
}

impl AudioFrontEnd for SymphoniaFrontEnd {
    fn clean(&self, input: &Path) -> Result<ScopedFile, AudioError> {
        let (mono, native_rate) = decode_mono(input, self.config.max_audio_seconds)?;
        debug!(
            path = %input.display(),
            native_rate,
            frames = mono.len(),
            "decoded call audio"
        );

        let mut samples = resample(mono, native_rate, self.config.sample_rate)?;
        samples.truncate(self.config.max_samples());
        if samples.is_empty() {
            return Err(AudioError::Empty);
        }
        normalize_peak(&mut samples);

        let cleaned = ScopedFile::create_in(&self.config.temp_dir, ".clean.wav")?;
        write_pcm16(cleaned.path(), &samples, self.config.sample_rate)?;
        debug!(
            path = %cleaned.path().display(),
            seconds = samples.len() as f64 / f64::from(self.config.sample_rate),
            "wrote cleaned audio"
        );
        Ok(cleaned)
    }

    fn load(&self, cleaned: &Path) -> Result<Waveform, AudioError> {
        let mut reader = WavReader::open(cleaned)?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
            SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        };

        Ok(Waveform::new(down_mix(&interleaved, channels), spec.sample_rate))
    }
}

/// Decodes the first audio track, averaging channels, and stops once
/// `max_seconds` of audio has been read.
fn decode_mono(path: &Path, max_seconds: u32) -> Result<(Vec<f32>, u32), AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| AudioError::Unsupported(err.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoAudioTrack)?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let native_rate = codec_params
        .sample_rate
        .ok_or_else(|| AudioError::Unsupported("sample rate not declared".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|err| AudioError::Unsupported(err.to_string()))?;

    let frame_cap = native_rate as usize * max_seconds as usize;
    let mut mono = Vec::new();

    while mono.len() < frame_cap {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(AudioError::Decode(err.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                debug!(reason, "skipping undecodable packet");
                continue;
            }
            Err(err) => return Err(AudioError::Decode(err.to_string())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        mono.extend(down_mix(buffer.samples(), channels));
    }

    mono.truncate(frame_cap);
    Ok((mono, native_rate))
}

fn down_mix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

fn resample(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples);
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = f64::from(to_rate) / f64::from(from_rate);

    let expected = (samples.len() as f64 * ratio).round() as usize;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .map_err(|err| AudioError::Resample(err.to_string()))?;
    let delay = resampler.output_delay();

    let head = resampler
        .process(&[samples], None)
        .map_err(|err| AudioError::Resample(err.to_string()))?;
    // Flush the filter so the tail held back by the delay is emitted.
    let tail = resampler
        .process_partial(None::<&[Vec<f32>]>, None)
        .map_err(|err| AudioError::Resample(err.to_string()))?;

    let resampled = head
        .into_iter()
        .chain(tail)
        .flatten()
        .skip(delay)
        .take(expected)
        .collect();
    Ok(resampled)
}

/// Scales so the loudest sample sits at [`PEAK_TARGET`] of full scale.
fn normalize_peak(samples: &mut [f32]) {
    let peak = samples
        .iter()
        .fold(0.0f32, |peak, sample| peak.max(sample.abs()))
        + 1e-9;
    for sample in samples.iter_mut() {
        *sample = *sample / peak * PEAK_TARGET;
    }
}

fn write_pcm16(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        writer.write_sample(value)?;
    }
    writer.finalize()?;
    Ok(())
}
