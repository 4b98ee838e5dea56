//! WAV file audio source for file-backed streaming and clip classification.

use crate::audio::source::AudioSource;
use crate::error::{MoodshError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// 100ms of audio per read at the target rate.
const CHUNK_MS: u32 = 100;

/// Audio source that reads from WAV file data.
/// Supports arbitrary sample rates, channel counts and sample formats,
/// converting to mono `f32` at the requested rate.
pub struct WavAudioSource {
    samples: Vec<f32>,
    position: usize,
    chunk_size: usize,
    sample_rate: u32,
}

impl WavAudioSource {
    /// Create from any reader, resampling to `target_rate`.
    pub fn from_reader(reader: Box<dyn Read + Send>, target_rate: u32) -> Result<Self> {
        let mut wav_reader = hound::WavReader::new(reader).map_err(|e| MoodshError::AudioFile {
            message: format!("Failed to parse WAV file: {}", e),
        })?;

        let spec = wav_reader.spec();
        if spec.channels == 0 {
            return Err(MoodshError::AudioFile {
                message: "WAV file declares zero channels".to_string(),
            });
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => wav_reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>(),
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
                wav_reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<Vec<_>, _>>()
            }
        }
        .map_err(|e| MoodshError::AudioFile {
            message: format!("Failed to read WAV samples: {}", e),
        })?;

        let mono = downmix(&interleaved, usize::from(spec.channels));
        let samples = resample(&mono, spec.sample_rate, target_rate);

        Ok(Self {
            samples,
            position: 0,
            chunk_size: (target_rate * CHUNK_MS / 1000).max(1) as usize,
            sample_rate: target_rate,
        })
    }

    /// Open a WAV file from disk, resampling to `target_rate`.
    pub fn from_path(path: &Path, target_rate: u32) -> Result<Self> {
        let file = File::open(path).map_err(|e| MoodshError::AudioFile {
            message: format!("Failed to open {}: {}", path.display(), e),
        })?;
        Self::from_reader(Box::new(BufReader::new(file)), target_rate)
    }

    /// Consume the source and return all samples as a single buffer.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Total number of samples after conversion.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl AudioSource for WavAudioSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.position = self.samples.len();
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if self.position >= self.samples.len() {
            return Ok(Vec::new());
        }

        let end = std::cmp::min(self.position + self.chunk_size, self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(chunk)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_finite(&self) -> bool {
        true
    }
}

/// Read a whole WAV file as mono `f32` at `target_rate`.
pub fn load_wav(path: &Path, target_rate: u32) -> Result<Vec<f32>> {
    Ok(WavAudioSource::from_path(path, target_rate)?.into_samples())
}

/// Average interleaved channels into one.
pub(crate) fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = (source_pos - source_idx as f64) as f32;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx];
                let right = samples[source_idx + 1];
                left + (right - left) * fraction
            }
        })
        .collect()
}

/// Linear-interpolation resampler for audio that arrives in pieces.
///
/// Carries the fractional read position and the last input sample from one
/// call to the next, so feeding a signal in chunks yields the same samples
/// as feeding it whole.
#[derive(Debug, Clone)]
pub struct StreamResampler {
    ratio: f64,
    passthrough: bool,
    /// Position of the next output sample, relative to `last` when present.
    position: f64,
    last: Option<f32>,
}

impl StreamResampler {
    pub fn new(from_rate: u32, to_rate: u32) -> Self {
        let passthrough = from_rate == to_rate || from_rate == 0 || to_rate == 0;
        Self {
            ratio: if passthrough {
                1.0
            } else {
                f64::from(from_rate) / f64::from(to_rate)
            },
            passthrough,
            position: 0.0,
            last: None,
        }
    }

    /// Resample the next chunk of a continuous signal.
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        if self.passthrough {
            return input.to_vec();
        }
        if input.is_empty() {
            return Vec::new();
        }

        let offset = usize::from(self.last.is_some());
        let len = input.len() + offset;
        let last = self.last;
        let sample = |i: usize| match last {
            Some(prev) if i == 0 => prev,
            _ => input[i - offset],
        };

        let mut output = Vec::with_capacity((len as f64 / self.ratio).ceil() as usize);
        loop {
            let idx = self.position.floor() as usize;
            if idx + 1 >= len {
                break;
            }
            let fraction = (self.position - idx as f64) as f32;
            let (left, right) = (sample(idx), sample(idx + 1));
            output.push(left + (right - left) * fraction);
            self.position += self.ratio;
        }

        // The final input sample becomes index 0 of the next call.
        self.position -= (len - 1) as f64;
        self.last = input.last().copied();
        output
    }
}
