use crate::defaults;
use crate::error::{MoodshError, Result};
use std::collections::VecDeque;

/// Trait for audio source devices.
///
/// This trait allows swapping implementations (real audio device, WAV file, mock).
/// Sources deliver mono `f32` samples in [-1, 1] at `sample_rate()`.
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    fn stop(&mut self) -> Result<()>;

    /// Drain whatever samples are currently available.
    ///
    /// An empty vector means "nothing yet" for live sources and "exhausted"
    /// for finite ones.
    fn read_samples(&mut self) -> Result<Vec<f32>>;

    /// Sample rate of the delivered samples, in Hz.
    fn sample_rate(&self) -> u32;

    /// Whether the source ends (file, pipe) rather than streaming forever.
    fn is_finite(&self) -> bool {
        false
    }
}

/// Mock audio source for testing
///
/// Serves scripted chunks in order. Once the script is exhausted it returns
/// empty reads, which a finite mock reports as end of input.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    chunks: VecDeque<Vec<f32>>,
    sample_rate: u32,
    finite: bool,
    should_fail_start: bool,
    fail_read_after: Option<usize>,
    reads: usize,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new, finite mock audio source with no samples
    pub fn new() -> Self {
        Self {
            is_started: false,
            chunks: VecDeque::new(),
            sample_rate: defaults::SAMPLE_RATE,
            finite: true,
            should_fail_start: false,
            fail_read_after: None,
            reads: 0,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Queue one chunk of samples
    pub fn with_chunk(mut self, samples: Vec<f32>) -> Self {
        self.chunks.push_back(samples);
        self
    }

    /// Queue `count` chunks of `len` samples at a constant amplitude
    pub fn with_constant_chunks(mut self, count: usize, len: usize, amplitude: f32) -> Self {
        for _ in 0..count {
            self.chunks.push_back(vec![amplitude; len]);
        }
        self
    }

    /// Report a different delivery sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Behave like a live device: empty reads mean "wait", not "done"
    pub fn live(mut self) -> Self {
        self.finite = false;
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail every read after `reads` successful ones
    pub fn with_read_failure_after(mut self, reads: usize) -> Self {
        self.fail_read_after = Some(reads);
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the audio source is started
    pub fn is_started(&self) -> bool {
        self.is_started
    }

    /// Number of chunks not yet read
    pub fn remaining_chunks(&self) -> usize {
        self.chunks.len()
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(MoodshError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if let Some(limit) = self.fail_read_after
            && self.reads >= limit
        {
            return Err(MoodshError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.reads += 1;
        Ok(self.chunks.pop_front().unwrap_or_default())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_finite(&self) -> bool {
        self.finite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_audio_source_returns_chunks_in_order() {
        let mut source = MockAudioSource::new()
            .with_chunk(vec![0.1, 0.2])
            .with_chunk(vec![0.3]);

        assert_eq!(source.read_samples().unwrap(), vec![0.1, 0.2]);
        assert_eq!(source.read_samples().unwrap(), vec![0.3]);
        assert!(source.read_samples().unwrap().is_empty());
    }

    #[test]
    fn test_mock_audio_source_constant_chunks() {
        let mut source = MockAudioSource::new().with_constant_chunks(3, 4, 0.5);
        assert_eq!(source.remaining_chunks(), 3);
        assert_eq!(source.read_samples().unwrap(), vec![0.5; 4]);
        assert_eq!(source.remaining_chunks(), 2);
    }

    #[test]
    fn test_mock_audio_source_read_failure_after() {
        let mut source = MockAudioSource::new()
            .with_constant_chunks(5, 2, 0.1)
            .with_read_failure_after(2)
            .with_error_message("device unplugged");

        assert!(source.read_samples().is_ok());
        assert!(source.read_samples().is_ok());
        match source.read_samples() {
            Err(MoodshError::AudioCapture { message }) => {
                assert_eq!(message, "device unplugged");
            }
            other => panic!("Expected AudioCapture error, got {:?}", other),
        }
    }

    #[test]
    fn test_mock_audio_source_start_stop_state_management() {
        let mut source = MockAudioSource::new();
        assert!(!source.is_started());

        source.start().unwrap();
        assert!(source.is_started());

        source.stop().unwrap();
        assert!(!source.is_started());
    }

    #[test]
    fn test_mock_audio_source_start_failure() {
        let mut source = MockAudioSource::new().with_start_failure();
        assert!(source.start().is_err());
        assert!(!source.is_started());
    }

    #[test]
    fn test_mock_audio_source_finite_by_default() {
        assert!(MockAudioSource::new().is_finite());
        assert!(!MockAudioSource::new().live().is_finite());
    }

    #[test]
    fn test_mock_audio_source_sample_rate() {
        assert_eq!(MockAudioSource::new().sample_rate(), 16000);
        assert_eq!(
            MockAudioSource::new().with_sample_rate(44100).sample_rate(),
            44100
        );
    }

    #[test]
    fn test_audio_source_trait_is_object_safe() {
        let mut source: Box<dyn AudioSource> =
            Box::new(MockAudioSource::new().with_chunk(vec![1.0, -1.0]));

        assert!(source.start().is_ok());
        assert_eq!(source.read_samples().unwrap(), vec![1.0, -1.0]);
        assert!(source.stop().is_ok());
    }
}
