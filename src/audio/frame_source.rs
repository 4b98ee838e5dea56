//! Fixed-duration framing on top of an [`AudioSource`].

use crate::audio::frame::AudioFrame;
use crate::audio::source::AudioSource;
use crate::defaults;
use crate::error::{MoodshError, Result};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Turns arbitrary-sized device reads into fixed-length frames.
///
/// Samples read beyond the end of one frame are kept for the next, so
/// consecutive frames are contiguous.
pub struct FrameSource {
    source: Box<dyn AudioSource>,
    pending: Vec<f32>,
    sequence: u64,
    poll_interval: Duration,
    stall_timeout: Duration,
    started: bool,
}

impl FrameSource {
    pub fn new(source: Box<dyn AudioSource>) -> Self {
        Self {
            source,
            pending: Vec::new(),
            sequence: 0,
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
            stall_timeout: Duration::from_millis(defaults::STALL_TIMEOUT_MS),
            started: false,
        }
    }

    /// Sets how long to sleep between empty reads of a live source.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets how long a live source may deliver no samples at all before it
    /// is treated as disconnected.
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Starts the underlying source. Calling it twice is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.source.start()?;
        self.started = true;
        Ok(())
    }

    /// Stops the underlying source and discards buffered samples.
    pub fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        self.pending.clear();
        self.source.stop()
    }

    /// Number of frames produced so far.
    pub fn frames_produced(&self) -> u64 {
        self.sequence
    }

    /// Blocks until a full frame of `duration_secs` at `sample_rate` is available.
    ///
    /// Returns `Ok(None)` once a finite source is exhausted; a trailing
    /// partial frame is dropped.
    ///
    /// # Errors
    /// - `ConfigInvalidValue` if the frame would hold no samples
    /// - `AudioFormatMismatch` if the source delivers a different rate
    /// - `AudioCapture` if the source fails or stalls past the timeout
    pub fn next_frame(&mut self, duration_secs: f32, sample_rate: u32) -> Result<Option<AudioFrame>> {
        let needed = defaults::samples_for(duration_secs, sample_rate);
        if needed == 0 {
            return Err(MoodshError::invalid_config(
                "audio.frame_duration_secs",
                format!("{duration_secs}s at {sample_rate} Hz yields an empty frame"),
            ));
        }

        let source_rate = self.source.sample_rate();
        if source_rate != sample_rate {
            return Err(MoodshError::AudioFormatMismatch {
                expected: format!("{sample_rate} Hz mono"),
                actual: format!("{source_rate} Hz mono"),
            });
        }

        if !self.started {
            self.start()?;
        }

        let mut last_progress = Instant::now();
        while self.pending.len() < needed {
            let chunk = self.source.read_samples()?;

            if chunk.is_empty() {
                if self.source.is_finite() {
                    if !self.pending.is_empty() {
                        debug!(
                            samples = self.pending.len(),
                            needed, "input exhausted, dropping partial frame"
                        );
                        self.pending.clear();
                    }
                    return Ok(None);
                }
                if last_progress.elapsed() >= self.stall_timeout {
                    return Err(MoodshError::AudioCapture {
                        message: format!(
                            "no audio received for {} ms; is the microphone still connected?",
                            self.stall_timeout.as_millis()
                        ),
                    });
                }
                thread::sleep(self.poll_interval);
                continue;
            }

            last_progress = Instant::now();
            self.pending.extend_from_slice(&chunk);
        }

        let rest = self.pending.split_off(needed);
        let samples = std::mem::replace(&mut self.pending, rest);
        let frame = AudioFrame::new(samples, sample_rate).with_sequence(self.sequence);
        self.sequence += 1;

        trace!(
            sequence = frame.sequence(),
            carried_over = self.pending.len(),
            "frame captured"
        );
        Ok(Some(frame))
    }
}
