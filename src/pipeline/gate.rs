//! Energy-based silence detection.

use crate::audio::frame::AudioFrame;
use crate::error::{MoodshError, Result};

/// Drops frames whose mean absolute amplitude is below a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceGate {
    threshold: f32,
}

impl SilenceGate {
    /// # Errors
    /// `ConfigInvalidValue` for a negative or non-finite threshold.
    pub fn new(threshold: f32) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(MoodshError::invalid_config(
                "audio.silence_threshold",
                format!("must be a finite value >= 0, got {threshold}"),
            ));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// True iff the frame's energy is strictly below the threshold.
    pub fn is_silent(&self, frame: &AudioFrame) -> bool {
        frame.energy() < self.threshold
    }
}
