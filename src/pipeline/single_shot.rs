//! Ranked classification of a whole clip.
//!
//! The clip is peak-normalized, then padded with silence or center-cropped
//! to a fixed window before it is classified once. No gating or smoothing.

use crate::audio::frame::AudioFrame;
use crate::classifier::Prediction;
use crate::classifier::adapter::ClassifierAdapter;
use crate::defaults;
use crate::error::{MoodshError, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Outcome of classifying one clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipReport {
    /// All predictions, highest confidence first.
    pub predictions: Vec<Prediction>,
    /// Length of the clip before windowing.
    pub input_duration: Duration,
    /// Length of the window that was classified.
    pub window: Duration,
}

impl ClipReport {
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }
}

/// Normalize `samples` and fit them to `window_secs`.
///
/// # Errors
/// `ConfigInvalidValue` if the window holds no samples.
pub fn prepare_clip(samples: Vec<f32>, sample_rate: u32, window_secs: f32) -> Result<AudioFrame> {
    let target = defaults::samples_for(window_secs, sample_rate);
    if target == 0 {
        return Err(MoodshError::invalid_config(
            "clip.window_secs",
            format!("{window_secs}s at {sample_rate} Hz yields an empty window"),
        ));
    }
    Ok(AudioFrame::new(samples, sample_rate)
        .normalize()
        .fit_to_len(target))
}

/// Classify a clip and return every prediction ranked.
pub fn classify_clip(
    adapter: &ClassifierAdapter,
    samples: Vec<f32>,
    sample_rate: u32,
    window_secs: f32,
) -> Result<ClipReport> {
    let clip = AudioFrame::new(samples, sample_rate);
    let input_duration = clip.duration();

    let frame = prepare_clip(clip.into_samples(), sample_rate, window_secs)?;
    debug!(
        input_ms = input_duration.as_millis() as u64,
        window_samples = frame.len(),
        "classifying clip"
    );

    Ok(ClipReport {
        predictions: adapter.rank(&frame)?,
        input_duration,
        window: frame.duration(),
    })
}
