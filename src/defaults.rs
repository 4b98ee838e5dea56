//! Default configuration constants for moodsh.
//!
//! Shared by the config file, the pipeline and the CLI so that every entry
//! point agrees on the same tuning.

/// Default audio sample rate in Hz.
///
/// Speech emotion models are trained on 16kHz mono input.
pub const SAMPLE_RATE: u32 = 16000;

/// Default streaming frame duration in seconds.
///
/// Long enough for the classifier to hear prosody, short enough to track
/// changes in near real time.
pub const FRAME_DURATION_SECS: f32 = 1.2;

/// Default number of predictions kept for majority smoothing.
pub const SMOOTHING_DEPTH: usize = 3;

/// Default silence gate threshold (mean absolute amplitude after peak normalization).
///
/// Tuned empirically; frames below it are never sent to the classifier.
pub const SILENCE_THRESHOLD: f32 = 0.01;

/// Default target window for single-shot clip classification, in seconds.
pub const CLIP_WINDOW_SECS: f32 = 3.0;

/// Milliseconds a live device may deliver nothing before it counts as disconnected.
pub const STALL_TIMEOUT_MS: u64 = 5000;

/// How often a live audio device is polled for new samples.
pub const POLL_INTERVAL_MS: u64 = 16;

/// Default HTTP classifier request timeout in seconds.
pub const CLASSIFIER_TIMEOUT_SECS: u64 = 30;

/// Default closed set of emotion labels, in class-index order.
pub const EMOTION_LABELS: &[&str] = &[
    "Anger",
    "Calm",
    "Disgust",
    "Fear",
    "Happy",
    "Neutral",
    "Sad",
    "Surprised",
];

/// Number of samples covering `duration_secs` at `sample_rate`.
pub fn samples_for(duration_secs: f32, sample_rate: u32) -> usize {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    (f64::from(duration_secs) * f64::from(sample_rate)).round() as usize
}
