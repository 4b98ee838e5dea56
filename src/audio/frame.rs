//! Audio frames and the sample-level operations applied to them.

use std::time::{Duration, Instant};

/// A slice of mono audio captured at a known sample rate.
///
/// Frames are built once by the frame source and only ever replaced, never
/// edited in place, as they move through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    samples: Vec<f32>,
    sample_rate: u32,
    sequence: u64,
    captured_at: Instant,
}

impl AudioFrame {
    /// Creates a frame stamped with the current instant and sequence 0.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            sequence: 0,
            captured_at: Instant::now(),
        }
    }

    /// Sets the capture sequence number.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration implied by the sample count and rate.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Mean absolute amplitude, the silence gate's voice activity proxy.
    ///
    /// An empty frame has zero energy.
    pub fn energy(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|s| f64::from(s.abs())).sum();
        (sum / self.samples.len() as f64) as f32
    }

    /// Peak-normalizes the frame so its loudest sample has magnitude 1.0.
    ///
    /// An all-zero frame is returned unchanged.
    pub fn normalize(mut self) -> Self {
        let peak = self.peak();
        if peak > 0.0 {
            let scale = 1.0 / peak;
            for sample in &mut self.samples {
                *sample = (*sample * scale).clamp(-1.0, 1.0);
            }
        }
        self
    }

    /// Fits the frame to exactly `target_len` samples.
    ///
    /// Shorter frames are zero-padded at the end; longer frames keep the
    /// middle `target_len` samples, starting at `(len - target_len) / 2`.
    pub fn fit_to_len(mut self, target_len: usize) -> Self {
        let len = self.samples.len();
        if len < target_len {
            self.samples.resize(target_len, 0.0);
        } else if len > target_len {
            let start = (len - target_len) / 2;
            self.samples.drain(..start);
            self.samples.truncate(target_len);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_sample_count() {
        let frame = AudioFrame::new(vec![0.0; 24000], 16000);
        assert_eq!(frame.duration(), Duration::from_millis(1500));
    }

    #[test]
    fn test_duration_zero_rate() {
        let frame = AudioFrame::new(vec![0.0; 10], 0);
        assert_eq!(frame.duration(), Duration::ZERO);
    }

    #[test]
    fn test_with_sequence() {
        let frame = AudioFrame::new(vec![0.1], 16000).with_sequence(7);
        assert_eq!(frame.sequence(), 7);
    }

    #[test]
    fn test_peak_uses_absolute_value() {
        let frame = AudioFrame::new(vec![0.1, -0.5, 0.25], 16000);
        assert_eq!(frame.peak(), 0.5);
    }

    #[test]
    fn test_energy_is_mean_absolute_amplitude() {
        let frame = AudioFrame::new(vec![0.5, -0.5, 0.25, -0.25], 16000);
        assert!((frame.energy() - 0.375).abs() < 1e-6);
    }

    #[test]
    fn test_energy_of_empty_frame_is_zero() {
        let frame = AudioFrame::new(vec![], 16000);
        assert_eq!(frame.energy(), 0.0);
    }

    #[test]
    fn test_normalize_scales_to_unit_peak() {
        let frame = AudioFrame::new(vec![0.1, -0.2, 0.05], 16000).normalize();
        let samples = frame.samples();
        assert!((samples[0] - 0.5).abs() < 1e-6);
        assert!((samples[1] + 1.0).abs() < 1e-6);
        assert!((samples[2] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_all_zero_frame_unchanged() {
        let original = AudioFrame::new(vec![0.0; 64], 16000).with_sequence(3);
        let normalized = original.clone().normalize();
        assert_eq!(normalized, original);
    }

    #[test]
    fn test_normalize_output_within_unit_range() {
        let frame = AudioFrame::new(vec![3.0, -7.5, 0.001, 7.5], 16000).normalize();
        assert!(frame.samples().iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(frame.peak(), 1.0);
    }

    #[test]
    fn test_normalize_raises_quiet_speech_above_gate() {
        // Quiet but voiced: mean |x| = 0.002 before, 0.5 after normalization
        let frame = AudioFrame::new(vec![0.004, -0.004, 0.0, 0.0], 16000);
        assert!(frame.energy() < 0.01);
        assert!(frame.normalize().energy() > 0.01);
    }

    #[test]
    fn test_fit_to_len_pads_with_zeros() {
        let frame = AudioFrame::new(vec![0.5; 16000], 16000).fit_to_len(48000);
        assert_eq!(frame.len(), 48000);
        assert!(frame.samples()[..16000].iter().all(|&s| s == 0.5));
        assert!(frame.samples()[16000..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_fit_to_len_center_crops() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let frame = AudioFrame::new(samples, 16000).fit_to_len(4);
        // start = (10 - 4) / 2 = 3
        assert_eq!(frame.samples(), &[3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_fit_to_len_center_crop_odd_surplus() {
        let samples: Vec<f32> = (0..7).map(|i| i as f32).collect();
        let frame = AudioFrame::new(samples, 16000).fit_to_len(4);
        // start = (7 - 4) / 2 = 1
        assert_eq!(frame.samples(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_fit_to_len_exact_is_noop() {
        let frame = AudioFrame::new(vec![0.1, 0.2, 0.3], 16000);
        assert_eq!(frame.clone().fit_to_len(3), frame);
    }
}
