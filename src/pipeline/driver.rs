//! The capture → gate → classify → smooth → emit loop.

use crate::audio::frame_source::FrameSource;
use crate::classifier::adapter::ClassifierAdapter;
use crate::classifier::labels::Label;
use crate::config::Config;
use crate::defaults;
use crate::error::{MoodshError, Result};
use crate::pipeline::emitter::ChangeEmitter;
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::gate::SilenceGate;
use crate::pipeline::observer::TransitionObserver;
use crate::pipeline::smoothing::SmoothingWindow;
use crate::pipeline::types::{CycleOutcome, CycleState, RunSummary};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace, warn};

/// Configuration for the streaming pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub sample_rate: u32,
    pub frame_duration_secs: f32,
    /// Number of predictions in the smoothing window (K)
    pub smoothing_depth: usize,
    /// Mean absolute amplitude below which a normalized frame is silence
    pub silence_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            frame_duration_secs: defaults::FRAME_DURATION_SECS,
            smoothing_depth: defaults::SMOOTHING_DEPTH,
            silence_threshold: defaults::SILENCE_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sample_rate: config.audio.sample_rate,
            frame_duration_secs: config.audio.frame_duration_secs,
            smoothing_depth: config.smoothing.depth,
            silence_threshold: config.audio.silence_threshold,
        }
    }

    /// Checks that every value yields a usable pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(MoodshError::invalid_config(
                "audio.sample_rate",
                "must be greater than 0",
            ));
        }
        if defaults::samples_for(self.frame_duration_secs, self.sample_rate) == 0 {
            return Err(MoodshError::invalid_config(
                "audio.frame_duration_secs",
                format!(
                    "{}s at {} Hz yields an empty frame",
                    self.frame_duration_secs, self.sample_rate
                ),
            ));
        }
        SmoothingWindow::new(self.smoothing_depth)?;
        SilenceGate::new(self.silence_threshold)?;
        Ok(())
    }
}

/// Cooperative stop flag shared between the driver and whoever stops it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the driver to stop before its next cycle.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Runs the streaming pipeline on the calling thread.
///
/// Owns the smoothing window and emission state; both only change when a
/// cycle completes. A fatal error leaves them exactly as the previous cycle
/// left them.
pub struct PipelineDriver {
    config: PipelineConfig,
    frames: FrameSource,
    adapter: ClassifierAdapter,
    gate: SilenceGate,
    window: SmoothingWindow,
    emitter: ChangeEmitter,
    observer: Box<dyn TransitionObserver>,
    reporter: Arc<dyn ErrorReporter>,
    shutdown: ShutdownHandle,
    frame_limit: Option<u64>,
    state: CycleState,
    summary: RunSummary,
}

impl PipelineDriver {
    /// # Errors
    /// `ConfigInvalidValue` if `config` does not validate.
    pub fn new(
        config: PipelineConfig,
        frames: FrameSource,
        adapter: ClassifierAdapter,
        observer: Box<dyn TransitionObserver>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gate: SilenceGate::new(config.silence_threshold)?,
            window: SmoothingWindow::new(config.smoothing_depth)?,
            config,
            frames,
            adapter,
            emitter: ChangeEmitter::new(),
            observer,
            reporter: Arc::new(LogReporter),
            shutdown: ShutdownHandle::new(),
            frame_limit: None,
            state: CycleState::WaitingFrame,
            summary: RunSummary::default(),
        })
    }

    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownHandle) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Stop `run` after this many captured frames.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }

    pub fn last_emitted(&self) -> Option<&Label> {
        self.emitter.last()
    }

    /// Executes exactly one capture cycle.
    ///
    /// # Errors
    /// Capture and configuration errors. Recoverable classification errors
    /// are reported and come back as [`CycleOutcome::Skipped`].
    pub fn run_cycle(&mut self) -> Result<CycleOutcome> {
        self.state = CycleState::WaitingFrame;
        let Some(frame) = self
            .frames
            .next_frame(self.config.frame_duration_secs, self.config.sample_rate)?
        else {
            self.state = CycleState::Stopped;
            return Ok(CycleOutcome::EndOfInput);
        };
        self.state = CycleState::FrameCaptured;

        let frame = frame.normalize();
        let outcome = if self.gate.is_silent(&frame) {
            self.state = CycleState::Silent;
            trace!(
                sequence = frame.sequence(),
                energy = frame.energy(),
                "frame below silence threshold"
            );
            CycleOutcome::Silent
        } else {
            self.state = CycleState::Voiced;
            match self.adapter.classify(&frame) {
                Ok(prediction) => {
                    self.state = CycleState::Classified;
                    self.window.push(prediction.label.clone());
                    self.state = CycleState::Smoothed;

                    let current = self
                        .window
                        .current_majority()
                        .cloned()
                        .unwrap_or_else(|| prediction.label.clone());

                    match self
                        .emitter
                        .maybe_emit(&current, prediction.confidence, frame.sequence())
                    {
                        Some(event) => {
                            self.state = CycleState::Emitted;
                            info!(
                                label = %event.label,
                                previous = ?event.previous.as_ref().map(Label::as_str),
                                "emotion changed"
                            );
                            if let Err(e) = self.observer.on_transition(&event) {
                                self.reporter.report(self.observer.name(), &e);
                            }
                            CycleOutcome::Emitted(event)
                        }
                        None => {
                            self.state = CycleState::Unchanged;
                            CycleOutcome::Unchanged(current)
                        }
                    }
                }
                Err(e) if e.is_recoverable() => {
                    self.reporter.report("classifier", &e);
                    CycleOutcome::Skipped
                }
                Err(e) => return Err(e),
            }
        };

        self.summary.record(&outcome);
        Ok(outcome)
    }

    /// Loops until shutdown, end of input, the frame limit, or a fatal error.
    ///
    /// The audio source is stopped and the observer finished on every exit path.
    pub fn run(&mut self) -> Result<RunSummary> {
        info!(
            classifier = self.adapter.classifier_name(),
            sample_rate = self.config.sample_rate,
            frame_secs = self.config.frame_duration_secs,
            depth = self.config.smoothing_depth,
            "pipeline started"
        );

        let result = loop {
            if self.shutdown.is_requested() {
                debug!("shutdown requested");
                break Ok(());
            }
            if let Some(limit) = self.frame_limit
                && self.summary.frames >= limit
            {
                debug!(limit, "frame limit reached");
                break Ok(());
            }
            match self.run_cycle() {
                Ok(CycleOutcome::EndOfInput) => {
                    debug!("end of input");
                    break Ok(());
                }
                Ok(_) => {}
                Err(e) => break Err(e),
            }
        };

        self.state = CycleState::Stopped;
        if let Err(e) = self.frames.stop() {
            warn!(error = %e, "failed to stop audio source");
        }
        self.observer.finish();

        result.map(|()| {
            info!(
                frames = self.summary.frames,
                transitions = self.summary.transitions,
                "pipeline stopped"
            );
            self.summary.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::MockAudioSource;
    use crate::classifier::MockClassifier;
    use crate::classifier::labels::LabelSet;
    use crate::error::ErrorKind;
    use crate::pipeline::observer::CollectorObserver;
    use crate::pipeline::types::TransitionEvent;
    use std::sync::Mutex;
    use std::time::Duration;

    const RATE: u32 = 10;

    #[derive(Default)]
    struct RecordingReporter {
        reports: Mutex<Vec<String>>,
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&self, stage: &str, error: &MoodshError) {
            self.reports
                .lock()
                .unwrap()
                .push(format!("{}: {}", stage, error));
        }
    }

    struct FailingObserver;

    impl TransitionObserver for FailingObserver {
        fn on_transition(&mut self, _event: &TransitionEvent) -> Result<()> {
            Err(MoodshError::Other("display gone".to_string()))
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            sample_rate: RATE,
            frame_duration_secs: 1.0,
            smoothing_depth: 3,
            silence_threshold: 0.01,
        }
    }

    /// One 10-sample chunk (one frame) per amplitude.
    fn source(amplitudes: &[f32]) -> MockAudioSource {
        amplitudes.iter().fold(
            MockAudioSource::new().with_sample_rate(RATE),
            |source, &amp| source.with_chunk(vec![amp; RATE as usize]),
        )
    }

    fn build(
        source: MockAudioSource,
        classifier: Arc<MockClassifier>,
        observer: Box<dyn TransitionObserver>,
    ) -> PipelineDriver {
        let frames = FrameSource::new(Box::new(source))
            .with_poll_interval(Duration::from_millis(1))
            .with_stall_timeout(Duration::from_millis(20));
        let adapter = ClassifierAdapter::new(classifier, LabelSet::default()).unwrap();
        PipelineDriver::new(config(), frames, adapter, observer).unwrap()
    }

    fn driver(
        amplitudes: &[f32],
        classifier: MockClassifier,
    ) -> (PipelineDriver, CollectorObserver, Arc<MockClassifier>) {
        let classifier = Arc::new(classifier);
        let collector = CollectorObserver::new();
        let driver = build(
            source(amplitudes),
            Arc::clone(&classifier),
            Box::new(collector.clone()),
        );
        (driver, collector, classifier)
    }

    #[test]
    fn same_label_k_times_emits_once() {
        let (mut driver, collector, _) =
            driver(&[0.2, 0.2, 0.2], MockClassifier::new("mock").with_label("Happy"));

        let summary = driver.run().unwrap();

        assert_eq!(collector.labels(), vec!["Happy"]);
        assert_eq!(driver.window().current_majority(), Some(&Label::new("Happy")));
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.transitions, 1);
        assert_eq!(summary.last_label, Some(Label::new("Happy")));
    }

    #[test]
    fn run_cycle_reports_each_outcome() {
        let (mut driver, _, _) = driver(
            &[0.2, 0.0, 0.2, 0.2],
            MockClassifier::new("mock")
                .then_label("Calm", 0.9)
                .then_failure("timeout")
                .then_label("Calm", 0.8),
        );

        assert!(matches!(driver.run_cycle().unwrap(), CycleOutcome::Emitted(_)));
        assert_eq!(driver.state(), CycleState::Emitted);
        assert_eq!(driver.run_cycle().unwrap(), CycleOutcome::Silent);
        assert_eq!(driver.state(), CycleState::Silent);
        assert_eq!(driver.run_cycle().unwrap(), CycleOutcome::Skipped);
        assert_eq!(
            driver.run_cycle().unwrap(),
            CycleOutcome::Unchanged(Label::new("Calm"))
        );
        assert_eq!(driver.state(), CycleState::Unchanged);
        assert_eq!(driver.run_cycle().unwrap(), CycleOutcome::EndOfInput);
        assert_eq!(driver.state(), CycleState::Stopped);
    }

    #[test]
    fn silent_frames_never_reach_classifier() {
        let (mut driver, collector, classifier) =
            driver(&[0.0, 0.0, 0.0], MockClassifier::new("mock"));

        let summary = driver.run().unwrap();

        assert_eq!(classifier.calls(), 0);
        assert!(driver.window().is_empty());
        assert!(driver.last_emitted().is_none());
        assert!(collector.events().is_empty());
        assert_eq!(summary.silent, 3);
    }

    #[test]
    fn silence_does_not_reset_window() {
        let (mut driver, collector, _) = driver(
            &[0.2, 0.0, 0.2],
            MockClassifier::new("mock")
                .then_label("Sad", 0.7)
                .then_label("Sad", 0.7),
        );

        driver.run().unwrap();

        assert_eq!(driver.window().len(), 2);
        assert_eq!(collector.labels(), vec!["Sad"]);
    }

    #[test]
    fn classification_error_keeps_history() {
        let (mut driver, collector, _) = driver(
            &[0.2, 0.2, 0.2, 0.2],
            MockClassifier::new("mock")
                .then_label("Sad", 0.9)
                .then_label("Sad", 0.9)
                .then_failure("inference backend unavailable")
                .then_label("Happy", 0.9),
        );
        let reporter = Arc::new(RecordingReporter::default());
        driver = driver.with_error_reporter(reporter.clone());

        let summary = driver.run().unwrap();

        // Window is [Sad, Sad, Happy]: the pre-error entries still count
        assert_eq!(driver.window().len(), 3);
        assert_eq!(driver.window().current_majority(), Some(&Label::new("Sad")));
        assert_eq!(collector.labels(), vec!["Sad"]);
        assert_eq!(summary.skipped, 1);
        let reports = reporter.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].starts_with("classifier:"));
    }

    #[test]
    fn capture_error_aborts_and_leaves_window_untouched() {
        let source = source(&[0.2, 0.2, 0.2])
            .with_read_failure_after(2)
            .with_error_message("device unplugged");
        let collector = CollectorObserver::new();
        let mut driver = build(
            source,
            Arc::new(MockClassifier::new("mock").with_label("Fear")),
            Box::new(collector.clone()),
        );

        let err = driver.run().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Capture);
        assert_eq!(driver.window().len(), 2);
        assert_eq!(driver.summary().frames, 2);
        assert_eq!(collector.labels(), vec!["Fear"]);
    }

    #[test]
    fn unknown_label_aborts_with_configuration_error() {
        let (mut driver, collector, _) = driver(
            &[0.2, 0.2],
            MockClassifier::new("mock").then_label("Bored", 0.9),
        );

        let err = driver.run().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(driver.window().is_empty());
        assert!(collector.events().is_empty());
    }

    #[test]
    fn shutdown_before_run_captures_nothing() {
        let (mut driver, _, classifier) = driver(&[0.2, 0.2], MockClassifier::new("mock"));
        driver.shutdown_handle().request();

        let summary = driver.run().unwrap();

        assert_eq!(summary.frames, 0);
        assert_eq!(classifier.calls(), 0);
        assert_eq!(driver.state(), CycleState::Stopped);
    }

    #[test]
    fn frame_limit_stops_run() {
        let (driver, _, classifier) =
            driver(&[0.2, 0.2, 0.2, 0.2, 0.2], MockClassifier::new("mock"));
        let mut driver = driver.with_frame_limit(2);

        let summary = driver.run().unwrap();

        assert_eq!(summary.frames, 2);
        assert_eq!(classifier.calls(), 2);
    }

    #[test]
    fn observer_failure_is_reported_not_fatal() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut driver = build(
            source(&[0.2, 0.2]),
            Arc::new(
                MockClassifier::new("mock")
                    .then_label("Calm", 0.9)
                    .then_label("Anger", 0.9)
                    .then_label("Anger", 0.9),
            ),
            Box::new(FailingObserver),
        )
        .with_error_reporter(reporter.clone());

        let summary = driver.run().unwrap();

        assert_eq!(summary.transitions, 1);
        assert_eq!(reporter.reports.lock().unwrap().len(), 1);
    }

    #[test]
    fn sample_rate_mismatch_is_fatal() {
        let (mut driver, _, _) = driver(&[0.2], MockClassifier::new("mock"));
        driver.config.sample_rate = 16000;
        let err = driver.run().unwrap_err();
        assert!(matches!(err, MoodshError::AudioFormatMismatch { .. }));
    }

    #[test]
    fn pipeline_config_validation() {
        assert!(PipelineConfig::default().validate().is_ok());

        let mut bad = config();
        bad.frame_duration_secs = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.smoothing_depth = 0;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.silence_threshold = -1.0;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.sample_rate = 0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn pipeline_config_from_config() {
        let mut config = Config::default();
        config.smoothing.depth = 5;
        let pipeline = PipelineConfig::from_config(&config);
        assert_eq!(pipeline.smoothing_depth, 5);
        assert_eq!(pipeline.sample_rate, 16000);
        assert_eq!(pipeline.frame_duration_secs, 1.2);
    }
}
