//! Application entry points behind the CLI.
//!
//! Wires the configured audio source, classifier and output into the
//! pipeline: capture → gate → classify → smooth → print.

use crate::audio::capture::{CpalAudioSource, suppress_audio_warnings};
use crate::audio::frame_source::FrameSource;
use crate::audio::source::AudioSource;
use crate::audio::wav::{WavAudioSource, load_wav};
use crate::classifier::adapter::ClassifierAdapter;
use crate::classifier::http::HttpClassifier;
use crate::classifier::labels::LabelSet;
use crate::classifier::Classifier;
use crate::cli::ListenArgs;
use crate::config::Config;
use crate::error::MoodshError;
use crate::output::{self, StdoutObserver};
use crate::pipeline::driver::{PipelineConfig, PipelineDriver, ShutdownHandle};
use crate::pipeline::single_shot::classify_clip;
use crate::pipeline::types::RunSummary;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Apply `listen` flags on top of the loaded configuration.
pub fn apply_listen_overrides(config: &mut Config, args: &ListenArgs) {
    if let Some(device) = &args.device {
        config.audio.device = Some(device.clone());
    }
    if let Some(threshold) = args.threshold {
        config.audio.silence_threshold = threshold;
    }
    if let Some(depth) = args.depth {
        config.smoothing.depth = depth;
    }
    if let Some(frame_secs) = args.frame_secs {
        config.audio.frame_duration_secs = frame_secs;
    }
}

/// Build the classifier the configuration points at.
///
/// # Errors
/// `ConfigInvalidValue` when no endpoint is configured.
pub fn build_classifier(config: &Config) -> crate::error::Result<Arc<dyn Classifier>> {
    let endpoint = config
        .classifier
        .endpoint
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| {
            MoodshError::invalid_config(
                "classifier.endpoint",
                "no classifier configured; set [classifier] endpoint or MOODSH_CLASSIFIER_URL",
            )
        })?;

    let classifier = HttpClassifier::with_timeout(
        endpoint,
        Duration::from_secs(config.classifier.timeout_secs),
    )?
    .with_token(config.classifier.token.clone());
    let classifier = match &config.classifier.model_labels {
        Some(labels) => classifier.with_declared_labels(labels.clone()),
        None => classifier,
    };
    Ok(Arc::new(classifier))
}

/// Validate the configuration and build the label-checked adapter.
pub fn build_adapter(config: &Config) -> Result<ClassifierAdapter> {
    config.validate().context("invalid configuration")?;
    let labels = LabelSet::new(config.classifier.labels.as_slice())?;
    let adapter = ClassifierAdapter::new(build_classifier(config)?, labels)?;
    Ok(adapter)
}

/// Open the WAV file if given, otherwise the configured microphone.
pub fn build_audio_source(config: &Config, input: Option<&Path>) -> Result<Box<dyn AudioSource>> {
    let rate = config.audio.sample_rate;
    match input {
        Some(path) => {
            let source = WavAudioSource::from_path(path, rate)
                .with_context(|| format!("cannot stream {}", path.display()))?;
            info!(path = %path.display(), samples = source.len(), "streaming from file");
            Ok(Box::new(source))
        }
        None => {
            suppress_audio_warnings();
            let source = CpalAudioSource::new(config.audio.device.as_deref(), rate)
                .context("cannot open audio input")?;
            Ok(Box::new(source))
        }
    }
}

/// Build the streaming driver for `listen`.
///
/// Blocking: constructs the HTTP classifier, so call it off the async runtime.
pub fn build_driver(
    mut config: Config,
    args: &ListenArgs,
    json: bool,
    color: bool,
) -> Result<PipelineDriver> {
    apply_listen_overrides(&mut config, args);
    let adapter = build_adapter(&config)?;
    let source = build_audio_source(&config, args.input.as_deref())?;

    let frames = FrameSource::new(source)
        .with_stall_timeout(Duration::from_millis(config.audio.stall_timeout_ms));
    let pipeline_config = PipelineConfig::from_config(&config);
    let frame_limit = args.frame_limit(pipeline_config.frame_duration_secs);

    let mut driver = PipelineDriver::new(
        pipeline_config,
        frames,
        adapter,
        Box::new(StdoutObserver::new(json, color)),
    )?;
    if let Some(limit) = frame_limit {
        driver = driver.with_frame_limit(limit);
    }
    Ok(driver)
}

/// Track emotion until Ctrl+C, end of input, or the frame limit.
///
/// The driver is built and run on a blocking thread; only the Ctrl+C
/// listener lives on the runtime.
pub async fn run_listen(
    config: Config,
    args: ListenArgs,
    json: bool,
    color: bool,
) -> Result<RunSummary> {
    let shutdown = ShutdownHandle::new();
    let ctrl_c = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Ctrl+C received");
                shutdown.request();
            }
        })
    };

    let result = tokio::task::spawn_blocking(move || -> Result<RunSummary> {
        let mut driver = build_driver(config, &args, json, color)?.with_shutdown(shutdown);
        driver.run().context("pipeline stopped")
    })
    .await
    .context("pipeline thread panicked");

    ctrl_c.abort();
    result?
}

/// Classify one WAV file and render the ranking.
///
/// Blocking: builds the HTTP classifier and waits on the request.
pub fn classify_file(
    config: &Config,
    file: &Path,
    window: Option<f32>,
    json: bool,
    color: bool,
) -> Result<String> {
    let mut config = config.clone();
    if let Some(window) = window {
        config.clip.window_secs = window;
    }
    let adapter = build_adapter(&config)?;

    let rate = config.audio.sample_rate;
    let samples =
        load_wav(file, rate).with_context(|| format!("cannot read {}", file.display()))?;
    let report = classify_clip(&adapter, samples, rate, config.clip.window_secs)
        .with_context(|| format!("cannot classify {}", file.display()))?;

    Ok(if json {
        format!("{}\n", output::clip_json(&report))
    } else {
        output::format_clip_report(&report, color)
    })
}

/// Classify one WAV file on a blocking thread and print the ranking.
pub async fn run_classify(
    config: Config,
    file: PathBuf,
    window: Option<f32>,
    json: bool,
    color: bool,
) -> Result<()> {
    let rendered =
        tokio::task::spawn_blocking(move || classify_file(&config, &file, window, json, color))
            .await
            .context("classifier thread panicked")??;
    print!("{}", rendered);
    Ok(())
}

/// Print the configured labels with the class index each resolves from.
pub fn run_labels(config: &Config, json: bool) -> Result<()> {
    let labels = LabelSet::new(config.classifier.labels.as_slice())?;
    if json {
        let names: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
        println!("{}", serde_json::to_string(&names)?);
    } else {
        for (index, label) in labels.iter().enumerate() {
            println!("  [{}] {}", index, label);
        }
    }
    Ok(())
}
