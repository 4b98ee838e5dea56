use crate::defaults;
use crate::error::{MoodshError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub smoothing: SmoothingConfig,
    pub classifier: ClassifierConfig,
    pub clip: ClipConfig,
}

/// Audio capture and framing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub frame_duration_secs: f32,
    pub silence_threshold: f32,
    pub stall_timeout_ms: u64,
}

/// Majority smoothing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmoothingConfig {
    pub depth: usize,
}

/// External classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub labels: Vec<String>,
    /// Raw labels the remote model can return, checked against `labels`
    /// before the first frame is captured.
    pub model_labels: Option<Vec<String>>,
}

/// Single-shot clip classification configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClipConfig {
    pub window_secs: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            frame_duration_secs: defaults::FRAME_DURATION_SECS,
            silence_threshold: defaults::SILENCE_THRESHOLD,
            stall_timeout_ms: defaults::STALL_TIMEOUT_MS,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            depth: defaults::SMOOTHING_DEPTH,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            timeout_secs: defaults::CLASSIFIER_TIMEOUT_SECS,
            labels: defaults::EMOTION_LABELS
                .iter()
                .map(|l| l.to_string())
                .collect(),
            model_labels: None,
        }
    }
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            window_secs: defaults::CLIP_WINDOW_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(MoodshError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - MOODSH_AUDIO_DEVICE → audio.device
    /// - MOODSH_CLASSIFIER_URL → classifier.endpoint
    /// - MOODSH_CLASSIFIER_TOKEN → classifier.token
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(device) = std::env::var("MOODSH_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(url) = std::env::var("MOODSH_CLASSIFIER_URL")
            && !url.is_empty()
        {
            self.classifier.endpoint = Some(url);
        }

        if let Ok(token) = std::env::var("MOODSH_CLASSIFIER_TOKEN")
            && !token.is_empty()
        {
            self.classifier.token = Some(token);
        }

        self
    }

    /// Check every value that would otherwise fail mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(MoodshError::invalid_config(
                "audio.sample_rate",
                "must be positive",
            ));
        }
        if !self.audio.frame_duration_secs.is_finite() || self.audio.frame_duration_secs <= 0.0 {
            return Err(MoodshError::invalid_config(
                "audio.frame_duration_secs",
                format!("must be positive, got {}", self.audio.frame_duration_secs),
            ));
        }
        if defaults::samples_for(self.audio.frame_duration_secs, self.audio.sample_rate) == 0 {
            return Err(MoodshError::invalid_config(
                "audio.frame_duration_secs",
                "frame would contain no samples at this sample rate",
            ));
        }
        if !self.audio.silence_threshold.is_finite() || self.audio.silence_threshold < 0.0 {
            return Err(MoodshError::invalid_config(
                "audio.silence_threshold",
                format!("must be >= 0, got {}", self.audio.silence_threshold),
            ));
        }
        if self.audio.stall_timeout_ms == 0 {
            return Err(MoodshError::invalid_config(
                "audio.stall_timeout_ms",
                "must be positive",
            ));
        }
        if self.smoothing.depth == 0 {
            return Err(MoodshError::invalid_config(
                "smoothing.depth",
                "must be at least 1",
            ));
        }
        if self.classifier.timeout_secs == 0 {
            return Err(MoodshError::invalid_config(
                "classifier.timeout_secs",
                "must be positive",
            ));
        }
        if !self.clip.window_secs.is_finite() || self.clip.window_secs <= 0.0 {
            return Err(MoodshError::invalid_config(
                "clip.window_secs",
                format!("must be positive, got {}", self.clip.window_secs),
            ));
        }
        // Label set rules (non-empty, unique) live with the label set itself.
        let labels = crate::classifier::labels::LabelSet::new(self.classifier.labels.as_slice())?;
        if let Some(model_labels) = &self.classifier.model_labels {
            labels.validate_declared(model_labels.as_slice())?;
        }
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MoodshError::Other(format!("Failed to serialize configuration: {e}")))
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/moodsh/config.toml on Linux, or None when the
    /// platform has no config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("moodsh").join("config.toml"))
    }
}
