//! Error types for moodsh.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MoodshError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Classifier label '{label}' is not in the configured label set")]
    UnknownLabel { label: String },

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio format mismatch: expected {expected}, got {actual}")]
    AudioFormatMismatch { expected: String, actual: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    #[error("Failed to read audio file: {message}")]
    AudioFile { message: String },

    // Classification errors
    #[error("Classification failed: {message}")]
    Classification { message: String },

    #[error("Classifier returned no predictions")]
    EmptyClassification,

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Coarse error taxonomy used by the pipeline to decide what survives a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid parameter or label set mismatch. Fatal, reported before capture when possible.
    Configuration,
    /// Device failure or disconnect. Fatal.
    Capture,
    /// External inference failure. Recoverable: the frame is dropped.
    Classification,
    Other,
}

impl MoodshError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MoodshError::ConfigFileNotFound { .. }
            | MoodshError::ConfigInvalidValue { .. }
            | MoodshError::Config(_)
            | MoodshError::UnknownLabel { .. } => ErrorKind::Configuration,
            MoodshError::AudioDeviceNotFound { .. }
            | MoodshError::AudioFormatMismatch { .. }
            | MoodshError::AudioCapture { .. }
            | MoodshError::AudioFile { .. } => ErrorKind::Capture,
            MoodshError::Classification { .. } | MoodshError::EmptyClassification => {
                ErrorKind::Classification
            }
            MoodshError::Io(_) | MoodshError::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether the pipeline may drop the current frame and keep running.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Classification
    }

    /// Shorthand for a `ConfigInvalidValue` error.
    pub fn invalid_config(key: &str, message: impl Into<String>) -> Self {
        MoodshError::ConfigInvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MoodshError>;
