//! Reporting of errors the pipeline survives.

use crate::error::MoodshError;
use tracing::warn;

/// Trait for reporting recoverable pipeline errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error raised by `stage` that did not stop the pipeline.
    fn report(&self, stage: &str, error: &MoodshError);
}

/// Reporter that logs through `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, stage: &str, error: &MoodshError) {
        warn!(stage, kind = ?error.kind(), "{}", error);
    }
}
