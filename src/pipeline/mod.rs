//! Emotion tracking pipeline.
//!
//! A single-threaded loop that captures a frame, drops silence, classifies
//! what is left, smooths the labels over the last K predictions and reports
//! only changes of the smoothed label.

pub mod driver;
pub mod emitter;
pub mod error;
pub mod gate;
pub mod observer;
pub mod single_shot;
pub mod smoothing;
pub mod types;

pub use driver::{PipelineConfig, PipelineDriver, ShutdownHandle};
pub use emitter::ChangeEmitter;
pub use error::{ErrorReporter, LogReporter};
pub use gate::SilenceGate;
pub use observer::{ChannelObserver, CollectorObserver, TransitionObserver};
pub use single_shot::{ClipReport, classify_clip, prepare_clip};
pub use smoothing::SmoothingWindow;
pub use types::{CycleOutcome, CycleState, RunSummary, TransitionEvent};
