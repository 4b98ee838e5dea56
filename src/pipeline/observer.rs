use crate::error::{MoodshError, Result};
use crate::pipeline::types::TransitionEvent;
use crossbeam_channel::{Sender, TrySendError};
use std::sync::{Arc, Mutex};

/// Receives emotion transitions from the pipeline.
pub trait TransitionObserver: Send {
    /// Called once per emitted transition, in emission order.
    fn on_transition(&mut self, event: &TransitionEvent) -> Result<()>;

    /// Called once when the pipeline stops.
    fn finish(&mut self) {}

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "observer"
    }
}

/// Collects events in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CollectorObserver {
    events: Arc<Mutex<Vec<TransitionEvent>>>,
}

impl CollectorObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything collected so far.
    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Labels of the collected events, in order.
    pub fn labels(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| event.label.to_string())
            .collect()
    }
}

impl TransitionObserver for CollectorObserver {
    fn on_transition(&mut self, event: &TransitionEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|e| MoodshError::Other(format!("collector lock poisoned: {e}")))?
            .push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Forwards events over a crossbeam channel without blocking the pipeline.
pub struct ChannelObserver {
    tx: Sender<TransitionEvent>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<TransitionEvent>) -> Self {
        Self { tx }
    }
}

impl TransitionObserver for ChannelObserver {
    fn on_transition(&mut self, event: &TransitionEvent) -> Result<()> {
        match self.tx.try_send(event.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                Err(MoodshError::Other("transition channel full".to_string()))
            }
            Err(TrySendError::Disconnected(_)) => Err(MoodshError::Other(
                "transition channel disconnected".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}
