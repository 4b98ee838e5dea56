//! Change-only reporting of the smoothed label.

use crate::classifier::labels::Label;
use crate::pipeline::types::TransitionEvent;
use std::time::SystemTime;

/// Emits a [`TransitionEvent`] only when the smoothed label changes.
#[derive(Debug, Clone, Default)]
pub struct ChangeEmitter {
    last: Option<Label>,
}

impl ChangeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently emitted label.
    pub fn last(&self) -> Option<&Label> {
        self.last.as_ref()
    }

    /// Returns an event and records `current` iff it differs from the last
    /// emitted label. The first call always emits.
    pub fn maybe_emit(
        &mut self,
        current: &Label,
        confidence: f32,
        sequence: u64,
    ) -> Option<TransitionEvent> {
        if self.last.as_ref() == Some(current) {
            return None;
        }
        let previous = self.last.replace(current.clone());
        Some(TransitionEvent {
            label: current.clone(),
            previous,
            confidence,
            sequence,
            timestamp: SystemTime::now(),
        })
    }
}
