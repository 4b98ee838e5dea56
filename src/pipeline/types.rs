//! Data types passed between the pipeline and its observers.

use crate::classifier::labels::Label;
use serde::Serialize;
use std::time::SystemTime;

/// A change of the smoothed emotion label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionEvent {
    /// The new smoothed label.
    pub label: Label,
    /// The label it replaced; `None` for the first event of a run.
    pub previous: Option<Label>,
    /// Confidence of the prediction in the cycle that caused the change.
    pub confidence: f32,
    /// Sequence number of the frame that caused the change.
    pub sequence: u64,
    pub timestamp: SystemTime,
}

/// Where a cycle currently is. Follows capture order:
/// `WaitingFrame → FrameCaptured → Silent | Voiced → Classified → Smoothed → Emitted | Unchanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    WaitingFrame,
    FrameCaptured,
    Silent,
    Voiced,
    Classified,
    Smoothed,
    Emitted,
    Unchanged,
    Stopped,
}

/// Result of one [`run_cycle`](crate::pipeline::PipelineDriver::run_cycle).
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The frame fell below the silence threshold.
    Silent,
    /// Classification failed recoverably; the frame was dropped.
    Skipped,
    /// The smoothed label did not change.
    Unchanged(Label),
    Emitted(TransitionEvent),
    /// A finite input ran out.
    EndOfInput,
}

/// Counters for one driver run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub silent: u64,
    pub classified: u64,
    pub skipped: u64,
    pub transitions: u64,
    pub last_label: Option<Label>,
}

impl RunSummary {
    pub(crate) fn record(&mut self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::EndOfInput => return,
            CycleOutcome::Silent => self.silent += 1,
            CycleOutcome::Skipped => self.skipped += 1,
            CycleOutcome::Unchanged(_) => self.classified += 1,
            CycleOutcome::Emitted(event) => {
                self.classified += 1;
                self.transitions += 1;
                self.last_label = Some(event.label.clone());
            }
        }
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_each_outcome() {
        let event = TransitionEvent {
            label: Label::new("Calm"),
            previous: None,
            confidence: 0.9,
            sequence: 2,
            timestamp: SystemTime::now(),
        };
        let mut summary = RunSummary::default();
        for outcome in [
            CycleOutcome::Silent,
            CycleOutcome::Skipped,
            CycleOutcome::Emitted(event),
            CycleOutcome::Unchanged(Label::new("Calm")),
            CycleOutcome::EndOfInput,
        ] {
            summary.record(&outcome);
        }

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.silent, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.classified, 2);
        assert_eq!(summary.transitions, 1);
        assert_eq!(summary.last_label, Some(Label::new("Calm")));
    }
}
