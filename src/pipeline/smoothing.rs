//! Majority-vote smoothing over the last K predicted labels.

use crate::classifier::labels::Label;
use crate::error::{MoodshError, Result};
use std::collections::VecDeque;

/// Bounded FIFO of recent labels resolved to one label by majority vote.
///
/// Ties go to the tied label whose first occurrence in the window is oldest.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    entries: VecDeque<Label>,
    depth: usize,
}

impl SmoothingWindow {
    /// # Errors
    /// `ConfigInvalidValue` when `depth` is 0.
    pub fn new(depth: usize) -> Result<Self> {
        if depth == 0 {
            return Err(MoodshError::invalid_config(
                "smoothing.depth",
                "must be at least 1",
            ));
        }
        Ok(Self {
            entries: VecDeque::with_capacity(depth),
            depth,
        })
    }

    /// Append `label`, returning the evicted oldest entry when full.
    pub fn push(&mut self, label: Label) -> Option<Label> {
        let evicted = if self.entries.len() == self.depth {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(label);
        evicted
    }

    /// The most frequent label, or `None` before the first push.
    pub fn current_majority(&self) -> Option<&Label> {
        // (label, count) in first-seen order
        let mut tally: Vec<(&Label, usize)> = Vec::with_capacity(self.entries.len());
        for label in &self.entries {
            match tally.iter_mut().find(|(seen, _)| *seen == label) {
                Some((_, count)) => *count += 1,
                None => tally.push((label, 1)),
            }
        }

        let mut best: Option<(&Label, usize)> = None;
        for (label, count) in tally {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((label, count));
            }
        }
        best.map(|(label, _)| label)
    }

    /// Occurrences of `label` currently in the window.
    pub fn count(&self, label: &Label) -> usize {
        self.entries.iter().filter(|l| *l == label).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.depth
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}
