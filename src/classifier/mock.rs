use crate::classifier::{Classifier, Score};
use crate::error::{MoodshError, Result};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum MockResponse {
    Scores(Vec<Score>),
    Fail(String),
    Empty,
}

/// Mock classifier for testing
///
/// Answers each call from a script of queued responses, then falls back to a
/// fixed ranking once the script runs out.
#[derive(Debug)]
pub struct MockClassifier {
    name: String,
    script: Mutex<VecDeque<MockResponse>>,
    fallback: Vec<Score>,
    declared: Option<Vec<String>>,
    calls: AtomicUsize,
    last_input_len: AtomicUsize,
}

impl MockClassifier {
    /// Create a mock that always answers "Neutral" with full confidence
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback: vec![Score::new("Neutral", 1.0)],
            declared: None,
            calls: AtomicUsize::new(0),
            last_input_len: AtomicUsize::new(0),
        }
    }

    /// Answer `label` once the script is exhausted
    pub fn with_label(mut self, label: &str) -> Self {
        self.fallback = vec![Score::new(label, 1.0)];
        self
    }

    /// Answer a full ranking once the script is exhausted
    pub fn with_scores(mut self, scores: Vec<Score>) -> Self {
        self.fallback = scores;
        self
    }

    /// Report these labels from `Classifier::labels`
    pub fn with_declared_labels(mut self, labels: &[&str]) -> Self {
        self.declared = Some(labels.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Queue a single top-1 answer
    pub fn then_label(self, label: &str, score: f32) -> Self {
        self.push(MockResponse::Scores(vec![Score::new(label, score)]))
    }

    /// Queue a full ranking
    pub fn then_scores(self, scores: Vec<Score>) -> Self {
        self.push(MockResponse::Scores(scores))
    }

    /// Queue a classification failure
    pub fn then_failure(self, message: &str) -> Self {
        self.push(MockResponse::Fail(message.to_string()))
    }

    /// Queue an empty result
    pub fn then_empty(self) -> Self {
        self.push(MockResponse::Empty)
    }

    fn push(self, response: MockResponse) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(response);
        }
        self
    }

    /// Number of `predict` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Sample count of the most recent `predict` input
    pub fn last_input_len(&self) -> usize {
        self.last_input_len.load(Ordering::SeqCst)
    }
}

impl Classifier for MockClassifier {
    fn predict(
        &self,
        samples: &[f32],
        _sample_rate: u32,
        top_k: Option<usize>,
    ) -> Result<Vec<Score>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_input_len.store(samples.len(), Ordering::SeqCst);

        let next = self
            .script
            .lock()
            .map_err(|e| MoodshError::Classification {
                message: format!("mock script poisoned: {}", e),
            })?
            .pop_front();

        let mut scores = match next {
            Some(MockResponse::Scores(scores)) => scores,
            Some(MockResponse::Fail(message)) => {
                return Err(MoodshError::Classification { message });
            }
            Some(MockResponse::Empty) => Vec::new(),
            None => self.fallback.clone(),
        };

        if let Some(k) = top_k {
            scores.truncate(k);
        }
        Ok(scores)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> Option<Vec<String>> {
        self.declared.clone()
    }
}
