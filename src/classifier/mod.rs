//! The external emotion classifier boundary.

pub mod adapter;
#[cfg(feature = "http-classifier")]
pub mod http;
pub mod labels;
pub mod mock;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use adapter::ClassifierAdapter;
#[cfg(feature = "http-classifier")]
pub use http::HttpClassifier;
pub use labels::{Label, LabelSet};
pub use mock::MockClassifier;

/// One raw `{label, score}` entry as returned by a classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub label: String,
    pub score: f32,
}

impl Score {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A resolved label and its confidence in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Label,
    pub confidence: f32,
}

/// Trait for audio emotion classifiers.
///
/// This trait allows swapping implementations (remote model vs mock).
pub trait Classifier: Send + Sync {
    /// Classify mono samples.
    ///
    /// Returns entries ordered best first. With `top_k`, at most that many.
    fn predict(&self, samples: &[f32], sample_rate: u32, top_k: Option<usize>)
    -> Result<Vec<Score>>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// The labels this classifier can produce, if it knows them up front.
    fn labels(&self) -> Option<Vec<String>> {
        None
    }
}

/// Implement Classifier for Arc<T> to allow sharing across pipelines.
impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    fn predict(
        &self,
        samples: &[f32],
        sample_rate: u32,
        top_k: Option<usize>,
    ) -> Result<Vec<Score>> {
        (**self).predict(samples, sample_rate, top_k)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn labels(&self) -> Option<Vec<String>> {
        (**self).labels()
    }
}
