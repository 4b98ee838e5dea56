//! Turns a frame into a resolved, validated prediction.

use crate::audio::frame::AudioFrame;
use crate::classifier::labels::LabelSet;
use crate::classifier::{Classifier, Prediction, Score};
use crate::error::{MoodshError, Result};
use std::sync::Arc;
use tracing::debug;

/// Wraps a [`Classifier`] and maps its raw output onto a [`LabelSet`].
pub struct ClassifierAdapter {
    classifier: Arc<dyn Classifier>,
    labels: LabelSet,
}

impl ClassifierAdapter {
    /// # Errors
    /// `UnknownLabel` if the classifier declares a label outside `labels`.
    pub fn new(classifier: Arc<dyn Classifier>, labels: LabelSet) -> Result<Self> {
        if let Some(declared) = classifier.labels() {
            labels.validate_declared(declared.as_slice())?;
        }
        Ok(Self { classifier, labels })
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Top-ranked prediction for `frame`.
    ///
    /// # Errors
    /// - `Classification` / `EmptyClassification` when the classifier fails,
    ///   returns nothing, or returns a non-finite score
    /// - `UnknownLabel` when the returned label is outside the set
    pub fn classify(&self, frame: &AudioFrame) -> Result<Prediction> {
        let scores = self
            .classifier
            .predict(frame.samples(), frame.sample_rate(), Some(1))?;
        let top = scores
            .into_iter()
            .next()
            .ok_or(MoodshError::EmptyClassification)?;
        let prediction = self.resolve(top)?;
        debug!(
            sequence = frame.sequence(),
            label = %prediction.label,
            confidence = prediction.confidence,
            "frame classified"
        );
        Ok(prediction)
    }

    /// Every prediction for `frame`, highest confidence first.
    ///
    /// Equal scores keep the classifier's order.
    pub fn rank(&self, frame: &AudioFrame) -> Result<Vec<Prediction>> {
        let scores = self
            .classifier
            .predict(frame.samples(), frame.sample_rate(), None)?;
        if scores.is_empty() {
            return Err(MoodshError::EmptyClassification);
        }
        let mut predictions = scores
            .into_iter()
            .map(|score| self.resolve(score))
            .collect::<Result<Vec<_>>>()?;
        predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(predictions)
    }

    fn resolve(&self, score: Score) -> Result<Prediction> {
        if !score.score.is_finite() {
            return Err(MoodshError::Classification {
                message: format!("non-finite score {} for '{}'", score.score, score.label),
            });
        }
        Ok(Prediction {
            label: self.labels.resolve(&score.label)?,
            confidence: score.score.clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MockClassifier;
    use crate::classifier::labels::Label;
    use crate::error::ErrorKind;

    fn adapter(classifier: MockClassifier) -> ClassifierAdapter {
        ClassifierAdapter::new(Arc::new(classifier), LabelSet::default()).unwrap()
    }

    fn frame() -> AudioFrame {
        AudioFrame::new(vec![0.5; 160], 16000)
    }

    #[test]
    fn classify_returns_top_prediction() {
        let adapter = adapter(MockClassifier::new("mock").then_scores(vec![
            Score::new("happy", 0.8),
            Score::new("Sad", 0.2),
        ]));
        let prediction = adapter.classify(&frame()).unwrap();
        assert_eq!(prediction.label, Label::new("Happy"));
        assert_eq!(prediction.confidence, 0.8);
    }

    #[test]
    fn classify_resolves_index_labels() {
        let adapter = adapter(MockClassifier::new("mock").then_label("LABEL_2", 0.7));
        assert_eq!(adapter.classify(&frame()).unwrap().label, Label::new("Disgust"));
    }

    #[test]
    fn classify_clamps_confidence() {
        let adapter = adapter(
            MockClassifier::new("mock")
                .then_label("Calm", 1.7)
                .then_label("Calm", -0.2),
        );
        assert_eq!(adapter.classify(&frame()).unwrap().confidence, 1.0);
        assert_eq!(adapter.classify(&frame()).unwrap().confidence, 0.0);
    }

    #[test]
    fn classify_empty_result_is_recoverable() {
        let adapter = adapter(MockClassifier::new("mock").then_empty());
        let err = adapter.classify(&frame()).unwrap_err();
        assert!(matches!(err, MoodshError::EmptyClassification));
        assert!(err.is_recoverable());
    }

    #[test]
    fn classify_nan_score_is_classification_error() {
        let adapter = adapter(MockClassifier::new("mock").then_label("Fear", f32::NAN));
        let err = adapter.classify(&frame()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Classification);
    }

    #[test]
    fn classify_unknown_label_is_fatal() {
        let adapter = adapter(MockClassifier::new("mock").then_label("Bored", 0.9));
        let err = adapter.classify(&frame()).unwrap_err();
        assert!(!err.is_recoverable());
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn rank_sorts_descending_and_keeps_tie_order() {
        let adapter = adapter(MockClassifier::new("mock").then_scores(vec![
            Score::new("Calm", 0.1),
            Score::new("Sad", 0.4),
            Score::new("Fear", 0.4),
            Score::new("Happy", 0.1),
        ]));
        let labels: Vec<String> = adapter
            .rank(&frame())
            .unwrap()
            .into_iter()
            .map(|p| p.label.to_string())
            .collect();
        assert_eq!(labels, vec!["Sad", "Fear", "Calm", "Happy"]);
    }

    #[test]
    fn rank_empty_result_is_error() {
        let adapter = adapter(MockClassifier::new("mock").then_empty());
        assert!(adapter.rank(&frame()).is_err());
    }

    #[test]
    fn new_rejects_mismatched_declared_labels() {
        let classifier = MockClassifier::new("mock").with_declared_labels(&["Happy", "Joy"]);
        let result = ClassifierAdapter::new(Arc::new(classifier), LabelSet::default());
        assert!(matches!(result, Err(MoodshError::UnknownLabel { label }) if label == "Joy"));
    }

    #[test]
    fn new_accepts_declared_indices() {
        let classifier = MockClassifier::new("mock").with_declared_labels(&["LABEL_0", "LABEL_7"]);
        assert!(ClassifierAdapter::new(Arc::new(classifier), LabelSet::default()).is_ok());
    }
}
