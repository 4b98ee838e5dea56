//! The closed set of emotion labels and mapping of raw classifier output onto it.

use crate::defaults;
use crate::error::{MoodshError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An emotion label from the configured set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Ordered, duplicate-free set of labels a classifier may produce.
///
/// Position in the set is the class index, matching a model's `id2label`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    /// Build a set from configured names.
    ///
    /// # Errors
    /// `ConfigInvalidValue` for an empty list, a blank name, or a name repeated
    /// ignoring case.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.is_empty() {
            return Err(MoodshError::invalid_config(
                "classifier.labels",
                "at least one label is required",
            ));
        }

        let mut labels: Vec<Label> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(MoodshError::invalid_config(
                    "classifier.labels",
                    "labels must not be blank",
                ));
            }
            if labels.iter().any(|l| l.0.eq_ignore_ascii_case(name)) {
                return Err(MoodshError::invalid_config(
                    "classifier.labels",
                    format!("duplicate label '{}'", name),
                ));
            }
            labels.push(Label::new(name));
        }

        Ok(Self { labels })
    }

    /// Map a raw classifier label onto the set.
    ///
    /// Accepts the label name (any case), a class index such as `"4"`, or the
    /// placeholder form `LABEL_4`.
    ///
    /// # Errors
    /// `UnknownLabel` if nothing matches.
    pub fn resolve(&self, raw: &str) -> Result<Label> {
        let raw = raw.trim();

        if let Some(label) = self.labels.iter().find(|l| l.0.eq_ignore_ascii_case(raw)) {
            return Ok(label.clone());
        }

        let index_text = match raw.get(..6) {
            Some(prefix) if prefix.eq_ignore_ascii_case("LABEL_") => &raw[6..],
            _ => raw,
        };
        if let Ok(index) = index_text.parse::<usize>()
            && let Some(label) = self.labels.get(index)
        {
            return Ok(label.clone());
        }

        Err(MoodshError::UnknownLabel {
            label: raw.to_string(),
        })
    }

    /// Check that every label a classifier declares resolves into this set.
    pub fn validate_declared<S: AsRef<str>>(&self, declared: &[S]) -> Result<()> {
        for raw in declared {
            self.resolve(raw.as_ref())?;
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Label> {
        self.labels.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            labels: defaults::EMOTION_LABELS
                .iter()
                .map(|&name| Label::new(name))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_is_the_eight_emotions() {
        let set = LabelSet::default();
        assert_eq!(set.len(), 8);
        assert_eq!(set.get(0).unwrap().as_str(), "Anger");
        assert_eq!(set.get(7).unwrap().as_str(), "Surprised");
    }

    #[test]
    fn resolve_by_name_ignores_case() {
        let set = LabelSet::default();
        assert_eq!(set.resolve("happy").unwrap(), Label::new("Happy"));
        assert_eq!(set.resolve(" SAD ").unwrap(), Label::new("Sad"));
    }

    #[test]
    fn resolve_by_index() {
        let set = LabelSet::default();
        assert_eq!(set.resolve("4").unwrap(), Label::new("Happy"));
        assert_eq!(set.resolve("0").unwrap(), Label::new("Anger"));
    }

    #[test]
    fn resolve_placeholder_form() {
        let set = LabelSet::default();
        assert_eq!(set.resolve("LABEL_6").unwrap(), Label::new("Sad"));
        assert_eq!(set.resolve("label_1").unwrap(), Label::new("Calm"));
    }

    #[test]
    fn resolve_unknown_label_is_configuration_error() {
        let set = LabelSet::default();
        for raw in ["Bored", "8", "LABEL_42", "LABEL_", ""] {
            let err = set.resolve(raw).unwrap_err();
            assert!(
                matches!(err, MoodshError::UnknownLabel { .. }),
                "{raw:?} gave {err:?}"
            );
            assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
        }
    }

    #[test]
    fn new_rejects_empty_blank_and_duplicates() {
        assert!(LabelSet::new::<&str>(&[]).is_err());
        assert!(LabelSet::new(&["Calm", "  "]).is_err());
        match LabelSet::new(&["Calm", "calm"]) {
            Err(MoodshError::ConfigInvalidValue { key, message }) => {
                assert_eq!(key, "classifier.labels");
                assert!(message.contains("duplicate"));
            }
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn new_trims_names() {
        let set = LabelSet::new(&[" Calm ", "Angry"]).unwrap();
        assert_eq!(set.resolve("calm").unwrap().as_str(), "Calm");
    }

    #[test]
    fn validate_declared_reports_first_mismatch() {
        let set = LabelSet::new(&["Calm", "Angry"]).unwrap();
        assert!(set.validate_declared(&["calm", "LABEL_1"]).is_ok());
        match set.validate_declared(&["Calm", "Joy"]) {
            Err(MoodshError::UnknownLabel { label }) => assert_eq!(label, "Joy"),
            other => panic!("Expected UnknownLabel, got {:?}", other),
        }
    }

    #[test]
    fn label_serializes_as_plain_string() {
        let json = serde_json::to_string(&Label::new("Fear")).unwrap();
        assert_eq!(json, "\"Fear\"");
    }
}
