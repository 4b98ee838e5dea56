//! Client for a remote audio-classification endpoint.
//!
//! Speaks the Hugging Face inference convention: the request body is the raw
//! audio file and the response is a JSON list of `{label, score}` objects.

use crate::classifier::{Classifier, Score};
use crate::defaults;
use crate::error::{MoodshError, Result};
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

/// Classifier backed by an HTTP inference endpoint.
pub struct HttpClassifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: Option<String>,
    declared: Option<Vec<String>>,
}

impl HttpClassifier {
    /// # Errors
    /// `Classification` if the HTTP client cannot be built.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(
            endpoint,
            Duration::from_secs(defaults::CLASSIFIER_TIMEOUT_SECS),
        )
    }

    /// Same as [`HttpClassifier::new`] with an explicit request timeout.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MoodshError::Classification {
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token: None,
            declared: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Labels the remote model is known to produce.
    pub fn with_declared_labels(mut self, labels: Vec<String>) -> Self {
        self.declared = Some(labels);
        self
    }
}

impl Classifier for HttpClassifier {
    fn predict(
        &self,
        samples: &[f32],
        sample_rate: u32,
        top_k: Option<usize>,
    ) -> Result<Vec<Score>> {
        let body = encode_wav(samples, sample_rate)?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| MoodshError::Classification {
            message: format!("Request to {} failed: {e}", self.endpoint),
        })?;

        let status = response.status();
        let text = response.text().map_err(|e| MoodshError::Classification {
            message: format!("Failed to read classifier response: {e}"),
        })?;
        debug!(%status, bytes = text.len(), "classifier responded");

        if !status.is_success() {
            let detail = parse_response(&text)
                .err()
                .map(|e| e.to_string())
                .unwrap_or_else(|| text.chars().take(200).collect());
            return Err(MoodshError::Classification {
                message: format!("Classifier returned status {status}: {detail}"),
            });
        }

        let mut scores = parse_response(&text)?;
        if let Some(k) = top_k {
            scores.truncate(k);
        }
        Ok(scores)
    }

    fn name(&self) -> &str {
        &self.endpoint
    }

    fn labels(&self) -> Option<Vec<String>> {
        self.declared.clone()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResponseBody {
    Scores(Vec<Score>),
    Batched(Vec<Vec<Score>>),
    Error { error: String },
}

/// Parse a classifier response body, best score first.
fn parse_response(text: &str) -> Result<Vec<Score>> {
    let body: ResponseBody =
        serde_json::from_str(text).map_err(|e| MoodshError::Classification {
            message: format!("Failed to parse classifier response: {e}"),
        })?;

    let mut scores = match body {
        ResponseBody::Scores(scores) => scores,
        ResponseBody::Batched(batches) => batches.into_iter().next().unwrap_or_default(),
        ResponseBody::Error { error } => {
            return Err(MoodshError::Classification { message: error });
        }
    };
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(scores)
}

/// Encode mono samples as a 16-bit PCM WAV file.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wav_error = |e: hound::Error| MoodshError::Classification {
        message: format!("Failed to encode audio: {e}"),
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(wav_error)?;
    for &sample in samples {
        let pcm = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer.write_sample(pcm).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_response_sorts_scores() {
        let scores =
            parse_response(r#"[{"label":"sad","score":0.2},{"label":"hap","score":0.7}]"#)
                .unwrap();
        assert_eq!(scores[0], Score::new("hap", 0.7));
        assert_eq!(scores[1], Score::new("sad", 0.2));
    }

    #[test]
    fn parse_response_accepts_batched_form() {
        let scores = parse_response(r#"[[{"label":"neu","score":0.9}]]"#).unwrap();
        assert_eq!(scores, vec![Score::new("neu", 0.9)]);
    }

    #[test]
    fn parse_response_error_object_is_classification_error() {
        match parse_response(r#"{"error":"Model is currently loading"}"#) {
            Err(MoodshError::Classification { message }) => {
                assert_eq!(message, "Model is currently loading");
            }
            other => panic!("Expected Classification error, got {:?}", other),
        }
    }

    #[test]
    fn parse_response_garbage_is_classification_error() {
        let err = parse_response("<html>bad gateway</html>").unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn encode_wav_roundtrips_through_hound() {
        let bytes = encode_wav(&[0.0, 0.5, -1.0], 16000).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 16383, -32767]);
    }

    #[test]
    fn with_token_ignores_empty() {
        let classifier = HttpClassifier::new("http://localhost:9/classify")
            .unwrap()
            .with_token(Some(String::new()));
        assert!(classifier.token.is_none());
    }

    #[test]
    fn unreachable_endpoint_is_recoverable() {
        let classifier =
            HttpClassifier::with_timeout("http://127.0.0.1:9/classify", Duration::from_millis(200))
                .unwrap();
        let err = classifier.predict(&[0.1; 160], 16000, Some(1)).unwrap_err();
        assert!(err.is_recoverable());
    }
}
