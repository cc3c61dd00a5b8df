//! Inference runtime seam and the labeler pipeline built on it.
//!
//! The model itself is opaque: an [`InferenceBackend`] turns a model file
//! into an [`InferenceSession`], and a session maps token ids to per-token
//! label logits. Everything around it (tokenizing, argmax, BIO decoding)
//! lives in [`NerProcessor`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use remind_core::{Entity, LabelSet, Tokenizer, Vocabulary, argmax_rows, decode};

use crate::NerError;
use crate::assets::CachedAssets;

/// A loaded model.
pub trait InferenceSession: Send + Sync {
    /// Runs the model on one sequence.
    ///
    /// Returns logits shaped `[sequence_length][label_count]`.
    fn run(&self, input_ids: &[i64], attention_mask: &[i64]) -> Result<Vec<Vec<f32>>, NerError>;
}

/// Creates sessions from model files.
pub trait InferenceBackend: Send + Sync {
    fn load(&self, model_path: &Path) -> Result<Box<dyn InferenceSession>, NerError>;
}

/// Backend used when no inference runtime is linked in.
///
/// Every load fails, which leaves the labeler in an error state and routes
/// parsing through the regex fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

impl InferenceBackend for UnavailableBackend {
    fn load(&self, model_path: &Path) -> Result<Box<dyn InferenceSession>, NerError> {
        Err(NerError::BackendUnavailable(format!(
            "no inference runtime available to load {}",
            model_path.display()
        )))
    }
}

/// The backend linked into this build: ONNX Runtime with the `onnx`
/// feature, [`UnavailableBackend`] without it.
pub fn default_backend() -> Arc<dyn InferenceBackend> {
    #[cfg(feature = "onnx")]
    {
        Arc::new(crate::onnx::OnnxBackend)
    }
    #[cfg(not(feature = "onnx"))]
    {
        Arc::new(UnavailableBackend)
    }
}

/// Tokenizer, model session and label list for one loaded model.
pub struct NerProcessor {
    tokenizer: Tokenizer,
    session: Box<dyn InferenceSession>,
    labels: LabelSet,
}

impl fmt::Debug for NerProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NerProcessor")
            .field("tokenizer", &self.tokenizer)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl NerProcessor {
    pub fn new(tokenizer: Tokenizer, session: Box<dyn InferenceSession>, labels: LabelSet) -> Self {
        Self {
            tokenizer,
            session,
            labels,
        }
    }

    /// Builds a processor from cached asset files. Blocking.
    pub fn load(
        backend: &dyn InferenceBackend,
        cached: &CachedAssets,
        max_length: usize,
    ) -> Result<Self, NerError> {
        let session = backend.load(&cached.model)?;

        let vocab_json = std::fs::read_to_string(&cached.tokenizer)
            .map_err(|err| NerError::io(&cached.tokenizer, err))?;
        let vocab = Vocabulary::from_json(&vocab_json).map_err(|source| NerError::Asset {
            name: "tokenizer",
            source,
        })?;

        let labels_json = std::fs::read_to_string(&cached.labels)
            .map_err(|err| NerError::io(&cached.labels, err))?;
        let labels = LabelSet::from_json(&labels_json).map_err(|source| NerError::Asset {
            name: "labels",
            source,
        })?;

        tracing::debug!(
            vocab = vocab.len(),
            labels = labels.len(),
            max_length,
            "labeler assets loaded"
        );
        Ok(Self::new(
            Tokenizer::new(vocab).with_max_length(max_length),
            session,
            labels,
        ))
    }

    /// Labels `text` and decodes entity spans. Blocking.
    pub fn predict(&self, text: &str) -> Result<Vec<Entity>, NerError> {
        let encoding = self.tokenizer.encode(text);
        let logits = self.session.run(&encoding.ids, &encoding.attention_mask)?;
        if logits.len() != encoding.len() {
            return Err(NerError::Inference(format!(
                "expected {} rows of logits, got {}",
                encoding.len(),
                logits.len()
            )));
        }

        let predicted = argmax_rows(&logits);
        let entities = decode(
            &encoding.tokens,
            &predicted,
            &self.labels,
            &encoding.char_spans,
            text,
        );
        tracing::debug!(count = entities.len(), "labeler found entities");
        Ok(entities)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedSession;
    use super::*;

    fn processor() -> NerProcessor {
        let vocab: Vocabulary = [("завтра", 10), ("о", 11), ("15:30", 12)]
            .into_iter()
            .map(|(t, id)| (t.to_string(), id))
            .collect();
        let labels = LabelSet::new(
            ["O", "B-DATE", "B-TIME", "I-TIME"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        let session = ScriptedSession {
            classes: [(10, 1), (11, 2), (12, 3)].into_iter().collect(),
            label_count: 4,
            delay: None,
        };
        NerProcessor::new(
            Tokenizer::new(vocab).with_max_length(16),
            Box::new(session),
            labels,
        )
    }

    #[test]
    fn predict_runs_tokenize_label_decode() {
        let entities = processor().predict("нагадай завтра о 15:30").unwrap();
        assert_eq!(
            entities,
            vec![
                Entity::new("DATE", 8, 14, "завтра"),
                Entity::new("TIME", 15, 22, "о 15:30"),
            ]
        );
    }

    #[test]
    fn unavailable_backend_refuses_to_load() {
        let err = UnavailableBackend
            .load(Path::new("/tmp/model.onnx"))
            .err()
            .unwrap();
        assert!(matches!(err, NerError::BackendUnavailable(_)));
    }

    #[test]
    fn default_backend_matches_build_features() {
        let dir = tempfile::tempdir().unwrap();
        let err = default_backend()
            .load(&dir.path().join("absent.onnx"))
            .err()
            .unwrap();
        assert!(matches!(err, NerError::BackendUnavailable(_)));
        if cfg!(feature = "onnx") {
            assert!(err.to_string().contains("failed to load"), "got {err}");
        } else {
            assert!(err.to_string().contains("no inference runtime"), "got {err}");
        }
    }

    #[test]
    fn load_reports_bad_label_file() {
        let dir = tempfile::tempdir().unwrap();
        let cached = CachedAssets {
            model: dir.path().join("model.onnx"),
            tokenizer: dir.path().join("tokenizer.json"),
            labels: dir.path().join("labels.json"),
        };
        std::fs::write(&cached.tokenizer, r#"{"vocab":{"a":1}}"#).unwrap();
        std::fs::write(&cached.labels, r#"{"not":"an array"}"#).unwrap();

        let backend = testing::ScriptedBackend::default();
        let err = NerProcessor::load(&backend, &cached, 8).unwrap_err();
        assert!(matches!(err, NerError::Asset { name: "labels", .. }));
    }
}
