//! ONNX Runtime backend.
//!
//! Expects a token-classification export taking `input_ids` and
//! `attention_mask` (and optionally `token_type_ids`) shaped `[1, n]` and
//! returning logits shaped `[1, n, label_count]` as its first output.

use std::fmt;
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::{DynValue, Tensor};

use crate::NerError;
use crate::runtime::{InferenceBackend, InferenceSession};

/// Loads models with ONNX Runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxBackend;

impl InferenceBackend for OnnxBackend {
    fn load(&self, model_path: &Path) -> Result<Box<dyn InferenceSession>, NerError> {
        let session = Session::builder()
            .and_then(|builder| builder.commit_from_file(model_path))
            .map_err(|err| {
                NerError::BackendUnavailable(format!(
                    "failed to load {}: {err}",
                    model_path.display()
                ))
            })?;

        let inputs: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
        tracing::debug!(?inputs, path = %model_path.display(), "onnx model loaded");
        if !inputs.contains(&"input_ids") {
            return Err(NerError::BackendUnavailable(format!(
                "{} has no input_ids input",
                model_path.display()
            )));
        }

        Ok(Box::new(OnnxSession {
            session: Mutex::new(session),
        }))
    }
}

/// A loaded ONNX Runtime session.
///
/// `Session::run` needs exclusive access, so calls are serialized.
pub struct OnnxSession {
    session: Mutex<Session>,
}

impl fmt::Debug for OnnxSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxSession").finish_non_exhaustive()
    }
}

impl OnnxSession {
    fn inputs(
        session: &Session,
        input_ids: &[i64],
        attention_mask: &[i64],
    ) -> Result<Vec<(String, DynValue)>, ort::Error> {
        let shape = [1, input_ids.len()];
        session
            .inputs
            .iter()
            .map(|input| {
                let data = match input.name.as_str() {
                    "input_ids" => input_ids.to_vec(),
                    "attention_mask" => attention_mask.to_vec(),
                    // token_type_ids and anything else single-segment
                    _ => vec![0; input_ids.len()],
                };
                Ok((input.name.clone(), Tensor::from_array((shape, data))?.into_dyn()))
            })
            .collect()
    }
}

impl InferenceSession for OnnxSession {
    fn run(&self, input_ids: &[i64], attention_mask: &[i64]) -> Result<Vec<Vec<f32>>, NerError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| NerError::Inference("onnx session lock poisoned".to_string()))?;

        let inputs = Self::inputs(&session, input_ids, attention_mask)
            .map_err(|err| NerError::Inference(err.to_string()))?;
        let outputs = session
            .run(inputs)
            .map_err(|err| NerError::Inference(err.to_string()))?;
        let (shape, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|err| NerError::Inference(err.to_string()))?;

        let dims: &[i64] = shape;
        let label_count = match dims {
            [_, _, labels] => usize::try_from(*labels).unwrap_or(0),
            _ => 0,
        };
        if label_count == 0 {
            return Err(NerError::Inference(format!("unexpected logits shape {dims:?}")));
        }

        Ok(logits
            .chunks_exact(label_count)
            .map(<[f32]>::to_vec)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_file_is_backend_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxBackend
            .load(&dir.path().join("absent.onnx"))
            .err()
            .unwrap();
        assert!(matches!(err, NerError::BackendUnavailable(_)), "got {err:?}");
    }

    #[test]
    fn garbage_model_file_is_backend_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"not a model").unwrap();
        let err = OnnxBackend.load(&path).err().unwrap();
        assert!(matches!(err, NerError::BackendUnavailable(_)), "got {err:?}");
    }

    /// Needs `REMIND_TEST_ONNX_MODEL` pointing at a token-classification export.
    #[test]
    #[ignore = "requires a model file"]
    fn real_model_returns_one_row_per_token() {
        let path = std::env::var("REMIND_TEST_ONNX_MODEL").unwrap();
        let session = OnnxBackend.load(Path::new(&path)).unwrap();
        let ids = [101, 2000, 2001, 102, 0, 0];
        let mask = [1, 1, 1, 1, 0, 0];
        let logits = session.run(&ids, &mask).unwrap();
        assert_eq!(logits.len(), ids.len());
        assert!(logits.iter().all(|row| row.len() == logits[0].len()));
    }
}
