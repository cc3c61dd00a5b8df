//! Tokenizer vocabulary and label list files.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors reading vocabulary or label files.
#[derive(Debug, Error)]
pub enum VocabError {
    /// The document was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The document had none of the supported shapes.
    #[error("unsupported vocabulary format: {0}")]
    Format(&'static str),
    /// The vocabulary contained no integer token ids.
    #[error("vocabulary is empty")]
    Empty,
    /// A label list entry was not a string.
    #[error("label at index {index} is not a string")]
    InvalidLabel { index: usize },
}

/// Token to id mapping.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    ids: HashMap<String, i64>,
}

impl Vocabulary {
    /// Parses a vocabulary document.
    ///
    /// Resolution order: `model.vocab` object (the `tokenizer.json`
    /// layout), then a top-level `vocab` object, then a flat object
    /// mapping tokens to ids. Non-integer values are skipped.
    pub fn from_json(json: &str) -> Result<Self, VocabError> {
        let root: Value = serde_json::from_str(json)?;
        let Value::Object(root) = root else {
            return Err(VocabError::Format("expected a JSON object"));
        };

        let table = if let Some(Value::Object(vocab)) =
            root.get("model").and_then(|model| model.get("vocab"))
        {
            vocab
        } else if let Some(Value::Object(vocab)) = root.get("vocab") {
            vocab
        } else {
            &root
        };

        let vocab = Self::from_table(table);
        if vocab.ids.is_empty() {
            return Err(VocabError::Empty);
        }
        tracing::debug!(tokens = vocab.ids.len(), "loaded vocabulary");
        Ok(vocab)
    }

    fn from_table(table: &Map<String, Value>) -> Self {
        let ids = table
            .iter()
            .filter_map(|(token, id)| id.as_i64().map(|id| (token.clone(), id)))
            .collect();
        Self { ids }
    }

    pub fn get(&self, token: &str) -> Option<i64> {
        self.ids.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<(String, i64)> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Model output labels, indexed by class id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Parses a JSON array of label strings.
    pub fn from_json(json: &str) -> Result<Self, VocabError> {
        let root: Value = serde_json::from_str(json)?;
        let Value::Array(items) = root else {
            return Err(VocabError::Format("expected a JSON array of labels"));
        };
        let labels = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(label) => Ok(label),
                _ => Err(VocabError::InvalidLabel { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { labels })
    }

    /// The label for a class index, `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
