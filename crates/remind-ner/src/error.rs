use std::path::PathBuf;
use std::time::Duration;

use remind_core::VocabError;
use thiserror::Error;

/// Labeler runtime errors.
#[derive(Debug, Error)]
pub enum NerError {
    /// The labeler has no loaded model.
    #[error("labeler not ready")]
    NotReady,
    /// Inference did not finish before the deadline.
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// Downloading an asset failed.
    #[error("failed to download {locator}: {source}")]
    Download {
        locator: String,
        #[source]
        source: reqwest::Error,
    },
    /// Reading or writing a local file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A vocabulary or label file could not be parsed.
    #[error("invalid {name} file: {source}")]
    Asset {
        name: &'static str,
        #[source]
        source: VocabError,
    },
    /// No inference runtime can load the model.
    #[error("inference backend unavailable: {0}")]
    BackendUnavailable(String),
    /// The model ran but produced unusable output.
    #[error("inference failed: {0}")]
    Inference(String),
    /// The labeler task has stopped.
    #[error("labeler task stopped")]
    Closed,
}

impl NerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
