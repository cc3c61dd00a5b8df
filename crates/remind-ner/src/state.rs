//! Observable labeler lifecycle state.

use std::fmt;

use serde::Serialize;

/// Lifecycle of a labeler instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NerState {
    /// No complete set of assets is configured.
    NotInitialized,
    /// Assets are being copied and the model loaded.
    Downloading { progress: u8 },
    /// A model is loaded and accepting predictions.
    Ready,
    /// The last initialization failed.
    Error { message: String },
}

impl NerState {
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` unless an initialization is in progress.
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Downloading { .. })
    }
}

impl fmt::Display for NerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "not initialized"),
            Self::Downloading { progress } => write!(f, "loading ({progress}%)"),
            Self::Ready => write!(f, "ready"),
            Self::Error { message } => write!(f, "error: {message}"),
        }
    }
}
