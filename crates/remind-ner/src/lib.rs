//! Sequence-labeler runtime for reminder parsing.
//!
//! Provides:
//! - Asset fetching into a local cache (local paths or HTTP)
//! - An inference seam ([`InferenceBackend`]) and the tokenize/label/decode pipeline
//! - An ONNX Runtime backend behind the `onnx` feature
//! - [`NerManager`], a task that owns the loaded model and publishes its state
//! - [`ReminderParser`], which picks labeler or regex fallback per request

pub mod assets;
mod error;
pub mod manager;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod parser;
pub mod runtime;
pub mod state;

pub use assets::{AssetFetcher, CachedAssets, ModelAssets};
pub use error::NerError;
pub use manager::NerManager;
#[cfg(feature = "onnx")]
pub use onnx::{OnnxBackend, OnnxSession};
pub use parser::{DEFAULT_INFERENCE_TIMEOUT, Labeler, ReminderParser};
pub use remind_core::DEFAULT_MAX_LENGTH;
pub use runtime::{
    InferenceBackend, InferenceSession, NerProcessor, UnavailableBackend, default_backend,
};
pub use state::NerState;
