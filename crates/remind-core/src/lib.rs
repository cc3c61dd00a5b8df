//! Core reminder parsing logic.
//!
//! This crate contains the pure, synchronous parts of the pipeline:
//! - Tokenizer: whitespace/chunk tokenization into fixed-length model input
//! - Decoder: BIO label predictions to entity spans
//! - Resolver: DATE/TIME/DURATION entities to a timestamp and suggestion
//! - Fallback: regex-based resolution when no labeler output is available

pub mod clock;
pub mod decoder;
pub mod entity;
pub mod fallback;
pub mod lexicon;
pub mod offset;
pub mod resolver;
pub mod result;
pub mod tokenizer;
pub mod vocabulary;

pub use clock::{Clock, FixedClock, SystemClock};
pub use decoder::{argmax_rows, decode};
pub use entity::{DateTimeEntity, Entity, EntityKind, entities_from_json};
pub use fallback::fallback_resolve;
pub use resolver::{Resolution, ResolutionState, resolve};
pub use result::ReminderParseResult;
pub use tokenizer::{DEFAULT_MAX_LENGTH, EncodingResult, Tokenizer};
pub use vocabulary::{LabelSet, VocabError, Vocabulary};
