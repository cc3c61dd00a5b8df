//! Labeled spans of input text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A labeled substring of the input with character-offset boundaries.
///
/// `start` and `end` are character offsets into the original text, `end`
/// exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Entity {
    pub fn new(
        label: impl Into<String>,
        start: usize,
        end: usize,
        text: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            start,
            end,
            text: text.into(),
        }
    }

    /// The entity kind, parsed from the label case-insensitively.
    pub fn kind(&self) -> EntityKind {
        self.label
            .parse()
            .unwrap_or_else(|_| EntityKind::Other(self.label.to_uppercase()))
    }
}

/// An entity that contributed to a resolved timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateTimeEntity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

impl DateTimeEntity {
    /// Confidence assigned to entities found by the sequence labeler.
    pub const LABELER_CONFIDENCE: f32 = 1.0;
    /// Confidence assigned to entities found by the regex fallback.
    pub const FALLBACK_CONFIDENCE: f32 = 0.8;

    pub fn from_entity(entity: &Entity, confidence: f32) -> Self {
        Self {
            text: entity.text.clone(),
            label: entity.label.clone(),
            start: entity.start,
            end: entity.end,
            confidence,
        }
    }
}

/// Entity kinds the resolver dispatches on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Date,
    Time,
    Duration,
    /// Task description left over once date/time phrases are removed.
    Goal,
    Other(String),
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Duration => "DURATION",
            Self::Goal => "GOAL",
            Self::Other(label) => label,
        };
        write!(f, "{s}")
    }
}

impl FromStr for EntityKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "DURATION" => Self::Duration,
            "GOAL" => Self::Goal,
            other => Self::Other(other.to_string()),
        })
    }
}

/// Reads an entity list from JSON (an array of `{label, start, end, text}`).
pub fn entities_from_json(json: &str) -> Result<Vec<Entity>, serde_json::Error> {
    serde_json::from_str(json)
}
