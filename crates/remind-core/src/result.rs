//! Outcome of a single parse request.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::entity::{DateTimeEntity, Entity, EntityKind};

/// Result of parsing one reminder text. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderParseResult {
    pub original_text: String,
    pub date_time_entities: Vec<DateTimeEntity>,
    pub other_entities: Vec<Entity>,
    pub success: bool,
    pub resolved_at: Option<NaiveDateTime>,
    pub suggestion_text: Option<String>,
    pub error_message: Option<String>,
}

impl ReminderParseResult {
    /// A failed parse with no entities.
    pub fn failure(original_text: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            date_time_entities: Vec::new(),
            other_entities: Vec::new(),
            success: false,
            resolved_at: None,
            suggestion_text: None,
            error_message: Some(message.into()),
        }
    }

    /// The `GOAL` entity text, if one was extracted.
    pub fn goal_text(&self) -> Option<&str> {
        self.other_entities
            .iter()
            .find(|entity| entity.kind() == EntityKind::Goal)
            .map(|entity| entity.text.as_str())
    }
}

impl fmt::Display for ReminderParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.success {
            let message = self.error_message.as_deref().unwrap_or("nothing found");
            return write!(f, "No reminder time: {message}");
        }

        if let Some(at) = self.resolved_at {
            writeln!(f, "Remind at: {}", at.format("%Y-%m-%d %H:%M:%S"))?;
        }
        if let Some(suggestion) = &self.suggestion_text {
            writeln!(f, "Detected:  {suggestion}")?;
        }
        if let Some(goal) = self.goal_text() {
            writeln!(f, "Task:      {goal}")?;
        }
        for entity in &self.date_time_entities {
            writeln!(
                f,
                "- {} [{}..{}] {:?} ({:.1})",
                entity.label, entity.start, entity.end, entity.text, entity.confidence
            )?;
        }
        Ok(())
    }
}
