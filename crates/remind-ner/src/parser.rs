//! Reminder parsing front door: labeler first, regex fallback second.

use std::future::Future;
use std::time::Duration;

use remind_core::{Clock, Entity, ReminderParseResult, SystemClock, fallback_resolve, resolve};

use crate::NerError;
use crate::manager::NerManager;

/// Deadline for a single labeler prediction.
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(10);

const NOT_READY_MESSAGE: &str = "labeler not ready and fallback failed";
const NO_ENTITIES_MESSAGE: &str = "no entities detected by labeler or fallback";

/// Something that labels text with entity spans.
pub trait Labeler: Send + Sync {
    fn is_ready(&self) -> bool;

    fn predict(&self, text: &str) -> impl Future<Output = Result<Vec<Entity>, NerError>> + Send;
}

impl Labeler for NerManager {
    fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    fn predict(&self, text: &str) -> impl Future<Output = Result<Vec<Entity>, NerError>> + Send {
        Self::predict(self, text)
    }
}

/// Turns free text into a [`ReminderParseResult`].
///
/// Parsing never fails: labeler problems route to the regex fallback, and
/// when that finds nothing the result carries an error message instead.
#[derive(Debug, Clone)]
pub struct ReminderParser<L, C = SystemClock> {
    labeler: L,
    clock: C,
    timeout: Duration,
}

impl<L: Labeler> ReminderParser<L> {
    pub const fn new(labeler: L) -> Self {
        Self {
            labeler,
            clock: SystemClock,
            timeout: DEFAULT_INFERENCE_TIMEOUT,
        }
    }
}

impl<L: Labeler, C: Clock> ReminderParser<L, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ReminderParser<L, C2> {
        ReminderParser {
            labeler: self.labeler,
            clock,
            timeout: self.timeout,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn labeler(&self) -> &L {
        &self.labeler
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Parses `text` under the configured inference deadline.
    pub async fn parse(&self, text: &str) -> ReminderParseResult {
        self.parse_with_timeout(text, self.timeout).await
    }

    /// Parses `text` with an explicit inference deadline.
    pub async fn parse_with_timeout(&self, text: &str, timeout: Duration) -> ReminderParseResult {
        let now = self.clock.now();

        if !self.labeler.is_ready() {
            tracing::debug!("labeler not ready, using fallback");
            return fallback_resolve(text, now)
                .unwrap_or_else(|| ReminderParseResult::failure(text, NOT_READY_MESSAGE));
        }

        let entities = match tokio::time::timeout(timeout, self.labeler.predict(text)).await {
            Ok(Ok(entities)) => entities,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "labeler failed, using fallback");
                return fallback_resolve(text, now).unwrap_or_else(|| {
                    ReminderParseResult::failure(text, format!("parsing error: {err}"))
                });
            }
            Err(_) => {
                tracing::warn!(?timeout, "labeler timed out, using fallback");
                return fallback_resolve(text, now)
                    .unwrap_or_else(|| ReminderParseResult::failure(text, "parsing timeout"));
            }
        };

        if entities.is_empty() {
            tracing::debug!("labeler found nothing, using fallback");
            return fallback_resolve(text, now)
                .unwrap_or_else(|| ReminderParseResult::failure(text, NO_ENTITIES_MESSAGE));
        }

        resolve(text, &entities, now).into_result(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{NaiveDate, NaiveDateTime};
    use remind_core::FixedClock;

    enum Behavior {
        NotReady,
        Returns(Vec<Entity>),
        Fails,
        Hangs,
    }

    struct FakeLabeler(Behavior);

    impl Labeler for FakeLabeler {
        fn is_ready(&self) -> bool {
            !matches!(self.0, Behavior::NotReady)
        }

        async fn predict(&self, _text: &str) -> Result<Vec<Entity>, NerError> {
            match &self.0 {
                Behavior::NotReady => Err(NerError::NotReady),
                Behavior::Returns(entities) => Ok(entities.clone()),
                Behavior::Fails => Err(NerError::Inference("bad logits".to_string())),
                Behavior::Hangs => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn parser(behavior: Behavior) -> ReminderParser<FakeLabeler, FixedClock> {
        ReminderParser::new(FakeLabeler(behavior)).with_clock(FixedClock(now()))
    }

    #[tokio::test]
    async fn not_ready_labeler_uses_fallback() {
        let result = parser(Behavior::NotReady)
            .parse("нагадай через 10 хвилин")
            .await;
        assert!(result.success);
        assert_eq!(result.resolved_at, Some(now() + chrono::Duration::minutes(10)));
        assert_eq!(result.suggestion_text.as_deref(), Some("через 10 хвилин"));
        assert_eq!(result.goal_text(), Some("нагадай"));
    }

    #[tokio::test]
    async fn not_ready_without_fallback_match_fails() {
        let result = parser(Behavior::NotReady).parse("купити молоко").await;
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some(NOT_READY_MESSAGE));
        assert_eq!(result.resolved_at, None);
    }

    #[tokio::test]
    async fn labeler_entities_are_resolved() {
        let entities = vec![
            Entity::new("DATE", 0, 6, "завтра"),
            Entity::new("TIME", 7, 14, "о 15:30"),
        ];
        let result = parser(Behavior::Returns(entities))
            .parse("завтра о 15:30")
            .await;
        assert!(result.success);
        let expected = NaiveDate::from_ymd_opt(2025, 3, 15)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        assert_eq!(result.resolved_at, Some(expected));
        assert_eq!(result.date_time_entities.len(), 2);
    }

    #[tokio::test]
    async fn zero_entities_and_no_fallback_match_fails() {
        let result = parser(Behavior::Returns(Vec::new()))
            .parse("купити молоко")
            .await;
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some(NO_ENTITIES_MESSAGE));
        assert_eq!(result.resolved_at, None);
    }

    #[tokio::test]
    async fn zero_entities_falls_back() {
        let result = parser(Behavior::Returns(Vec::new()))
            .parse("подзвонити мамі о 18")
            .await;
        assert!(result.success);
        assert_eq!(result.goal_text(), Some("подзвонити мамі"));
    }

    #[tokio::test]
    async fn labeler_error_falls_back_then_reports() {
        let result = parser(Behavior::Fails).parse("через 2 години").await;
        assert!(result.success);

        let result = parser(Behavior::Fails).parse("купити молоко").await;
        assert_eq!(
            result.error_message.as_deref(),
            Some("parsing error: inference failed: bad logits")
        );
    }

    #[tokio::test]
    async fn timeout_falls_back_then_reports() {
        let parser = parser(Behavior::Hangs).with_timeout(Duration::from_millis(50));
        assert_eq!(parser.timeout(), Duration::from_millis(50));

        let result = parser.parse("купити молоко").await;
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("parsing timeout"));

        let result = parser
            .parse_with_timeout("завтра", Duration::from_millis(5))
            .await;
        assert!(result.success);
    }
}
