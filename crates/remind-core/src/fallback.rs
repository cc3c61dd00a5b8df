//! Regex fallback resolver.
//!
//! Used when the sequence labeler is unavailable or finds nothing. Three
//! patterns are tried in fixed priority order and the first one that
//! produces a valid timestamp wins:
//!
//! 1. duration: `через 10 хвилин`, `за дві години`
//! 2. bare time: `о 15:30`, `в 9`
//! 3. relative day with optional time: `завтра`, `післязавтра 18:00`

use std::sync::LazyLock;

use chrono::{Duration, NaiveDateTime};
use regex::{Captures, Regex};

use crate::entity::{DateTimeEntity, Entity};
use crate::lexicon::{DurationUnit, RELATIVE_DAYS, number_word};
use crate::offset::{byte_to_char, char_len};
use crate::resolver::{DEFAULT_HOUR, DURATION_PHRASE_RE, add_duration, at_time};
use crate::result::ReminderParseResult;

static BARE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:о|в)\s*(\d{1,2})(?:[:.]\s*(\d{2}))?\b").unwrap()
});

static RELATIVE_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(післязавтра|сьогодні|завтра)",
        r"(?:\s*(?:о|в)?\s*(\d{1,2})(?:[:.]\s*(\d{2}))?\b)?",
    ))
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Duration,
    BareTime,
    RelativeDay,
}

impl Pattern {
    const PRIORITY: [Self; 3] = [Self::Duration, Self::BareTime, Self::RelativeDay];

    fn regex(self) -> &'static Regex {
        match self {
            Self::Duration => &DURATION_PHRASE_RE,
            Self::BareTime => &BARE_TIME_RE,
            Self::RelativeDay => &RELATIVE_DAY_RE,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Duration => "DURATION",
            Self::BareTime => "TIME",
            Self::RelativeDay => "DATE",
        }
    }

    fn resolve(self, caps: &Captures<'_>, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::Duration => {
                let number = caps[1].to_lowercase();
                let amount = number.parse().ok().or_else(|| number_word(&number))?;
                let unit = DurationUnit::from_word(&caps[2].to_lowercase())?;
                add_duration(now, amount, unit)
            }
            Self::BareTime => {
                let (hour, minute) = clock(caps.get(1), caps.get(2))?;
                let at = at_time(now.date(), hour?, minute)?;
                Some(if at < now { at + Duration::days(1) } else { at })
            }
            Self::RelativeDay => {
                let day = caps[1].to_lowercase();
                let (_, days) = RELATIVE_DAYS.iter().find(|(word, _)| *word == day)?;
                let date = now.date() + Duration::days(*days);
                let (hour, minute) = clock(caps.get(2), caps.get(3))?;
                at_time(date, hour.unwrap_or(DEFAULT_HOUR), minute)
            }
        }
    }
}

/// Parses optional hour/minute captures. The outer `None` means the
/// values were out of range; an absent hour is `Some((None, 0))`.
fn clock(
    hour: Option<regex::Match<'_>>,
    minute: Option<regex::Match<'_>>,
) -> Option<(Option<u32>, u32)> {
    let hour = match hour {
        Some(h) => Some(h.as_str().parse::<u32>().ok().filter(|h| *h < 24)?),
        None => None,
    };
    let minute = match minute {
        Some(m) => m.as_str().parse::<u32>().ok().filter(|m| *m < 60)?,
        None => 0,
    };
    Some((hour, minute))
}

/// Tries the fallback patterns against `text`.
///
/// Matching is case-insensitive over the original text, so entity
/// offsets always index `text`. Goal and suggestion are lowercased.
///
/// Returns `None` when no pattern yields a timestamp.
pub fn fallback_resolve(text: &str, now: NaiveDateTime) -> Option<ReminderParseResult> {
    let clean = text.trim();
    let lead = char_len(text) - char_len(text.trim_start());
    tracing::debug!(text = clean, "fallback parsing");

    for pattern in Pattern::PRIORITY {
        let Some(caps) = pattern.regex().captures(clean) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Some(resolved_at) = pattern.resolve(&caps, now) else {
            tracing::debug!(?pattern, matched = whole.as_str(), "fallback match rejected");
            continue;
        };

        let goal = format!(
            "{} {}",
            clean[..whole.start()].trim(),
            clean[whole.end()..].trim()
        )
        .to_lowercase();
        let goal = goal.trim();
        tracing::debug!(?pattern, matched = whole.as_str(), goal, "fallback matched");

        let start = lead + byte_to_char(clean, whole.start());
        let end = lead + byte_to_char(clean, whole.end());
        let matched = Entity::new(pattern.label(), start, end, whole.as_str());

        let other_entities = if goal.is_empty() {
            Vec::new()
        } else {
            vec![Entity::new("GOAL", 0, char_len(goal), goal)]
        };

        return Some(ReminderParseResult {
            original_text: text.to_string(),
            date_time_entities: vec![DateTimeEntity::from_entity(
                &matched,
                DateTimeEntity::FALLBACK_CONFIDENCE,
            )],
            other_entities,
            success: true,
            resolved_at: Some(resolved_at),
            suggestion_text: Some(whole.as_str().to_lowercase()),
            error_message: None,
        });
    }

    tracing::debug!("no fallback pattern matched");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    fn dt(d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    /// 2025-03-14 10:00:00.
    fn now() -> NaiveDateTime {
        dt(14, 10, 0)
    }

    #[test]
    fn duration_in_minutes() {
        let result = fallback_resolve("нагадай через 10 хвилин", now()).unwrap();
        assert!(result.success);
        assert_eq!(result.resolved_at, Some(dt(14, 10, 10)));
        assert_eq!(result.suggestion_text.as_deref(), Some("через 10 хвилин"));
        assert_eq!(result.goal_text(), Some("нагадай"));
        let entity = &result.date_time_entities[0];
        assert_eq!(entity.label, "DURATION");
        assert_eq!((entity.start, entity.end), (8, 23));
        assert!((entity.confidence - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn duration_with_number_word() {
        let result = fallback_resolve("за дві години подзвонити", now()).unwrap();
        assert_eq!(result.resolved_at, Some(dt(14, 12, 0)));
        assert_eq!(result.goal_text(), Some("подзвонити"));
    }

    #[test]
    fn duration_wins_over_bare_time() {
        let result = fallback_resolve("о 15:00 або через 2 години", now()).unwrap();
        assert_eq!(result.date_time_entities[0].label, "DURATION");
        assert_eq!(result.resolved_at, Some(dt(14, 12, 0)));
        assert_eq!(result.goal_text(), Some("о 15:00 або"));
    }

    #[test]
    fn bare_time_today_when_in_future() {
        let result = fallback_resolve("Купити хліб о 18:45", now()).unwrap();
        assert_eq!(result.resolved_at, Some(dt(14, 18, 45)));
        assert_eq!(result.suggestion_text.as_deref(), Some("о 18:45"));
        assert_eq!(result.goal_text(), Some("купити хліб"));
    }

    #[test]
    fn bare_time_rolls_to_tomorrow_when_past() {
        let result = fallback_resolve("зарядка в 7", now()).unwrap();
        assert_eq!(result.resolved_at, Some(dt(15, 7, 0)));
    }

    #[test]
    fn out_of_range_times_are_rejected() {
        assert!(fallback_resolve("о 25", now()).is_none());
        assert!(fallback_resolve("в 10:75", now()).is_none());
    }

    #[test]
    fn relative_day_with_and_without_time() {
        let result = fallback_resolve("післязавтра 18:30 стрижка", now()).unwrap();
        assert_eq!(result.resolved_at, Some(dt(16, 18, 30)));
        assert_eq!(result.goal_text(), Some("стрижка"));

        let result = fallback_resolve("завтра тренування", now()).unwrap();
        assert_eq!(result.resolved_at, Some(dt(15, 9, 0)));
        assert_eq!(result.suggestion_text.as_deref(), Some("завтра"));
    }

    #[test]
    fn words_containing_prepositions_do_not_match() {
        assert!(fallback_resolve("молоко 15 пачок", now()).is_none());
    }

    #[test]
    fn no_date_time_content_returns_none() {
        assert!(fallback_resolve("купити хліб", now()).is_none());
        assert!(fallback_resolve("", now()).is_none());
    }

    #[test]
    fn offsets_account_for_leading_whitespace() {
        let result = fallback_resolve("  через 5 хв", now()).unwrap();
        let entity = &result.date_time_entities[0];
        assert_eq!((entity.start, entity.end), (2, 12));
        assert!(result.goal_text().is_none());
    }

    #[test]
    fn offsets_stay_inside_text_when_lowercasing_changes_length() {
        // 'İ' lowercases to two chars.
        let text = "İİ через 5 хв";
        let result = fallback_resolve(text, now()).unwrap();
        let entity = &result.date_time_entities[0];
        assert_eq!((entity.start, entity.end), (3, 13));
        assert!(entity.end <= char_len(text));
        assert_eq!(entity.text, "через 5 хв");
        assert_eq!(result.suggestion_text.as_deref(), Some("через 5 хв"));
    }

    #[test]
    fn patterns_match_regardless_of_case() {
        let result = fallback_resolve("ЧЕРЕЗ 10 ХВИЛИН Зателефонувати", now()).unwrap();
        assert_eq!(result.resolved_at, Some(dt(14, 10, 10)));
        assert_eq!(result.suggestion_text.as_deref(), Some("через 10 хвилин"));
        assert_eq!(result.goal_text(), Some("зателефонувати"));
        assert_eq!(result.date_time_entities[0].text, "ЧЕРЕЗ 10 ХВИЛИН");

        let result = fallback_resolve("ПІСЛЯЗАВТРА стрижка", now()).unwrap();
        assert_eq!(result.resolved_at, Some(dt(16, 9, 0)));

        let result = fallback_resolve("Зарядка О 7", now()).unwrap();
        assert_eq!(result.resolved_at, Some(dt(15, 7, 0)));
        assert_eq!(result.goal_text(), Some("зарядка"));
    }
}
