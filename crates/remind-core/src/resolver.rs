//! Entity-to-datetime resolution.
//!
//! Folds DATE/TIME/DURATION entities, in ascending `start` order, over an
//! immutable [`ResolutionState`] seeded with "now". Each recognized entity
//! produces a new state; unrecognized ones leave it unchanged. A post-loop
//! policy then fills in defaults:
//!
//! - date only: time of day becomes 09:00:00
//! - time only: rolls to tomorrow if the clock time already passed
//! - neither: no timestamp

use std::sync::LazyLock;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;

use crate::entity::{DateTimeEntity, Entity, EntityKind};
use crate::lexicon::{
    AFTERNOON_MARKERS, DURATION_PREPOSITIONS, DURATION_UNIT_FORMS, DurationUnit, RELATIVE_DAYS,
    TIMES_OF_DAY, WEEKDAY_STEMS, number_word, number_word_alternation,
};
use crate::offset::{byte_to_char, char_len, char_to_byte, slice_chars};
use crate::result::ReminderParseResult;

/// Hour used when only a date was given.
pub const DEFAULT_HOUR: u32 = 9;

/// A full duration phrase: preposition, number, unit.
pub(crate) static DURATION_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:{})\s*(\d+|{})\s*({})\b",
        DURATION_PREPOSITIONS.join("|"),
        number_word_alternation(),
        DURATION_UNIT_FORMS.join("|"),
    ))
    .unwrap()
});

static NEXT_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([\p{L}']+)").unwrap());

static DAY_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[./](\d{1,2})\b").unwrap());

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s*[:.]\s*(\d{2})").unwrap());

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Accumulated resolution state. Each step returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionState {
    pub at: NaiveDateTime,
    pub date_set: bool,
    pub time_set: bool,
}

impl ResolutionState {
    pub const fn new(now: NaiveDateTime) -> Self {
        Self {
            at: now,
            date_set: false,
            time_set: false,
        }
    }

    /// Applies one entity. Returns `None` when the entity is not a
    /// recognizable date, time, or duration.
    pub fn apply(self, entity: &Entity, now: NaiveDateTime) -> Option<Self> {
        let text = entity.text.to_lowercase();
        match entity.kind() {
            EntityKind::Date => parse_date(&text, self.at, now).map(|at| Self {
                at,
                date_set: true,
                ..self
            }),
            EntityKind::Time => parse_time(&text, self.at).map(|at| Self {
                at,
                time_set: true,
                ..self
            }),
            EntityKind::Duration => parse_duration(&text, self.at).map(|at| Self {
                at,
                date_set: true,
                time_set: true,
            }),
            EntityKind::Goal | EntityKind::Other(_) => None,
        }
    }

    /// Applies the default-time and day-rollover policy.
    pub fn finish(self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match (self.date_set, self.time_set) {
            (false, false) => None,
            (true, false) => at_time(self.at.date(), DEFAULT_HOUR, 0),
            (false, true) if self.at < now => Some(self.at + Duration::days(1)),
            _ => Some(self.at),
        }
    }
}

/// Output of [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub resolved_at: Option<NaiveDateTime>,
    /// Texts of all entities ordered by `start`, space-joined.
    pub suggestion_text: Option<String>,
    /// Entities that contributed to the timestamp.
    pub date_time_entities: Vec<DateTimeEntity>,
    /// Entities that did not contribute, plus a `GOAL` entity when a
    /// timestamp resolved and task text remains.
    pub other_entities: Vec<Entity>,
}

impl Resolution {
    pub fn into_result(self, original_text: &str) -> ReminderParseResult {
        let success = self.resolved_at.is_some();
        ReminderParseResult {
            original_text: original_text.to_string(),
            date_time_entities: self.date_time_entities,
            other_entities: self.other_entities,
            success,
            resolved_at: self.resolved_at,
            suggestion_text: self.suggestion_text,
            error_message: (!success).then(|| "no valid date/time found".to_string()),
        }
    }
}

/// Resolves labeled entities against `now`.
pub fn resolve(original_text: &str, entities: &[Entity], now: NaiveDateTime) -> Resolution {
    let mut ordered = expand_duration_entities(original_text, entities);
    ordered.sort_by_key(|entity| entity.start);

    let mut state = ResolutionState::new(now);
    let mut contributing = Vec::new();
    let mut other_entities = Vec::new();
    for entity in &ordered {
        if let Some(next) = state.apply(entity, now) {
            state = next;
            contributing.push(entity.clone());
        } else {
            tracing::debug!(label = %entity.label, text = %entity.text, "entity not resolved");
            other_entities.push(entity.clone());
        }
    }

    let resolved_at = state.finish(now);
    tracing::debug!(?state, ?resolved_at, "resolved entities");

    let suggestion = ordered
        .iter()
        .map(|entity| entity.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    if resolved_at.is_some() {
        let goal = extract_goal_text(original_text, &contributing);
        if !goal.is_empty() {
            other_entities.push(Entity::new("GOAL", 0, char_len(&goal), goal));
        }
    }

    Resolution {
        resolved_at,
        suggestion_text: (!suggestion.trim().is_empty()).then_some(suggestion),
        date_time_entities: contributing
            .iter()
            .map(|entity| DateTimeEntity::from_entity(entity, DateTimeEntity::LABELER_CONFIDENCE))
            .collect(),
        other_entities,
    }
}

/// Widens DURATION entities that cover only part of a duration phrase.
///
/// A labeler often tags just the number ("10") or the preposition and
/// number ("через 10"). If a full phrase overlaps the entity it replaces
/// the entity; otherwise a unit word right after the entity is absorbed.
pub fn expand_duration_entities(original_text: &str, entities: &[Entity]) -> Vec<Entity> {
    entities
        .iter()
        .map(|entity| {
            if entity.kind() == EntityKind::Duration {
                expand_duration_entity(original_text, entity)
            } else {
                entity.clone()
            }
        })
        .collect()
}

fn expand_duration_entity(original_text: &str, entity: &Entity) -> Entity {
    for found in DURATION_PHRASE_RE.find_iter(original_text) {
        let start = byte_to_char(original_text, found.start());
        let end = byte_to_char(original_text, found.end());
        if entity.start < end && entity.end > start {
            tracing::debug!(from = %entity.text, to = found.as_str(), "expanded duration phrase");
            return Entity::new(
                entity.label.clone(),
                start,
                end,
                slice_chars(original_text, start, end),
            );
        }
    }

    let tail = &original_text[char_to_byte(original_text, entity.end)..];
    let unit_word = NEXT_WORD_RE
        .captures(tail)
        .filter(|caps| DurationUnit::from_word(&caps[1].to_lowercase()).is_some());
    if let Some(caps) = unit_word {
        let end = entity.end + char_len(&tail[..caps.get(0).map_or(0, |m| m.end())]);
        tracing::debug!(text = %entity.text, unit = &caps[1], "extended duration with unit");
        return Entity::new(
            entity.label.clone(),
            entity.start,
            end,
            slice_chars(original_text, entity.start, end),
        );
    }

    entity.clone()
}

/// The original text with contributing spans removed and whitespace
/// collapsed.
fn extract_goal_text(original_text: &str, contributing: &[Entity]) -> String {
    let mut spans: Vec<(usize, usize)> = contributing.iter().map(|e| (e.start, e.end)).collect();
    spans.sort_unstable();

    let mut kept = String::new();
    let mut last_end = 0;
    for (start, end) in spans {
        if start > last_end {
            kept.push_str(slice_chars(original_text, last_end, start));
            kept.push(' ');
        }
        last_end = last_end.max(end);
    }
    kept.push_str(slice_chars(original_text, last_end, usize::MAX));

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn at_time(date: NaiveDate, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    NaiveTime::from_hms_opt(hour, minute, 0).map(|time| date.and_time(time))
}

fn parse_date(text: &str, at: NaiveDateTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if let Some((_, days)) = RELATIVE_DAYS.iter().find(|(word, _)| text.contains(word)) {
        return Some(at + Duration::days(*days));
    }

    if let Some((_, weekday)) = WEEKDAY_STEMS.iter().find(|(stem, _)| text.contains(stem)) {
        return Some(at + Duration::days(days_until(at.weekday(), *weekday)));
    }

    let caps = DAY_MONTH_RE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let candidate = NaiveDate::from_ymd_opt(at.year(), month, day)?.and_time(at.time());
    if candidate < now {
        return Some(NaiveDate::from_ymd_opt(at.year() + 1, month, day)?.and_time(at.time()));
    }
    Some(candidate)
}

/// Days from `from` to the next `target`, always in 1..=7.
fn days_until(from: Weekday, target: Weekday) -> i64 {
    let diff = i64::from(target.num_days_from_monday()) - i64::from(from.num_days_from_monday());
    if diff <= 0 { diff + 7 } else { diff }
}

fn parse_time(text: &str, at: NaiveDateTime) -> Option<NaiveDateTime> {
    if let Some((hour, minute)) = parse_clock(text) {
        let afternoon = hour < 12 && AFTERNOON_MARKERS.iter().any(|marker| text.contains(marker));
        let hour = if afternoon { hour + 12 } else { hour };
        return at_time(at.date(), hour, minute);
    }

    let (_, hour) = TIMES_OF_DAY.iter().find(|(word, _)| text.contains(word))?;
    at_time(at.date(), *hour, 0)
}

/// Reads `HH:MM`, `HH.MM`, `HHMM`, `HH` or three digits. Three digits
/// split after the first two (`130` is 13:00) unless that is not a valid
/// time, then after the first (`930` is 9:30). Out-of-range values yield
/// `None`.
fn parse_clock(text: &str) -> Option<(u32, u32)> {
    let (hour, minute): (u32, u32) = if let Some(caps) = CLOCK_RE.captures(text) {
        (caps[1].parse().ok()?, caps[2].parse().ok()?)
    } else {
        let digits = DIGITS_RE.find(text)?.as_str();
        match digits.len() {
            1 | 2 => (digits.parse().ok()?, 0),
            3 => {
                let (hour, minute): (u32, u32) =
                    (digits[..2].parse().ok()?, digits[2..].parse().ok()?);
                if hour < 24 && minute < 60 {
                    (hour, minute)
                } else {
                    (digits[..1].parse().ok()?, digits[1..].parse().ok()?)
                }
            }
            4 => (digits[..2].parse().ok()?, digits[2..].parse().ok()?),
            _ => return None,
        }
    };
    (hour < 24 && minute < 60).then_some((hour, minute))
}

fn parse_duration(text: &str, at: NaiveDateTime) -> Option<NaiveDateTime> {
    let body = text
        .split_whitespace()
        .skip_while(|word| DURATION_PREPOSITIONS.contains(word))
        .collect::<Vec<_>>()
        .join(" ");

    let amount = DIGITS_RE
        .find(&body)
        .and_then(|digits| digits.as_str().parse().ok())
        .or_else(|| body.split_whitespace().find_map(number_word));
    let Some(amount) = amount else {
        tracing::debug!(text, "no number in duration");
        return None;
    };

    let Some(unit) = DurationUnit::find_in(&body) else {
        tracing::debug!(text, "no unit in duration");
        return None;
    };

    add_duration(at, amount, unit)
}

/// Adds `amount` of `unit` to `at`. `None` on calendar overflow.
pub(crate) fn add_duration(
    at: NaiveDateTime,
    amount: u32,
    unit: DurationUnit,
) -> Option<NaiveDateTime> {
    let amount_i = i64::from(amount);
    match unit {
        DurationUnit::Minutes => at.checked_add_signed(Duration::try_minutes(amount_i)?),
        DurationUnit::Hours => at.checked_add_signed(Duration::try_hours(amount_i)?),
        DurationUnit::Days => at.checked_add_signed(Duration::try_days(amount_i)?),
        DurationUnit::Weeks => at.checked_add_signed(Duration::try_weeks(amount_i)?),
        DurationUnit::Months => at.checked_add_months(Months::new(amount)),
        DurationUnit::Years => at.checked_add_months(Months::new(amount.checked_mul(12)?)),
    }
}
