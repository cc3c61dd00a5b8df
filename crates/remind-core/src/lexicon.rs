//! Ukrainian date/time vocabulary.

use chrono::Weekday;

/// Number words (one to ten, common inflections) and their values.
pub const NUMBER_WORDS: &[(&str, u32)] = &[
    ("одна", 1),
    ("одну", 1),
    ("однією", 1),
    ("один", 1),
    ("два", 2),
    ("дві", 2),
    ("двох", 2),
    ("двома", 2),
    ("три", 3),
    ("трьох", 3),
    ("чотири", 4),
    ("чотирьох", 4),
    ("п'ять", 5),
    ("пять", 5),
    ("п'яти", 5),
    ("шість", 6),
    ("шести", 6),
    ("сім", 7),
    ("семи", 7),
    ("вісім", 8),
    ("восьми", 8),
    ("дев'ять", 9),
    ("девять", 9),
    ("дев'яти", 9),
    ("десять", 10),
    ("десяти", 10),
];

/// Words that introduce a duration ("in", "through").
pub const DURATION_PREPOSITIONS: &[&str] = &["через", "за"];

/// Unit word forms accepted after a duration number, longest first so
/// regex alternation prefers the full form.
pub const DURATION_UNIT_FORMS: &[&str] = &[
    "хвилину", "хвилини", "хвилин", "годину", "години", "годин", "тиждень", "тижнів", "тижні",
    "місяців", "місяць", "місяці", "років", "роки", "року", "рік", "днів", "день", "дні", "хв",
    "год", "дн",
];

/// Relative day words and their offset from today, longest first.
pub const RELATIVE_DAYS: &[(&str, i64)] = &[("післязавтра", 2), ("сьогодні", 0), ("завтра", 1)];

/// Weekday stems. `понеділок` must be tested before `неділ` since it
/// contains it.
pub const WEEKDAY_STEMS: &[(&str, Weekday)] = &[
    ("понеділ", Weekday::Mon),
    ("вівтор", Weekday::Tue),
    ("серед", Weekday::Wed),
    ("четвер", Weekday::Thu),
    ("п'ятниц", Weekday::Fri),
    ("пятниц", Weekday::Fri),
    ("субот", Weekday::Sat),
    ("неділ", Weekday::Sun),
];

/// Named times of day and the hour they stand for.
pub const TIMES_OF_DAY: &[(&str, u32)] = &[
    ("ранку", 9),
    ("вранці", 9),
    ("вдень", 14),
    ("обід", 14),
    ("вечора", 19),
    ("ввечері", 19),
    ("ночі", 22),
    ("вночі", 22),
];

/// Words that move a bare hour below 12 into the afternoon.
pub const AFTERNOON_MARKERS: &[&str] = &["вдень", "дня", "вечора", "ввечері"];

/// Looks up a number word.
pub fn number_word(word: &str) -> Option<u32> {
    NUMBER_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, n)| *n)
}

/// Regex alternation of all number words.
pub fn number_word_alternation() -> String {
    NUMBER_WORDS
        .iter()
        .map(|(w, _)| *w)
        .collect::<Vec<_>>()
        .join("|")
}

/// Calendar unit of a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl DurationUnit {
    /// Classifies a unit word by prefix.
    ///
    /// Weeks are tested before days because `тиждень` contains `день`.
    pub fn from_word(word: &str) -> Option<Self> {
        let word = word.trim();
        if word.starts_with("хв") {
            Some(Self::Minutes)
        } else if word.starts_with("год") {
            Some(Self::Hours)
        } else if word.starts_with("тиж") {
            Some(Self::Weeks)
        } else if word.starts_with("дн") || word.starts_with("день") || word == "доба" {
            Some(Self::Days)
        } else if word.starts_with("місяц") {
            Some(Self::Months)
        } else if word.starts_with("рок") || word.starts_with("рік") {
            Some(Self::Years)
        } else {
            None
        }
    }

    /// Finds the first unit word inside a phrase.
    pub fn find_in(phrase: &str) -> Option<Self> {
        phrase.split_whitespace().find_map(Self::from_word)
    }
}
