//! `remind fallback`: pattern matching only.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;
use remind_core::{Clock, ReminderParseResult, fallback_resolve};

use super::util::{clock, write_result};

pub fn run<W: Write>(
    writer: &mut W,
    text: &str,
    json: bool,
    now: Option<NaiveDateTime>,
) -> Result<()> {
    let result = fallback_resolve(text, clock(now).now())
        .unwrap_or_else(|| ReminderParseResult::failure(text, "no fallback pattern matched"));
    write_result(writer, &result, json)
}
