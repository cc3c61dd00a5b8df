//! `remind resolve`: resolve externally labeled entities.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use remind_core::{Clock, entities_from_json, resolve};

use super::util::{clock, write_result};

pub fn run<W: Write>(
    writer: &mut W,
    text: &str,
    entities_path: &Path,
    json: bool,
    now: Option<NaiveDateTime>,
) -> Result<()> {
    let raw = std::fs::read_to_string(entities_path)
        .with_context(|| format!("failed to read {}", entities_path.display()))?;
    let entities = entities_from_json(&raw)
        .with_context(|| format!("invalid entity list in {}", entities_path.display()))?;
    tracing::debug!(count = entities.len(), "loaded entities");

    let result = resolve(text, &entities, clock(now).now()).into_result(text);
    write_result(writer, &result, json)
}
