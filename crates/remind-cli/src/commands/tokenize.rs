//! `remind tokenize`: show the labeler input encoding.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use remind_core::{EncodingResult, Tokenizer, Vocabulary};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TokenRow<'a> {
    index: usize,
    token: &'a str,
    id: i64,
    start: usize,
    end: usize,
}

/// Non-padding positions of an encoding.
fn rows(encoding: &EncodingResult) -> Vec<TokenRow<'_>> {
    encoding
        .tokens
        .iter()
        .zip(&encoding.ids)
        .zip(&encoding.attention_mask)
        .zip(&encoding.char_spans)
        .enumerate()
        .filter(|(_, (((_, _), mask), _))| **mask == 1)
        .map(|(index, (((token, id), _), (start, end)))| TokenRow {
            index,
            token,
            id: *id,
            start: *start,
            end: *end,
        })
        .collect()
}

/// Renders the rows as an aligned table.
fn format_table(rows: &[TokenRow<'_>], length: usize) -> String {
    let width = rows
        .iter()
        .map(|row| row.token.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        let pad = width - row.token.chars().count();
        let _ = writeln!(
            out,
            "{:<3} {}{}  {:>6}  {}..{}",
            row.index,
            row.token,
            " ".repeat(pad),
            row.id,
            row.start,
            row.end
        );
    }
    let _ = write!(out, "{} tokens, padded to {length}", rows.len());
    out
}

pub fn run<W: Write>(
    writer: &mut W,
    text: &str,
    vocab_path: &Path,
    max_length: usize,
    json: bool,
) -> Result<()> {
    let raw = std::fs::read_to_string(vocab_path)
        .with_context(|| format!("failed to read {}", vocab_path.display()))?;
    let vocab = Vocabulary::from_json(&raw)
        .with_context(|| format!("invalid vocabulary in {}", vocab_path.display()))?;

    let encoding = Tokenizer::new(vocab).with_max_length(max_length).encode(text);
    let rows = rows(&encoding);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
    } else {
        writeln!(writer, "{}", format_table(&rows, encoding.len()))?;
    }
    Ok(())
}
