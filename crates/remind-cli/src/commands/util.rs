//! Shared utilities for CLI commands.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use remind_core::{Clock, FixedClock, ReminderParseResult, SystemClock};
use remind_ner::{AssetFetcher, NerManager, default_backend};

use crate::Config;

/// Freezes "now" for the whole command, honoring `--now`.
pub fn clock(now: Option<NaiveDateTime>) -> FixedClock {
    FixedClock(now.unwrap_or_else(|| SystemClock.now()))
}

/// Writes a parse result as text or pretty JSON.
pub fn write_result<W: Write>(
    writer: &mut W,
    result: &ReminderParseResult,
    json: bool,
) -> Result<()> {
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(result)?)?;
    } else {
        writeln!(writer, "{}", result.to_string().trim_end())?;
    }
    Ok(())
}

/// Starts a labeler for the configured assets and waits for it to settle.
///
/// Built with the `onnx` feature, complete assets load into ONNX Runtime.
/// Without it they end in an error state and parsing goes through the
/// fallback.
pub async fn start_labeler(config: &Config) -> Result<NerManager> {
    let fetcher = AssetFetcher::new(&config.cache_dir).context("failed to set up asset cache")?;
    let manager = NerManager::spawn_with_max_length(default_backend(), fetcher, config.max_length);
    manager
        .configure(config.assets())
        .await
        .context("failed to configure labeler")?;
    let state = manager.settled().await;
    tracing::debug!(%state, "labeler settled");
    Ok(manager)
}
