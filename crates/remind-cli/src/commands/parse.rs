//! `remind parse`: labeler with pattern fallback.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use remind_ner::ReminderParser;

use super::util::{clock, start_labeler, write_result};
use crate::Config;

pub struct ParseArgs<'a> {
    pub text: &'a str,
    pub json: bool,
    pub timeout: Option<u64>,
    pub now: Option<NaiveDateTime>,
}

pub fn run<W: Write>(writer: &mut W, config: &Config, args: &ParseArgs<'_>) -> Result<()> {
    let timeout = args
        .timeout
        .map_or_else(|| config.inference_timeout(), Duration::from_secs);

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let result = runtime.block_on(async {
        let labeler = start_labeler(config).await?;
        let parser = ReminderParser::new(labeler)
            .with_clock(clock(args.now))
            .with_timeout(timeout);
        anyhow::Ok(parser.parse(args.text).await)
    })?;

    write_result(writer, &result, args.json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cache: &std::path::Path) -> Config {
        Config {
            cache_dir: cache.join("ner_cache"),
            ..Config::default()
        }
    }

    #[test]
    fn parse_without_model_uses_fallback() {
        let temp = tempfile::tempdir().unwrap();
        let args = ParseArgs {
            text: "нагадай через 10 хвилин",
            json: false,
            timeout: None,
            now: NaiveDateTime::parse_from_str("2025-03-14 10:00", "%Y-%m-%d %H:%M").ok(),
        };

        let mut output = Vec::new();
        run(&mut output, &config(temp.path()), &args).unwrap();

        insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r#"
        Remind at: 2025-03-14 10:10:00
        Detected:  через 10 хвилин
        Task:      нагадай
        - DURATION [8..23] "через 10 хвилин" (0.8)
        "#);
    }

    #[test]
    fn parse_with_unloadable_model_still_falls_back() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["m.onnx", "t.json", "l.json"] {
            std::fs::write(temp.path().join(name), "{}").unwrap();
        }
        let config = Config {
            model: temp.path().join("m.onnx").display().to_string(),
            tokenizer: temp.path().join("t.json").display().to_string(),
            labels: temp.path().join("l.json").display().to_string(),
            ..config(temp.path())
        };
        let args = ParseArgs {
            text: "купити молоко",
            json: true,
            timeout: Some(1),
            now: None,
        };

        let mut output = Vec::new();
        run(&mut output, &config, &args).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(
            value["error_message"],
            "labeler not ready and fallback failed"
        );
    }
}
