//! `remind status`: configuration and labeler state.

use std::io::Write;

use anyhow::{Context, Result};

use super::util::start_labeler;
use crate::Config;

fn locator(value: &str) -> &str {
    if value.trim().is_empty() {
        "(not set)"
    } else {
        value
    }
}

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let state = runtime.block_on(async {
        let labeler = start_labeler(config).await?;
        anyhow::Ok(labeler.state())
    })?;

    writeln!(writer, "Reminder parser status")?;
    writeln!(writer, "Model:     {}", locator(&config.model))?;
    writeln!(writer, "Tokenizer: {}", locator(&config.tokenizer))?;
    writeln!(writer, "Labels:    {}", locator(&config.labels))?;
    writeln!(writer, "Cache:     {}", config.cache_dir.display())?;
    writeln!(writer, "Timeout:   {}s", config.inference_timeout_secs)?;
    writeln!(writer, "Labeler:   {state}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn status_without_assets() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            cache_dir: temp.path().join("ner_cache"),
            ..Config::default()
        };

        let mut output = Vec::new();
        run(&mut output, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&temp.path().display().to_string(), "[TEMP]");
        assert_snapshot!(output, @r"
        Reminder parser status
        Model:     (not set)
        Tokenizer: (not set)
        Labels:    (not set)
        Cache:     [TEMP]/ner_cache
        Timeout:   10s
        Labeler:   not initialized
        ");
    }
}
