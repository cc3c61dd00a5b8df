use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use remind_cli::commands::{fallback, parse, resolve, status, tokenize};
use remind_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // stdout carries command output.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Some(Commands::Parse {
            text,
            json,
            timeout,
        }) => {
            let args = parse::ParseArgs {
                text,
                json: *json,
                timeout: *timeout,
                now: cli.now,
            };
            parse::run(&mut stdout, &config, &args)?;
        }
        Some(Commands::Fallback { text, json }) => {
            fallback::run(&mut stdout, text, *json, cli.now)?;
        }
        Some(Commands::Resolve {
            text,
            entities,
            json,
        }) => {
            resolve::run(&mut stdout, text, entities, *json, cli.now)?;
        }
        Some(Commands::Tokenize {
            text,
            vocab,
            max_length,
            json,
        }) => {
            let max_length = max_length.unwrap_or(config.max_length);
            tokenize::run(&mut stdout, text, vocab, max_length, *json)?;
        }
        Some(Commands::Status) => {
            status::run(&mut stdout, &config)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
