//! CLI subcommand implementations.

pub mod fallback;
pub mod parse;
pub mod resolve;
pub mod status;
pub mod tokenize;
pub mod util;
