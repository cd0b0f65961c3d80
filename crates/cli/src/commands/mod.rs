//! CLI subcommands.

pub mod dates;
pub mod function;

use std::io::Write;

use dutchned_backend::config::ConfigError;
use dutchned_backend::dutchned::DutchNedError;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input was not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Environment configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// DutchNed API call failed.
    #[error("DutchNed error: {0}")]
    DutchNed(#[from] DutchNedError),

    /// A date argument is not `YYYY-MM-DD`.
    #[error("Invalid date: {0}. Expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Write `value` to stdout as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
