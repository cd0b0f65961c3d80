//! DutchNed CLI - Operator tools for the delivery add-on.
//!
//! # Usage
//!
//! ```bash
//! # Run the shipping-method function over a sandbox input
//! dutchned-cli function shipping-method < input.json
//!
//! # Fetch delivery dates from the DutchNed API
//! dutchned-cli dates fetch --postal-code 1012AB --country NL
//!
//! # Format a saved upstream payload
//! dutchned-cli dates format --input upstream.json
//!
//! # Compute the picker's disabled dates
//! dutchned-cli dates disabled 2024-05-01 2024-05-03
//! ```
//!
//! # Commands
//!
//! - `function shipping-method` - Run the shipping-method selector
//! - `dates fetch` - Fetch and format upstream delivery dates
//! - `dates format` - Format a raw upstream payload
//! - `dates disabled` - Disabled dates for a set of available dates

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dutchned-cli")]
#[command(author, version, about = "DutchNed delivery add-on tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run checkout functions locally
    Function {
        #[command(subcommand)]
        function: FunctionName,
    },
    /// Work with delivery dates
    Dates {
        #[command(subcommand)]
        action: DatesAction,
    },
}

#[derive(Subcommand)]
enum FunctionName {
    /// Shipping-method selector (JSON in, operations out)
    ShippingMethod {
        /// Read the input from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum DatesAction {
    /// Fetch available dates from the DutchNed API
    Fetch {
        /// Postal code to check
        #[arg(short, long)]
        postal_code: Option<String>,

        /// Country code, e.g. NL
        #[arg(short, long)]
        country: Option<String>,
    },
    /// Format a raw upstream payload
    Format {
        /// Read the payload from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Disabled dates for the given available dates (YYYY-MM-DD)
    Disabled {
        #[arg(required = true)]
        dates: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dutchned_cli=info,dutchned_backend=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Function { function } => match function {
            FunctionName::ShippingMethod { input } => {
                commands::function::shipping_method(input.as_deref())?;
            }
        },
        Commands::Dates { action } => match action {
            DatesAction::Fetch {
                postal_code,
                country,
            } => {
                commands::dates::fetch(postal_code.as_deref(), country.as_deref()).await?;
            }
            DatesAction::Format { input } => commands::dates::format(input.as_deref())?,
            DatesAction::Disabled { dates } => commands::dates::disabled(&dates)?,
        },
    }
    Ok(())
}
