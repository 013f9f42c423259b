//! PAYUNi trade command-line front end.
//!
//! Wraps the `payuni-trade` library for operators: seal and open envelopes
//! by hand, run trades, check callback bodies and list the mode registry.

mod cli;
mod commands;
mod observability;

use std::process::ExitCode;

use clap::Parser;

use crate::{
    cli::Cli,
    observability::{LogFormat, init_observability},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_observability(cli.log_format.unwrap_or_else(LogFormat::from_env), cli.verbose);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "payuni-trade starting");

    match commands::run(cli.command, cli.config.as_deref()).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
