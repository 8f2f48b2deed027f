//! lxpanel CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use lxpanel::cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Replies go to stdout, logs to stderr
    let level = if cli.debug { "lxpanel=debug" } else { "lxpanel=info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    cli.execute().await
}
