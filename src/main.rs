//! Sitepack - collapse a static site build into self-contained HTML.

mod bundle;
mod cli;
mod compact;
mod config;
mod inline;
mod logger;
mod markup;
mod pack;
mod scan;
mod step;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PackConfig;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    logger::set_verbose(cli.verbose);

    let config = Arc::new(PackConfig::load(cli)?);

    match &cli.command {
        Commands::Pack { .. } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(pack::run(config))
        }
    }
}
