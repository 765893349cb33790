//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Sitepack post-build asset inliner CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: sitepack.toml)
    #[arg(short = 'C', long, default_value = "sitepack.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Inline assets into the HTML documents of a build output directory
    #[command(visible_alias = "p")]
    Pack {
        /// Build output directory (overrides [pack].output from config)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        output: Option<PathBuf>,

        /// Keep the original asset files after inlining
        #[arg(long)]
        keep_assets: bool,

        /// Keep directories left empty by asset deletion
        #[arg(long)]
        keep_empty_dirs: bool,
    },
}
