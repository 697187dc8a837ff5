use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "zeno",
    version,
    about = "Hot-reload supervisor for compiled application binaries"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Use a specific config file instead of discovering zeno.yml
    #[arg(long = "config", global = true)]
    pub config_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the application, run it, and hot-reload on changes
    Run,
    /// Generate a starter zeno.yml
    Init,
}
