mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mvb_lib::consts::CONFIG_FILE_NAME;

use crate::output::OutputFormat;

/// mvb - build one source tree for several target language levels
#[derive(Parser)]
#[command(name = "mvb")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the project configuration
  #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
  config: PathBuf,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Merge patches and compile every target version
  Build,

  /// Build, then upload the artifacts to the snapshot or release repository
  Publish,

  /// Show what a build would do without running it
  Plan,

  /// Remove variants, artifacts and the build report
  Clean {
    /// Show what would be removed without deleting anything
    #[arg(long)]
    dry_run: bool,
  },

  /// Show project coordinates, publish channel and the last build
  Info,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "info" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build => cmd::cmd_build(&cli.config, cli.output),
    Commands::Publish => cmd::cmd_publish(&cli.config, cli.output),
    Commands::Plan => cmd::cmd_plan(&cli.config, cli.output),
    Commands::Clean { dry_run } => cmd::cmd_clean(&cli.config, dry_run, cli.output),
    Commands::Info => cmd::cmd_info(&cli.config, cli.output),
  }
}
