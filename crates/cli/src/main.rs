mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bake_lib::consts::DEFAULT_GOAL;
use bake_lib::params::Configuration;

use crate::cmd::RunOptions;
use crate::output::OutputFormat;

/// bake - build, test, package and publish a .NET library
#[derive(Parser)]
#[command(name = "bake")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Target to run, with its dependencies
  #[arg(default_value = DEFAULT_GOAL)]
  goal: String,

  /// Build configuration (Debug or Release); defaults to Release on CI
  #[arg(short, long)]
  configuration: Option<Configuration>,

  /// Repository root containing the changelog and sources
  #[arg(long, default_value = ".")]
  root: PathBuf,

  /// Changelog to read the version from, relative to the root
  #[arg(long)]
  changelog: Option<PathBuf>,

  /// Print the execution order without running anything
  #[arg(long, conflicts_with = "list")]
  plan: bool,

  /// List the available targets
  #[arg(long)]
  list: bool,

  /// Output format for --list and --plan
  #[arg(long, value_enum, default_value_t)]
  format: OutputFormat,

  /// Enable debug logging
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .compact()
    .init();

  if cli.list {
    return cmd::cmd_list(cli.format);
  }
  if cli.plan {
    return cmd::cmd_plan(&cli.goal, cli.format);
  }

  cmd::cmd_run(
    &cli.goal,
    RunOptions {
      root: cli.root,
      changelog: cli.changelog,
      configuration: cli.configuration,
    },
  )
}
