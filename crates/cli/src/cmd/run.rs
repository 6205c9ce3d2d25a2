//! Implementation of `bake [GOAL]`.
//!
//! Initializes the build parameters, then runs the goal and its dependencies
//! through the standard targets using the real toolchain.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::debug;

use bake_lib::execute::ExecutionEngine;
use bake_lib::init::{InitOptions, initialize};
use bake_lib::params::{CiContext, Configuration};
use bake_lib::pipeline::{BuildContext, Credentials, standard_targets};
use bake_lib::settings::Layout;
use bake_lib::tools::ProcessTools;

use crate::output::{format_duration, print_error, print_stat, print_success};

pub struct RunOptions {
  pub root: PathBuf,
  pub changelog: Option<PathBuf>,
  pub configuration: Option<Configuration>,
}

/// Execute the run command.
///
/// Prints each executed target with its duration. A failing target is
/// reported on stderr and makes the command fail.
pub fn cmd_run(goal: &str, options: RunOptions) -> Result<()> {
  let root = options
    .root
    .canonicalize()
    .with_context(|| format!("Failed to resolve root directory: {}", options.root.display()))?;

  let mut layout = Layout::load(&root).context("Failed to load settings")?;
  if let Some(changelog) = options.changelog {
    layout = layout.with_changelog(changelog);
  }

  let ci = CiContext::from_env().context("Failed to detect CI context")?;
  let params = initialize(
    &layout,
    InitOptions {
      configuration: options.configuration,
      ci,
    },
  )
  .context("Initialization failed")?;

  let graph = standard_targets().context("Failed to declare targets")?;
  let tools = ProcessTools::new(&layout.root).context("Failed to start toolchain runner")?;
  debug!(root = %layout.root.display(), "toolchain ready");

  let version = params.version.clone();
  let configuration = params.configuration;
  let ctx = BuildContext {
    params,
    layout,
    tools: Box::new(tools),
    credentials: Credentials::from_env(),
  };

  let mut engine = ExecutionEngine::new();
  let result = engine
    .run(&graph, goal, &ctx, |name, err| {
      print_error(&format!("Target {} failed: {}", name, err));
    })
    .with_context(|| format!("Failed to resolve goal '{}'", goal))?;

  for target in &result.executed {
    print_success(&format!("{} ({})", target.name, format_duration(target.elapsed)));
  }

  if let Some(failure) = &result.failed {
    bail!(
      "target '{}' failed after {}",
      failure.name,
      format_duration(failure.elapsed)
    );
  }

  println!();
  print_stat("Version", &version);
  print_stat("Configuration", configuration.as_str());
  print_stat("Targets", &result.executed.len().to_string());
  print_stat("Elapsed", &format_duration(result.elapsed()));

  Ok(())
}
