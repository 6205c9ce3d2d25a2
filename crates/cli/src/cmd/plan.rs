//! Implementation of `bake --plan`.
//!
//! Resolves the goal against the standard targets and prints the order the
//! targets would run in. Nothing is initialized or executed, so the plan is
//! available without a changelog or toolchain.

use anyhow::{Context, Result};

use bake_lib::execute::ExecutionEngine;
use bake_lib::pipeline::standard_targets;

use crate::output::{OutputFormat, print_info, print_json};

pub fn cmd_plan(goal: &str, format: OutputFormat) -> Result<()> {
  let graph = standard_targets().context("Failed to declare targets")?;
  let order = ExecutionEngine::new()
    .plan(&graph, goal)
    .with_context(|| format!("Failed to resolve goal '{}'", goal))?;

  let names: Vec<&str> = order.iter().map(|t| t.name()).collect();

  if format.is_json() {
    return print_json(&serde_json::json!({ "goal": goal, "targets": names }));
  }

  print_info(&format!("Plan for {}: {} target(s)", goal, names.len()));
  for (i, name) in names.iter().enumerate() {
    println!("  {}. {}", i + 1, name);
  }

  Ok(())
}
