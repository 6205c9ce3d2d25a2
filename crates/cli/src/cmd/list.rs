//! Implementation of `bake --list`.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use bake_lib::consts::DEFAULT_GOAL;
use bake_lib::pipeline::standard_targets;

use crate::output::{OutputFormat, print_json, symbols};

#[derive(Serialize)]
struct TargetEntry<'a> {
  name: &'a str,
  description: Option<&'a str>,
  depends_on: &'a [String],
  has_action: bool,
  default: bool,
}

/// Print every declared target in declaration order.
pub fn cmd_list(format: OutputFormat) -> Result<()> {
  let graph = standard_targets().context("Failed to declare targets")?;

  let entries: Vec<TargetEntry> = graph
    .targets()
    .iter()
    .map(|t| TargetEntry {
      name: t.name(),
      description: t.description(),
      depends_on: t.depends_on(),
      has_action: t.has_action(),
      default: t.name() == DEFAULT_GOAL,
    })
    .collect();

  if format.is_json() {
    return print_json(&entries);
  }

  let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
  println!("Targets:");
  for entry in &entries {
    let marker = if entry.default { " (default)" } else { "" };
    let mut line = format!(
      "  {} {:<width$}  {}{}",
      symbols::INFO,
      entry.name,
      entry.description.unwrap_or(""),
      marker
    );
    if !entry.depends_on.is_empty() {
      line.push_str(&format!(
        " {}",
        format!("{} {}", symbols::ARROW, entry.depends_on.join(", ")).if_supports_color(Stream::Stdout, |s| s.dimmed())
      ));
    }
    println!("{}", line.trim_end());
  }

  Ok(())
}
