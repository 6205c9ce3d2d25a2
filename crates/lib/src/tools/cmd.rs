//! External command execution.
//!
//! Commands inherit the parent's stdio so toolchain output streams to the
//! terminal as it is produced. Secret arguments are masked before logging.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use super::ToolError;

const MASK: &str = "***";

/// Run `program` with `args` in `cwd` and wait for it to exit.
///
/// Any argument equal to one of `secrets` is shown as `***` in logs and
/// error messages.
///
/// # Errors
///
/// - [`ToolError::Spawn`] if the program cannot be started
/// - [`ToolError::CommandFailed`] if it exits unsuccessfully
pub async fn run_command(program: &str, args: &[String], cwd: &Path, secrets: &[&str]) -> Result<(), ToolError> {
  let cmd_line = format_command(program, args, secrets);
  info!(cmd = %cmd_line, "executing command");
  debug!(working_dir = ?cwd, "spawning process");

  let status = Command::new(program)
    .args(args)
    .current_dir(cwd)
    .status()
    .await
    .map_err(|source| ToolError::Spawn {
      program: program.to_string(),
      source,
    })?;

  if !status.success() {
    return Err(ToolError::CommandFailed {
      cmd: cmd_line,
      code: status.code(),
    });
  }

  debug!(cmd = %cmd_line, "command succeeded");
  Ok(())
}

/// Render a command line for logs, masking secret arguments.
pub fn format_command(program: &str, args: &[String], secrets: &[&str]) -> String {
  let mut parts = Vec::with_capacity(args.len() + 1);
  parts.push(program);
  for arg in args {
    if secrets.iter().any(|s| !s.is_empty() && s == arg) {
      parts.push(MASK);
    } else {
      parts.push(arg);
    }
  }
  parts.join(" ")
}
