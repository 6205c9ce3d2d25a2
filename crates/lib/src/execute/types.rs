//! Types for target execution.
//!
//! This module defines the error types and the result of a run.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::target::GraphError;
use crate::tools::ToolError;

/// Fatal configuration errors; no target runs when one is returned.
#[derive(Debug, Error)]
pub enum ExecuteError {
  #[error(transparent)]
  Graph(#[from] GraphError),
}

/// Failure raised by a target action.
#[derive(Debug, Error)]
pub enum ActionError {
  /// An external tool invocation failed.
  #[error(transparent)]
  Tool(#[from] ToolError),

  /// A credential required by a publishing target is absent.
  #[error("missing credential: {name} is not set")]
  MissingCredential { name: &'static str },

  /// A file operation failed.
  #[error("{action} {}: {source}", path.display())]
  Io {
    action: &'static str,
    path: PathBuf,
    source: std::io::Error,
  },

  /// Any other failure, described by a message.
  #[error("{0}")]
  Failed(String),
}

impl ActionError {
  pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    ActionError::Io {
      action,
      path: path.into(),
      source,
    }
  }
}

/// A target that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedTarget {
  pub name: String,
  pub elapsed: Duration,
}

/// The target that stopped the run.
#[derive(Debug)]
pub struct TargetFailure {
  pub name: String,
  pub error: ActionError,
  pub elapsed: Duration,
}

/// Result of running a goal.
#[derive(Debug, Default)]
pub struct RunResult {
  /// Targets executed by this run, in execution order.
  pub executed: Vec<ExecutedTarget>,

  /// Targets in the resolved order that had already executed earlier in
  /// this invocation and were not run again.
  pub skipped: Vec<String>,

  /// Target whose action failed (at most one, stops execution).
  pub failed: Option<TargetFailure>,
}

impl RunResult {
  /// Returns true if every resolved target succeeded.
  pub fn succeeded(&self) -> bool {
    self.failed.is_none()
  }

  pub fn failed_target(&self) -> Option<&str> {
    self.failed.as_ref().map(|f| f.name.as_str())
  }

  pub fn error(&self) -> Option<&ActionError> {
    self.failed.as_ref().map(|f| &f.error)
  }

  pub fn executed_names(&self) -> Vec<&str> {
    self.executed.iter().map(|t| t.name.as_str()).collect()
  }

  /// Total time spent in target actions.
  pub fn elapsed(&self) -> Duration {
    let executed: Duration = self.executed.iter().map(|t| t.elapsed).sum();
    executed + self.failed.as_ref().map_or(Duration::ZERO, |f| f.elapsed)
  }
}
