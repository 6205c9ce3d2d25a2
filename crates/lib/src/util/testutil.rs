//! Test utilities for bake-lib.
//!
//! Cross-platform shell helpers for tests that spawn real processes, and a
//! recording [`ToolInvoker`] for tests that exercise target actions without
//! a toolchain installed.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::params::Configuration;
use crate::tools::{ReleaseRequest, ToolError, ToolInvoker};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Returns the command and args to create a marker file in the current directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  ("/usr/bin/touch", vec![filename.to_string()])
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  (
    "powershell.exe",
    vec![
      "-NoProfile".to_string(),
      "-Command".to_string(),
      format!("New-Item -ItemType File -Path '{}' -Force | Out-Null", filename),
    ],
  )
}

/// A [`ToolInvoker`] that records each call as a short line such as
/// `build Lib.sln Release`, using file names only.
///
/// Calls to the operation named by `fail_on` are recorded and then fail
/// with exit code 1. Release requests are also kept whole so tests can
/// inspect the notes and prerelease flag.
#[derive(Clone, Default)]
pub struct RecordingTools {
  calls: Rc<RefCell<Vec<String>>>,
  releases: Rc<RefCell<Vec<ReleaseRequest>>>,
  fail_on: Option<&'static str>,
}

impl RecordingTools {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing_on(operation: &'static str) -> Self {
    Self {
      fail_on: Some(operation),
      ..Self::default()
    }
  }

  /// Calls recorded so far, shared with every clone.
  pub fn calls(&self) -> Vec<String> {
    self.calls.borrow().clone()
  }

  /// Release requests received so far.
  pub fn releases(&self) -> Vec<ReleaseRequest> {
    self.releases.borrow().clone()
  }

  fn record(&self, operation: &'static str, detail: String) -> Result<(), ToolError> {
    self.calls.borrow_mut().push(format!("{operation} {detail}"));
    if self.fail_on == Some(operation) {
      return Err(ToolError::CommandFailed {
        cmd: operation.to_string(),
        code: Some(1),
      });
    }
    Ok(())
  }
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default()
}

impl ToolInvoker for RecordingTools {
  fn restore(&self, project_file: &Path) -> Result<(), ToolError> {
    self.record("restore", file_name(project_file))
  }

  fn build(&self, project_file: &Path, configuration: Configuration) -> Result<(), ToolError> {
    self.record("build", format!("{} {}", file_name(project_file), configuration))
  }

  fn test(&self, project_file: &Path, configuration: Configuration) -> Result<(), ToolError> {
    self.record("test", format!("{} {}", file_name(project_file), configuration))
  }

  fn pack(
    &self,
    spec_file: &Path,
    version: &str,
    _output_dir: &Path,
    configuration: Configuration,
  ) -> Result<(), ToolError> {
    self.record("pack", format!("{} {} {}", file_name(spec_file), version, configuration))
  }

  fn push(&self, package_file: &Path, source_url: &str, _api_key: &str) -> Result<(), ToolError> {
    self.record("push", format!("{} {}", file_name(package_file), source_url))
  }

  fn create_release(&self, release: &ReleaseRequest, _token: &str) -> Result<(), ToolError> {
    self.releases.borrow_mut().push(release.clone());
    self.record(
      "release",
      format!("{}/{} {} {}", release.owner, release.repo, release.version, release.target_commitish),
    )
  }
}
