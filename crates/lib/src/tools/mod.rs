//! External toolchain invocation.
//!
//! Target actions reach the outside world through [`ToolInvoker`]. The
//! process-backed [`ProcessTools`] drives `dotnet`, `nuget` and the GitHub
//! REST API; every call blocks until the tool finishes.

mod cmd;
pub mod fs;
mod github;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::runtime::Runtime;

use crate::consts::GITHUB_API_URL;
use crate::params::Configuration;

pub use cmd::{format_command, run_command};

/// Errors raised by external tools.
#[derive(Debug, Error)]
pub enum ToolError {
  /// The program could not be started.
  #[error("failed to start {program}: {source}")]
  Spawn { program: String, source: std::io::Error },

  /// Command execution failed.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CommandFailed { cmd: String, code: Option<i32> },

  /// Release creation was rejected or could not be sent.
  #[error("release request to {url} failed: {message}")]
  Release { url: String, message: String },

  #[error("failed to create async runtime: {0}")]
  Runtime(std::io::Error),
}

/// A release to publish on the source-control host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
  pub owner: String,
  pub repo: String,
  /// Used as both tag and release name.
  pub version: String,
  pub notes: String,
  pub prerelease: bool,
  /// Branch or commit the tag is created from.
  pub target_commitish: String,
}

/// The external operations target actions delegate to.
pub trait ToolInvoker {
  fn restore(&self, project_file: &Path) -> Result<(), ToolError>;

  fn build(&self, project_file: &Path, configuration: Configuration) -> Result<(), ToolError>;

  fn test(&self, project_file: &Path, configuration: Configuration) -> Result<(), ToolError>;

  fn pack(&self, spec_file: &Path, version: &str, output_dir: &Path, configuration: Configuration)
  -> Result<(), ToolError>;

  fn push(&self, package_file: &Path, source_url: &str, api_key: &str) -> Result<(), ToolError>;

  fn create_release(&self, release: &ReleaseRequest, token: &str) -> Result<(), ToolError>;
}

/// Runs the real toolchain as child processes.
pub struct ProcessTools {
  working_dir: PathBuf,
  runtime: Runtime,
  http: reqwest::Client,
  api_url: String,
}

impl ProcessTools {
  /// Tools running commands from `working_dir`.
  pub fn new(working_dir: impl Into<PathBuf>) -> Result<Self, ToolError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .map_err(ToolError::Runtime)?;

    Ok(Self {
      working_dir: working_dir.into(),
      runtime,
      http: reqwest::Client::new(),
      api_url: GITHUB_API_URL.to_string(),
    })
  }

  /// Send release requests to a different API host.
  pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
    self.api_url = api_url.into();
    self
  }

  fn run(&self, program: &str, args: Vec<String>, secrets: &[&str]) -> Result<(), ToolError> {
    self
      .runtime
      .block_on(run_command(program, &args, &self.working_dir, secrets))
  }
}

fn path_arg(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}

impl ToolInvoker for ProcessTools {
  fn restore(&self, project_file: &Path) -> Result<(), ToolError> {
    self.run("dotnet", vec!["restore".into(), path_arg(project_file)], &[])
  }

  fn build(&self, project_file: &Path, configuration: Configuration) -> Result<(), ToolError> {
    self.run(
      "dotnet",
      vec![
        "build".into(),
        path_arg(project_file),
        "--configuration".into(),
        configuration.to_string(),
        "--no-restore".into(),
      ],
      &[],
    )
  }

  fn test(&self, project_file: &Path, configuration: Configuration) -> Result<(), ToolError> {
    self.run(
      "dotnet",
      vec![
        "test".into(),
        path_arg(project_file),
        "--configuration".into(),
        configuration.to_string(),
        "--no-restore".into(),
        "--no-build".into(),
      ],
      &[],
    )
  }

  fn pack(
    &self,
    spec_file: &Path,
    version: &str,
    output_dir: &Path,
    configuration: Configuration,
  ) -> Result<(), ToolError> {
    self.run(
      "nuget",
      vec![
        "pack".into(),
        path_arg(spec_file),
        "-Version".into(),
        version.to_string(),
        "-OutputDirectory".into(),
        path_arg(output_dir),
        "-Symbols".into(),
        "-SymbolPackageFormat".into(),
        "snupkg".into(),
        "-Properties".into(),
        format!("Configuration={}", configuration),
      ],
      &[],
    )
  }

  fn push(&self, package_file: &Path, source_url: &str, api_key: &str) -> Result<(), ToolError> {
    self.run(
      "nuget",
      vec![
        "push".into(),
        path_arg(package_file),
        "-Source".into(),
        source_url.to_string(),
        "-ApiKey".into(),
        api_key.to_string(),
      ],
      &[api_key],
    )
  }

  fn create_release(&self, release: &ReleaseRequest, token: &str) -> Result<(), ToolError> {
    self
      .runtime
      .block_on(github::create_release(&self.http, &self.api_url, token, release))
  }
}
