//! Build initialization.
//!
//! Runs once before any target to assemble the [`BuildParameters`]:
//! - Read and parse the changelog, taking its first release as current
//! - Pick the configuration (explicit override, else from the CI context)
//! - Read the target frameworks from the main project file
//! - Derive the version string
//!
//! Any failure aborts the invocation before the target graph is resolved.

use thiserror::Error;
use tracing::{debug, info};

use crate::changelog::{self, ChangelogError};
use crate::params::{BuildParameters, CiContext, Configuration};
use crate::project::{self, ProjectError};
use crate::settings::Layout;

/// Errors that abort initialization.
#[derive(Debug, Error)]
pub enum InitError {
  #[error(transparent)]
  Changelog(#[from] ChangelogError),

  #[error(transparent)]
  Project(#[from] ProjectError),
}

/// Inputs to initialization that do not come from the repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
  /// Overrides the CI-derived default configuration.
  pub configuration: Option<Configuration>,
  pub ci: CiContext,
}

/// Assemble the parameters for one invocation.
///
/// # Errors
///
/// Returns an error if the changelog is unreadable, unparsable or empty, or
/// the project file is missing or declares no frameworks.
pub fn initialize(layout: &Layout, options: InitOptions) -> Result<BuildParameters, InitError> {
  debug!(path = %layout.changelog.display(), "resolving version from changelog");
  let changelog = changelog::load(&layout.changelog)?;
  let release = changelog.current().clone();

  let configuration = options
    .configuration
    .unwrap_or_else(|| Configuration::default_for(&options.ci));

  let frameworks = project::target_frameworks(&layout.project_file)?;

  let params = BuildParameters::new(configuration, release, frameworks, options.ci);
  info!(
    version = %params.version,
    configuration = %params.configuration,
    frameworks = ?params.target_frameworks,
    ci = params.ci.is_ci,
    "initialized build"
  );

  Ok(params)
}
