//! Build settings and the resolved repository layout.
//!
//! Settings come from an optional `bake.toml` in the build root. Every key
//! has a default derived from the project name, so an empty or missing file
//! describes the conventional layout:
//!
//! ```text
//! <root>/CHANGELOG.md
//! <root>/logo.png
//! <root>/src/<Project>.sln
//! <root>/src/<Project>.nuspec
//! <root>/src/<Project>/<Project>.csproj
//! <root>/bin/<version>/nuget/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  DEFAULT_CHANGELOG, DEFAULT_OUTPUT_DIR, DEFAULT_PACKAGE_SOURCE, DEFAULT_RELEASE_BRANCH, DEFAULT_SOURCE_DIR,
  SETTINGS_FILE,
};
use crate::params::Configuration;

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("invalid settings in {}: {source}", path.display())]
  Parse { path: PathBuf, source: toml::de::Error },

  #[error("cannot derive a project name from {}; set `project` in bake.toml", root.display())]
  NoProjectName { root: PathBuf },
}

/// Contents of `bake.toml`. Relative paths are resolved against the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
  pub project: Option<String>,
  pub solution: Option<PathBuf>,
  pub project_file: Option<PathBuf>,
  pub nuspec: Option<PathBuf>,
  pub changelog: Option<PathBuf>,
  pub source_dir: Option<PathBuf>,
  pub output_dir: Option<PathBuf>,
  pub package_source: Option<String>,
  pub repo_owner: Option<String>,
  pub repo_name: Option<String>,
  pub release_branch: Option<String>,
}

impl Settings {
  /// Load `bake.toml` from `root`; a missing file yields the defaults.
  pub fn load(root: &Path) -> Result<Self, SettingsError> {
    let path = root.join(SETTINGS_FILE);
    if !path.exists() {
      debug!(path = %path.display(), "no settings file, using defaults");
      return Ok(Self::default());
    }

    let text = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
      path: path.clone(),
      source,
    })?;
    let settings = toml::from_str(&text).map_err(|source| SettingsError::Parse { path: path.clone(), source })?;
    debug!(path = %path.display(), "loaded settings");
    Ok(settings)
  }
}

/// Absolute locations of everything the standard pipeline touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
  pub root: PathBuf,
  pub project: String,
  pub solution: PathBuf,
  pub project_file: PathBuf,
  pub nuspec: PathBuf,
  pub changelog: PathBuf,
  pub logo: PathBuf,
  pub source_dir: PathBuf,
  pub output_dir: PathBuf,
  pub package_source: String,
  pub repo_owner: String,
  pub repo_name: String,
  pub release_branch: String,
}

impl Layout {
  /// Fill in defaults for every setting left unset.
  pub fn resolve(root: &Path, settings: Settings) -> Result<Self, SettingsError> {
    let project = match settings.project {
      Some(project) => project,
      None => root
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| SettingsError::NoProjectName {
          root: root.to_path_buf(),
        })?,
    };

    let at_root = |p: PathBuf| root.join(p);
    let source_dir = at_root(settings.source_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR)));

    let layout = Self {
      solution: settings
        .solution
        .map(at_root)
        .unwrap_or_else(|| source_dir.join(format!("{project}.sln"))),
      project_file: settings
        .project_file
        .map(at_root)
        .unwrap_or_else(|| source_dir.join(&project).join(format!("{project}.csproj"))),
      nuspec: settings
        .nuspec
        .map(at_root)
        .unwrap_or_else(|| source_dir.join(format!("{project}.nuspec"))),
      changelog: at_root(settings.changelog.unwrap_or_else(|| PathBuf::from(DEFAULT_CHANGELOG))),
      logo: root.join("logo.png"),
      output_dir: at_root(settings.output_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))),
      package_source: settings
        .package_source
        .unwrap_or_else(|| DEFAULT_PACKAGE_SOURCE.to_string()),
      repo_owner: settings.repo_owner.unwrap_or_else(|| project.clone()),
      repo_name: settings.repo_name.unwrap_or_else(|| project.clone()),
      release_branch: settings
        .release_branch
        .unwrap_or_else(|| DEFAULT_RELEASE_BRANCH.to_string()),
      source_dir,
      root: root.to_path_buf(),
      project,
    };

    debug!(project = %layout.project, root = %layout.root.display(), "resolved layout");
    Ok(layout)
  }

  /// Load `bake.toml` from `root` and resolve it.
  pub fn load(root: &Path) -> Result<Self, SettingsError> {
    Self::resolve(root, Settings::load(root)?)
  }

  /// Replace the changelog location, relative to the root.
  pub fn with_changelog(mut self, changelog: impl AsRef<Path>) -> Self {
    self.changelog = self.root.join(changelog);
    self
  }

  /// Compiler output for the main project in `configuration`.
  pub fn build_dir(&self, configuration: Configuration) -> PathBuf {
    self
      .source_dir
      .join(&self.project)
      .join("bin")
      .join(configuration.as_str())
  }

  /// Per-version result directory.
  pub fn result_dir(&self, version: &str) -> PathBuf {
    self.output_dir.join(version)
  }

  /// Staging directory packages are assembled and packed in.
  pub fn nuget_dir(&self, version: &str) -> PathBuf {
    self.result_dir(version).join("nuget")
  }
}
