//! Build parameters shared read-only with every target action.
//!
//! Parameters are assembled once by the initialization hook and never
//! mutated afterwards.

mod ci;
mod version;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::changelog::ReleaseNote;

pub use ci::CiContext;
pub use version::derive_version;

#[derive(Debug, Error)]
pub enum ParamsError {
  #[error("unknown configuration '{0}' (expected Debug or Release)")]
  UnknownConfiguration(String),

  #[error("GITHUB_RUN_NUMBER is not a valid run number: '{value}'")]
  InvalidRunNumber { value: String },
}

/// Build configuration passed to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Configuration {
  Debug,
  Release,
}

impl Configuration {
  /// Release on CI, Debug for local builds.
  pub fn default_for(ci: &CiContext) -> Self {
    if ci.is_ci {
      Configuration::Release
    } else {
      Configuration::Debug
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Configuration::Debug => "Debug",
      Configuration::Release => "Release",
    }
  }
}

impl fmt::Display for Configuration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Configuration {
  type Err = ParamsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "debug" => Ok(Configuration::Debug),
      "release" => Ok(Configuration::Release),
      _ => Err(ParamsError::UnknownConfiguration(s.to_string())),
    }
  }
}

/// Immutable inputs for a single build invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BuildParameters {
  pub configuration: Configuration,
  /// Version string packages and releases are published under.
  pub version: String,
  /// Framework identifiers, in project order without duplicates.
  pub target_frameworks: Vec<String>,
  /// The current changelog entry.
  pub release: ReleaseNote,
  pub ci: CiContext,
}

impl BuildParameters {
  pub fn new(configuration: Configuration, release: ReleaseNote, target_frameworks: Vec<String>, ci: CiContext) -> Self {
    let version = derive_version(&release.version, configuration, &ci);
    Self {
      configuration,
      version,
      target_frameworks,
      release,
      ci,
    }
  }
}
