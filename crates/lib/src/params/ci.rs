//! CI context detection.

use serde::Serialize;
use tracing::debug;

use crate::consts::{ENV_GITHUB_ACTIONS, ENV_GITHUB_RUN_NUMBER};

use super::ParamsError;

/// Whether the run is CI-triggered, and which run it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CiContext {
  pub is_ci: bool,
  pub run_number: u64,
}

impl CiContext {
  pub fn local() -> Self {
    Self::default()
  }

  pub fn ci(run_number: u64) -> Self {
    Self {
      is_ci: true,
      run_number,
    }
  }

  /// Detect the context from GitHub Actions environment variables.
  ///
  /// `GITHUB_ACTIONS=true` marks a CI run, which must then carry a numeric
  /// `GITHUB_RUN_NUMBER`.
  pub fn from_env() -> Result<Self, ParamsError> {
    let is_ci = std::env::var(ENV_GITHUB_ACTIONS).is_ok_and(|v| v.eq_ignore_ascii_case("true"));
    if !is_ci {
      debug!("local build");
      return Ok(Self::local());
    }

    let raw = std::env::var(ENV_GITHUB_RUN_NUMBER).unwrap_or_default();
    let run_number = raw
      .trim()
      .parse::<u64>()
      .map_err(|_| ParamsError::InvalidRunNumber { value: raw.clone() })?;

    debug!(run_number, "CI build");
    Ok(Self::ci(run_number))
  }
}
