//! Version string derivation.

use semver::Version;

use super::{CiContext, Configuration};

/// Derive the version string a build publishes under.
///
/// Local builds use the changelog version unchanged. CI builds append the
/// channel tag (`ci` for Release, `alpha` otherwise) and the run number so
/// every CI package is unique.
pub fn derive_version(version: &Version, configuration: Configuration, ci: &CiContext) -> String {
  if !ci.is_ci {
    return version.to_string();
  }

  let channel = match configuration {
    Configuration::Release => "ci",
    Configuration::Debug => "alpha",
  };

  format!("{}-{}-{}", version, channel, ci.run_number)
}
