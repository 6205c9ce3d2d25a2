//! Changelog-driven release resolution.
//!
//! The changelog is a human-maintained document listing releases newest
//! first. The first entry is authoritative for the version being built, and
//! its notes become the body of the published release.

mod parser;
mod types;

use std::fs;
use std::path::Path;

use tracing::debug;

pub use parser::parse_releases;
pub use types::{Changelog, ChangelogError, ReleaseNote};

/// Parse changelog text and select the current release.
///
/// # Errors
///
/// - [`ChangelogError::Parse`] when a release header has no usable version.
/// - [`ChangelogError::Empty`] when no release header is found.
pub fn resolve(text: &str) -> Result<Changelog, ChangelogError> {
  let releases = parse_releases(text)?;
  debug!(releases = releases.len(), "parsed changelog");
  Changelog::from_releases(releases)
}

/// Read and resolve the changelog at `path`.
pub fn load(path: &Path) -> Result<Changelog, ChangelogError> {
  debug!(path = %path.display(), "reading changelog");
  let text = fs::read_to_string(path).map_err(|source| ChangelogError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  resolve(&text)
}
