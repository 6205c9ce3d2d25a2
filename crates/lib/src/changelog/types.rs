//! Release note and changelog types.

use std::path::PathBuf;

use semver::Version;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while reading or parsing a changelog.
#[derive(Debug, Error)]
pub enum ChangelogError {
  /// The changelog file could not be read.
  #[error("failed to read changelog {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  /// A release header did not carry a usable semantic version.
  #[error("could not parse version from release header on line {line}: {message}")]
  Parse { line: usize, message: String },

  /// Parsing succeeded but no release header was found.
  #[error("changelog contains no release entries")]
  Empty,
}

/// One changelog entry: a version plus the lines describing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseNote {
  pub version: Version,
  pub notes: Vec<String>,
}

impl ReleaseNote {
  pub fn new(version: Version) -> Self {
    Self {
      version,
      notes: Vec::new(),
    }
  }

  /// Notes joined into a single body, one note per line.
  pub fn body(&self) -> String {
    self.notes.join("\n")
  }
}

/// A parsed changelog, newest release first.
///
/// Holding `current` separately guarantees at least one release exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Changelog {
  current: ReleaseNote,
  previous: Vec<ReleaseNote>,
}

impl Changelog {
  /// Build a changelog from releases in document order.
  ///
  /// # Errors
  ///
  /// Returns [`ChangelogError::Empty`] when `releases` is empty.
  pub fn from_releases(releases: Vec<ReleaseNote>) -> Result<Self, ChangelogError> {
    let mut iter = releases.into_iter();
    let current = iter.next().ok_or(ChangelogError::Empty)?;
    Ok(Self {
      current,
      previous: iter.collect(),
    })
  }

  /// The authoritative release: the first entry in the document.
  pub fn current(&self) -> &ReleaseNote {
    &self.current
  }

  /// Every release after the current one, in document order.
  pub fn previous(&self) -> &[ReleaseNote] {
    &self.previous
  }

  /// All releases in document order, current first.
  pub fn releases(&self) -> impl Iterator<Item = &ReleaseNote> {
    std::iter::once(&self.current).chain(self.previous.iter())
  }

  pub fn len(&self) -> usize {
    1 + self.previous.len()
  }

  /// Always false; kept for API symmetry with `len`.
  pub fn is_empty(&self) -> bool {
    false
  }
}
