//! Changelog text parsing.
//!
//! Two layouts are recognized:
//!
//! - Heading layout: each release starts with a Markdown heading carrying a
//!   version (`# 1.2.3`, `### New in 1.2.3 (Released 2024/01/01)`,
//!   `## [1.2.3] - 2024-01-01`). The level of the first versioned heading is
//!   the release level; deeper headings are kept as notes. Headings before the
//!   first release are preamble.
//! - Bullet layout: selected when the first non-blank line starts with `*`.
//!   Every `*` line is one release: `* 1.2.3 - Note text`.

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use tracing::{debug, trace};

use super::types::{ChangelogError, ReleaseNote};

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?(-[0-9A-Za-z][0-9A-Za-z.-]*)?").expect("version pattern is valid")
});

/// Split changelog text into releases in document order.
pub fn parse_releases(text: &str) -> Result<Vec<ReleaseNote>, ChangelogError> {
  let first = text.lines().map(str::trim).find(|line| !line.is_empty());
  match first {
    Some(line) if line.starts_with('*') => parse_bullets(text),
    _ => parse_headings(text),
  }
}

fn parse_headings(text: &str) -> Result<Vec<ReleaseNote>, ChangelogError> {
  let mut releases = Vec::new();
  let mut release_level: Option<usize> = None;
  let mut current: Option<ReleaseNote> = None;
  let mut fence: Option<(char, usize)> = None;

  for (idx, raw) in text.lines().enumerate() {
    let line_no = idx + 1;
    let line = raw.trim();

    if let Some((ch, len)) = fence_marker(line) {
      fence = match fence {
        None => Some((ch, len)),
        Some((open, open_len)) if open == ch && len >= open_len && line[len..].trim().is_empty() => None,
        still_open => still_open,
      };
    } else if fence.is_some() {
      // Code block content is never a heading
    } else if let Some((level, title)) = heading(line) {
      let starts_release = match release_level {
        Some(release) => level <= release,
        None => is_unreleased(title) || VERSION_RE.is_match(title),
      };

      if starts_release {
        release_level.get_or_insert(level);
        releases.extend(current.take());

        if is_unreleased(title) {
          debug!(line = line_no, "skipping unreleased section");
          continue;
        }

        let version = parse_version(title, line_no)?;
        trace!(line = line_no, version = %version, "release header");
        current = Some(ReleaseNote::new(version));
        continue;
      }

      if release_level.is_none() {
        trace!(line = line_no, "preamble heading");
        continue;
      }
    }

    if line.is_empty() {
      continue;
    }

    if let Some(release) = current.as_mut() {
      release.notes.push(line.to_string());
    }
  }

  releases.extend(current);
  Ok(releases)
}

fn parse_bullets(text: &str) -> Result<Vec<ReleaseNote>, ChangelogError> {
  let mut releases = Vec::new();

  for (idx, raw) in text.lines().enumerate() {
    let line = raw.trim();
    let Some(entry) = line.strip_prefix('*') else {
      continue;
    };

    let (version, rest) = split_version(entry, idx + 1)?;
    let mut release = ReleaseNote::new(version);
    let note = rest.trim().trim_start_matches('-').trim();
    if !note.is_empty() {
      release.notes.push(note.to_string());
    }
    releases.push(release);
  }

  Ok(releases)
}

/// Returns the heading level and title of an ATX heading line.
///
/// One to six `#` followed by whitespace or the end of the line; `#1234`
/// is text.
fn heading(line: &str) -> Option<(usize, &str)> {
  let level = line.chars().take_while(|c| *c == '#').count();
  if !(1..=6).contains(&level) {
    return None;
  }
  let rest = &line[level..];
  if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
    return None;
  }
  Some((level, rest.trim()))
}

/// Returns the fence character and run length of a code fence line.
fn fence_marker(line: &str) -> Option<(char, usize)> {
  let ch = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
  let len = line.chars().take_while(|c| *c == ch).count();
  (len >= 3).then_some((ch, len))
}

fn is_unreleased(title: &str) -> bool {
  title
    .trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace())
    .eq_ignore_ascii_case("unreleased")
}

fn parse_version(title: &str, line: usize) -> Result<Version, ChangelogError> {
  split_version(title, line).map(|(version, _)| version)
}

/// Parse the first version token in `text`, returning it with the text after it.
fn split_version(text: &str, line: usize) -> Result<(Version, &str), ChangelogError> {
  let caps = VERSION_RE.captures(text).ok_or_else(|| ChangelogError::Parse {
    line,
    message: format!("no version in '{}'", text.trim()),
  })?;
  let end = caps.get(0).map_or(0, |m| m.end());
  let rest = &text[end..];

  if rest.starts_with('.') && rest[1..].starts_with(|c: char| c.is_ascii_digit()) {
    return Err(ChangelogError::Parse {
      line,
      message: format!("'{}' has more than three numeric components", text.trim()),
    });
  }

  let patch = caps.get(3).map_or("0", |m| m.as_str());
  let pre = caps.get(4).map_or("", |m| m.as_str());
  let normalized = format!("{}.{}.{}{}", &caps[1], &caps[2], patch, pre);

  let version = Version::parse(&normalized).map_err(|e| ChangelogError::Parse {
    line,
    message: format!("'{}': {}", normalized, e),
  })?;

  Ok((version, rest))
}
