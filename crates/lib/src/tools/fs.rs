//! File-system helpers used by target actions.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::execute::ActionError;

/// Delete every directory under `root` whose name is in `names`.
///
/// Matching directories are removed whole; their contents are not searched.
/// A missing `root` deletes nothing. Returns the deleted paths.
pub fn delete_directories(root: &Path, names: &[&str]) -> Result<Vec<PathBuf>, ActionError> {
  if !root.exists() {
    debug!(root = %root.display(), "nothing to clean");
    return Ok(Vec::new());
  }

  let mut found = Vec::new();
  let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name().into_iter();
  while let Some(entry) = walker.next() {
    let entry = entry.map_err(|e| {
      let path = e.path().unwrap_or(root).to_path_buf();
      ActionError::io("walk", path, io::Error::from(e))
    })?;

    let is_match = entry.file_type().is_dir() && entry.file_name().to_str().is_some_and(|n| names.contains(&n));
    if is_match {
      found.push(entry.into_path());
      walker.skip_current_dir();
    }
  }

  for dir in &found {
    info!(path = %dir.display(), "deleting directory");
    fs::remove_dir_all(dir).map_err(|e| ActionError::io("delete", dir, e))?;
  }

  Ok(found)
}

/// Copy `src` to `dst` unless `dst` exists and is at least as new.
///
/// Parent directories of `dst` are created. Returns whether a copy happened.
pub fn copy_if_newer(src: &Path, dst: &Path) -> Result<bool, ActionError> {
  let src_modified = fs::metadata(src)
    .and_then(|m| m.modified())
    .map_err(|e| ActionError::io("read", src, e))?;

  if let Ok(dst_modified) = fs::metadata(dst).and_then(|m| m.modified())
    && dst_modified >= src_modified
  {
    debug!(path = %dst.display(), "destination is up to date");
    return Ok(false);
  }

  if let Some(parent) = dst.parent() {
    fs::create_dir_all(parent).map_err(|e| ActionError::io("create", parent, e))?;
  }

  debug!(from = %src.display(), to = %dst.display(), "copying file");
  fs::copy(src, dst).map_err(|e| ActionError::io("copy", src, e))?;
  Ok(true)
}

/// Files directly inside `dir` with the given extension, sorted by name.
pub fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ActionError> {
  let entries = fs::read_dir(dir).map_err(|e| ActionError::io("list", dir, e))?;

  let mut files = Vec::new();
  for entry in entries {
    let path = entry.map_err(|e| ActionError::io("list", dir, e))?.path();
    if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
      files.push(path);
    }
  }

  files.sort();
  Ok(files)
}
