//! MSBuild project metadata.
//!
//! Only the target frameworks are read. `<TargetFrameworks>` holds a
//! semicolon-separated list, `<TargetFramework>` a single identifier; both
//! may appear and are merged in document order.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("failed to read project file {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("malformed project file {}: {source}", path.display())]
  Xml { path: PathBuf, source: quick_xml::Error },

  #[error("no target frameworks declared in {}", path.display())]
  NoTargetFrameworks { path: PathBuf },
}

/// Read the target frameworks declared by the project file at `path`.
///
/// # Errors
///
/// - [`ProjectError::Read`] if the file cannot be read
/// - [`ProjectError::Xml`] if it is not well-formed
/// - [`ProjectError::NoTargetFrameworks`] if it declares none
pub fn target_frameworks(path: &Path) -> Result<Vec<String>, ProjectError> {
  let xml = fs::read_to_string(path).map_err(|source| ProjectError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let frameworks = parse_target_frameworks(&xml).map_err(|source| ProjectError::Xml {
    path: path.to_path_buf(),
    source,
  })?;
  if frameworks.is_empty() {
    return Err(ProjectError::NoTargetFrameworks {
      path: path.to_path_buf(),
    });
  }

  debug!(path = %path.display(), frameworks = ?frameworks, "read target frameworks");
  Ok(frameworks)
}

fn is_framework_element(name: &[u8]) -> bool {
  name == b"TargetFramework" || name == b"TargetFrameworks"
}

/// Framework identifiers in `xml`, first occurrence wins.
///
/// Comments are ignored. MSBuild property references such as
/// `$(LibraryFrameworks)` cannot be evaluated here and are skipped.
pub fn parse_target_frameworks(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
  let mut reader = Reader::from_str(xml);
  let mut frameworks: Vec<String> = Vec::new();
  let mut value: Option<String> = None;

  loop {
    match reader.read_event()? {
      Event::Start(e) if is_framework_element(e.local_name().as_ref()) => value = Some(String::new()),
      Event::Text(t) => {
        if let Some(value) = value.as_mut() {
          value.push_str(&String::from_utf8_lossy(&t));
        }
      }
      Event::End(e) if is_framework_element(e.local_name().as_ref()) => {
        let Some(list) = value.take() else { continue };
        for fw in list.split(';').map(str::trim) {
          if fw.is_empty() || fw.starts_with("$(") {
            continue;
          }
          if !frameworks.iter().any(|f| f == fw) {
            frameworks.push(fw.to_string());
          }
        }
      }
      Event::Eof => break,
      _ => {}
    }
  }

  Ok(frameworks)
}
