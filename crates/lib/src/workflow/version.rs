//! Version naming for packaged builds.
//!
//! Release builds are named after an explicit version (`v3`). Test builds are
//! named after kbuild's link counter (`test42`), which lives in `<out>/.version`
//! and is bumped by the kernel build system itself.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use super::WorkflowError;
use crate::consts::RELEASE_VERSION_ENV;

/// How a package is versioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionMode {
  Release(String),
  Test,
}

impl VersionMode {
  /// Release mode when a non-empty version is given, test mode otherwise.
  pub fn from_release(version: Option<&str>) -> Self {
    match version.map(str::trim) {
      Some(v) if !v.is_empty() => VersionMode::Release(v.to_string()),
      _ => VersionMode::Test,
    }
  }

  /// Like [`VersionMode::from_release`], falling back to `RELEASE_VER`.
  pub fn from_release_or_env(version: Option<&str>) -> Self {
    match version {
      Some(v) => Self::from_release(Some(v)),
      None => Self::from_release(std::env::var(RELEASE_VERSION_ENV).ok().as_deref()),
    }
  }
}

/// Version metadata embedded in a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDescriptor {
  pub prefix: &'static str,
  pub number: String,
  pub label: &'static str,
}

impl VersionDescriptor {
  /// `v<version>` or `test<counter>`
  pub fn tag(&self) -> String {
    format!("{}{}", self.prefix, self.number)
  }
}

/// A release version ends up in `LOCALVERSION` and in the artifact's file
/// name, so it must be a single non-empty path component without whitespace.
pub fn check_release_version(version: &str) -> Result<(), WorkflowError> {
  if version.is_empty() || version.contains(['/', '\\']) || version.chars().any(char::is_whitespace) {
    return Err(WorkflowError::InvalidVersion {
      version: version.to_string(),
    });
  }
  Ok(())
}

/// Compute the descriptor. Release mode never touches the counter file.
pub fn describe(mode: &VersionMode, counter_file: &Path) -> Result<VersionDescriptor, WorkflowError> {
  match mode {
    VersionMode::Release(version) => {
      check_release_version(version)?;
      Ok(VersionDescriptor {
        prefix: "v",
        number: version.clone(),
        label: "stable",
      })
    }
    VersionMode::Test => Ok(VersionDescriptor {
      prefix: "test",
      number: read_counter(counter_file)?,
      label: "test",
    }),
  }
}

/// Read the build counter verbatim (surrounding whitespace trimmed).
pub fn read_counter(path: &Path) -> Result<String, WorkflowError> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == ErrorKind::NotFound => {
      return Err(WorkflowError::CounterMissing {
        path: path.to_path_buf(),
      });
    }
    Err(source) => {
      return Err(WorkflowError::Io {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  let value = content.trim();
  if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
    return Err(WorkflowError::CounterInvalid {
      path: path.to_path_buf(),
      value: value.to_string(),
    });
  }

  debug!(counter = %value, "read build counter");
  Ok(value.to_string())
}

/// Delete the counter so kbuild starts over. Returns whether a file was removed.
pub fn reset_counter(path: &Path) -> Result<bool, WorkflowError> {
  match fs::remove_file(path) {
    Ok(()) => {
      info!(path = %path.display(), "build counter reset");
      Ok(true)
    }
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
    Err(source) => Err(WorkflowError::Io {
      path: path.to_path_buf(),
      source,
    }),
  }
}
