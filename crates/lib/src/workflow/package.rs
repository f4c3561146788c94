//! Flashable zip packaging.
//!
//! The kernel image and the concatenated device tree blobs are staged into
//! the payload directory together with a `version` file, then the payload's
//! packaging script produces the artifact.

use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::WorkflowError;
use super::version::{VersionDescriptor, VersionMode, describe};
use crate::context::BuildContext;
use crate::exec::{CommandRunner, Invocation};

/// Name of the concatenated DTB file inside the payload.
pub const DTB_FILENAME: &str = "dtb";
/// Name of the version metadata file inside the payload.
pub const VERSION_FILENAME: &str = "version";

/// Result of a successful package call.
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
  pub artifact: PathBuf,
  pub version: VersionDescriptor,
}

pub(crate) fn package<R: CommandRunner + ?Sized>(
  ctx: &BuildContext,
  runner: &R,
  output: &Path,
  mode: &VersionMode,
) -> Result<PackageReport, WorkflowError> {
  let version = describe(mode, &ctx.counter_file())?;
  let artifact = ctx.resolve(output);
  info!(artifact = %artifact.display(), version = %version.tag(), "packaging");

  let payload = ctx.payload_dir();
  fs::create_dir_all(&payload).map_err(|source| io_error(&payload, source))?;

  let image = ctx.image_path();
  if !image.is_file() {
    return Err(WorkflowError::ImageMissing { path: image });
  }
  let staged_image = payload.join(&ctx.config().paths.image);
  fs::copy(&image, &staged_image).map_err(|source| io_error(&staged_image, source))?;

  let dtbs = collect_dtbs(&ctx.dtb_dir())?;
  concat_files(&dtbs, &payload.join(DTB_FILENAME))?;
  debug!(count = dtbs.len(), "staged device tree blobs");

  let version_file = payload.join(VERSION_FILENAME);
  let metadata = format!("{} {} ({})\n", ctx.config().kernel_name, version.tag(), version.label);
  fs::write(&version_file, metadata).map_err(|source| io_error(&version_file, source))?;

  if let Some(parent) = artifact.parent() {
    fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
  }
  remove_stale(&artifact)?;

  let invocation = Invocation::new(ctx.package_script().to_string_lossy())
    .arg(artifact.to_string_lossy())
    .current_dir(&payload);

  if let Err(e) = runner.run(&invocation) {
    // Never leave a half-written artifact behind
    discard_partial(&artifact);
    return Err(e.into());
  }

  if !artifact.is_file() {
    return Err(WorkflowError::ArtifactMissing { path: artifact });
  }

  Ok(PackageReport { artifact, version })
}

/// Every `*.dtb` below `dir`, sorted by path.
fn collect_dtbs(dir: &Path) -> Result<Vec<PathBuf>, WorkflowError> {
  if !dir.is_dir() {
    return Err(WorkflowError::NoDtbs {
      path: dir.to_path_buf(),
    });
  }

  let mut dtbs = Vec::new();
  for entry in WalkDir::new(dir) {
    let entry = entry.map_err(|source| WorkflowError::Walk {
      path: dir.to_path_buf(),
      source,
    })?;
    if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "dtb") {
      dtbs.push(entry.into_path());
    }
  }

  if dtbs.is_empty() {
    return Err(WorkflowError::NoDtbs {
      path: dir.to_path_buf(),
    });
  }

  dtbs.sort();
  Ok(dtbs)
}

fn concat_files(inputs: &[PathBuf], dest: &Path) -> Result<(), WorkflowError> {
  let mut out = File::create(dest).map_err(|source| io_error(dest, source))?;
  for input in inputs {
    let mut file = File::open(input).map_err(|source| io_error(input, source))?;
    io::copy(&mut file, &mut out).map_err(|source| io_error(dest, source))?;
  }
  Ok(())
}

fn remove_stale(artifact: &Path) -> Result<(), WorkflowError> {
  match fs::remove_file(artifact) {
    Ok(()) => {
      debug!(path = %artifact.display(), "removed stale artifact");
      Ok(())
    }
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
    Err(source) => Err(io_error(artifact, source)),
  }
}

fn discard_partial(artifact: &Path) {
  match fs::remove_file(artifact) {
    Ok(()) => debug!(path = %artifact.display(), "removed partial artifact"),
    Err(e) if e.kind() == ErrorKind::NotFound => {}
    Err(e) => warn!(path = %artifact.display(), error = %e, "failed to remove partial artifact"),
  }
}

fn io_error(path: &Path, source: io::Error) -> WorkflowError {
  WorkflowError::Io {
    path: path.to_path_buf(),
    source,
  }
}
