//! Build → package → install pipeline.
//!
//! Each stage returns a `Result`; composite operations use `?` so a later
//! stage only runs when the earlier one succeeded:
//!
//! ```text
//! release        = compile(+LOCALVERSION) ? package(v<version>)
//! clean_release  = clean ? release
//! clean_build    = clean ? compile ? package(working copy)
//! incremental    = compile ? package(working copy)
//! test_build     = compile ? package(test<counter>)
//! build_install  = incremental ? install
//! ```

mod install;
mod package;
mod version;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::context::BuildContext;
use crate::exec::{CommandRunner, ExecError, Invocation};

pub use install::{AttachedDevice, DeviceState, InstallReport, parse_adb_devices};
pub use package::{DTB_FILENAME, PackageReport, VERSION_FILENAME};
pub use version::{VersionDescriptor, VersionMode, check_release_version, read_counter};

/// Errors that stop a pipeline.
#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error(transparent)]
  Exec(#[from] ExecError),

  #[error("build counter not found at {}; build the kernel first", path.display())]
  CounterMissing { path: PathBuf },

  #[error("invalid build counter {value:?} in {}", path.display())]
  CounterInvalid { path: PathBuf, value: String },

  #[error("invalid release version {version:?}: expected a non-empty name without path separators or spaces")]
  InvalidVersion { version: String },

  #[error("kernel image not found at {}", path.display())]
  ImageMissing { path: PathBuf },

  #[error("no device tree blobs found under {}", path.display())]
  NoDtbs { path: PathBuf },

  #[error("packaging script finished but {} was not produced", path.display())]
  ArtifactMissing { path: PathBuf },

  #[error("io error at {}: {source}", path.display())]
  Io { path: PathBuf, source: std::io::Error },

  #[error("failed to walk {}: {source}", path.display())]
  Walk { path: PathBuf, source: walkdir::Error },
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CompileReport {
  pub elapsed: Duration,
}

/// Outcome of a compile followed by a package.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
  pub compile: CompileReport,
  pub package: PackageReport,
}

/// The workflow stages bound to a context and a command runner.
pub struct Pipeline<'a, R: CommandRunner + ?Sized> {
  ctx: &'a BuildContext,
  runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> Pipeline<'a, R> {
  pub fn new(ctx: &'a BuildContext, runner: &'a R) -> Self {
    Self { ctx, runner }
  }

  pub fn context(&self) -> &BuildContext {
    self.ctx
  }

  fn make(&self) -> Invocation {
    Invocation::new(&self.ctx.config().tools.make)
      .args(self.ctx.make_args())
      .current_dir(self.ctx.root())
  }

  /// Run the kernel build with `extra_args` appended and time it.
  pub fn compile(&self, extra_args: &[String]) -> Result<CompileReport, WorkflowError> {
    let start = Instant::now();
    self.runner.run(&self.make().args(extra_args.iter().cloned()))?;
    let elapsed = start.elapsed();
    info!(
      elapsed = %humantime::format_duration(Duration::from_secs(elapsed.as_secs())),
      "kernel compiled"
    );
    Ok(CompileReport { elapsed })
  }

  /// `make clean` in the output tree. The generated `.config` survives.
  pub fn clean(&self) -> Result<(), WorkflowError> {
    info!("cleaning build output");
    self.runner.run(&self.make().arg("clean"))?;
    Ok(())
  }

  /// Package the current build into `output` (relative to the kernel root).
  pub fn package(&self, output: &Path, mode: &VersionMode) -> Result<PackageReport, WorkflowError> {
    package::package(self.ctx, self.runner, output, mode)
  }

  /// Package to the default name for `mode`: `<kernel>-<device>-<tag>.zip`.
  pub fn package_default(&self, mode: &VersionMode) -> Result<PackageReport, WorkflowError> {
    let tag = version::describe(mode, &self.ctx.counter_file())?.tag();
    self.package(&self.ctx.artifact_path(&tag), mode)
  }

  /// Package a test build named after the build counter.
  pub fn package_test(&self) -> Result<PackageReport, WorkflowError> {
    self.package_default(&VersionMode::Test)
  }

  /// Delete the build counter. Returns whether one existed.
  pub fn reset_counter(&self) -> Result<bool, WorkflowError> {
    version::reset_counter(&self.ctx.counter_file())
  }

  /// Compile with release version tags, then package as `v<version>`.
  pub fn release(&self, version: &str, extra_args: &[String]) -> Result<BuildReport, WorkflowError> {
    check_release_version(version)?;
    let mut args = extra_args.to_vec();
    args.push(format!("LOCALVERSION=-v{}", version));
    args.push("KBUILD_BUILD_VERSION=1".to_string());

    let compile = self.compile(&args)?;
    let package = self.package_default(&VersionMode::Release(version.to_string()))?;
    Ok(BuildReport { compile, package })
  }

  pub fn clean_release(&self, version: &str, extra_args: &[String]) -> Result<BuildReport, WorkflowError> {
    check_release_version(version)?;
    self.clean()?;
    self.release(version, extra_args)
  }

  pub fn clean_build(&self, extra_args: &[String]) -> Result<BuildReport, WorkflowError> {
    self.clean()?;
    self.incremental_build(extra_args)
  }

  /// Compile, then package to the untagged working-copy artifact.
  pub fn incremental_build(&self, extra_args: &[String]) -> Result<BuildReport, WorkflowError> {
    let compile = self.compile(extra_args)?;
    let package = self.package(&self.ctx.working_copy_artifact(), &VersionMode::Test)?;
    Ok(BuildReport { compile, package })
  }

  pub fn test_build(&self, extra_args: &[String]) -> Result<BuildReport, WorkflowError> {
    let compile = self.compile(extra_args)?;
    let package = self.package_test()?;
    Ok(BuildReport { compile, package })
  }

  /// Boot `image` (or the default boot image) on the attached device.
  pub fn install(&self, image: Option<&Path>) -> Result<InstallReport, WorkflowError> {
    install::install(self.ctx, self.runner, image)
  }

  pub fn build_and_install(&self, extra_args: &[String]) -> Result<(BuildReport, InstallReport), WorkflowError> {
    let build = self.incremental_build(extra_args)?;
    let install = self.install(None)?;
    Ok((build, install))
  }
}
