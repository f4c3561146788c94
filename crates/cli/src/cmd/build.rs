use std::path::Path;

use anyhow::{Context, Result};

use kdev_lib::exec::ProcessRunner;
use kdev_lib::workflow::{BuildReport, PackageReport, Pipeline, VersionMode};

use super::{from_cwd, load_context};
use crate::output::{OutputFormat, format_elapsed, print_info, print_json, print_stat, print_success};

/// Which build-and-package chain to run.
#[derive(Debug, Clone, Copy)]
pub enum BuildKind {
  /// clean, compile, package working copy
  Clean,
  /// compile, package working copy
  Incremental,
  /// compile, package `test<counter>`
  Test,
}

pub(super) fn print_package(report: &PackageReport) {
  print_success(&format!("Packaged {}", report.artifact.display()));
  print_stat("Version", &format!("{} ({})", report.version.tag(), report.version.label));
}

pub(super) fn print_build(report: &BuildReport) {
  print_package(&report.package);
  print_stat("Compile time", &format_elapsed(report.compile.elapsed));
}

pub fn cmd_compile(config: Option<&Path>, args: &[String]) -> Result<()> {
  let ctx = load_context(config)?;
  let report = Pipeline::new(&ctx, &ProcessRunner)
    .compile(args)
    .context("Kernel build failed")?;

  print_success(&format!("Kernel built in {}", format_elapsed(report.elapsed)));
  Ok(())
}

pub fn cmd_clean(config: Option<&Path>) -> Result<()> {
  let ctx = load_context(config)?;
  Pipeline::new(&ctx, &ProcessRunner).clean().context("Clean failed")?;

  print_success("Build output cleaned");
  Ok(())
}

pub fn cmd_package(config: Option<&Path>, path: Option<&Path>, release: Option<&str>, output: OutputFormat) -> Result<()> {
  let ctx = load_context(config)?;
  let pipeline = Pipeline::new(&ctx, &ProcessRunner);
  let mode = VersionMode::from_release_or_env(release);

  let report = match path.map(from_cwd).transpose()? {
    Some(path) => pipeline.package(&path, &mode),
    None => pipeline.package_default(&mode),
  }
  .context("Packaging failed")?;

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_package(&report);
  }
  Ok(())
}

pub fn cmd_package_test(config: Option<&Path>, output: OutputFormat) -> Result<()> {
  let ctx = load_context(config)?;
  let report = Pipeline::new(&ctx, &ProcessRunner)
    .package_test()
    .context("Packaging failed")?;

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_package(&report);
  }
  Ok(())
}

pub fn cmd_reset_counter(config: Option<&Path>) -> Result<()> {
  let ctx = load_context(config)?;
  let removed = Pipeline::new(&ctx, &ProcessRunner)
    .reset_counter()
    .context("Failed to reset build counter")?;

  if removed {
    print_success("Build counter reset");
  } else {
    print_info("No build counter to reset");
  }
  Ok(())
}

pub fn cmd_release(config: Option<&Path>, version: &str, args: &[String], clean: bool, output: OutputFormat) -> Result<()> {
  let ctx = load_context(config)?;
  let pipeline = Pipeline::new(&ctx, &ProcessRunner);

  let report = if clean {
    pipeline.clean_release(version, args)
  } else {
    pipeline.release(version, args)
  }
  .with_context(|| format!("Release v{} failed", version))?;

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_build(&report);
  }
  Ok(())
}

pub fn cmd_build(config: Option<&Path>, kind: BuildKind, args: &[String], output: OutputFormat) -> Result<()> {
  let ctx = load_context(config)?;
  let pipeline = Pipeline::new(&ctx, &ProcessRunner);

  let report = match kind {
    BuildKind::Clean => pipeline.clean_build(args),
    BuildKind::Incremental => pipeline.incremental_build(args),
    BuildKind::Test => pipeline.test_build(args),
  }
  .context("Build failed")?;

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_build(&report);
  }
  Ok(())
}
