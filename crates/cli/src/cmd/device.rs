use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use kdev_lib::exec::ProcessRunner;
use kdev_lib::workflow::{BuildReport, InstallReport, Pipeline};

use super::build::print_build;
use super::{from_cwd, load_context};
use crate::output::{OutputFormat, print_json, print_success, print_warning};

fn print_install(report: &InstallReport) {
  if !report.rebooted_from_recovery && !report.rebooted_from_system {
    print_warning("No booted device seen by adb; assuming it is already in the bootloader");
  }
  print_success(&format!("Booted {}", report.image.display()));
}

pub fn cmd_install(config: Option<&Path>, image: Option<&Path>, output: OutputFormat) -> Result<()> {
  let ctx = load_context(config)?;
  let image = image.map(from_cwd).transpose()?;
  let report = Pipeline::new(&ctx, &ProcessRunner)
    .install(image.as_deref())
    .context("Failed to boot kernel image")?;

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_install(&report);
  }
  Ok(())
}

#[derive(Serialize)]
struct BuildInstallReport {
  build: BuildReport,
  install: InstallReport,
}

pub fn cmd_build_install(config: Option<&Path>, args: &[String], output: OutputFormat) -> Result<()> {
  let ctx = load_context(config)?;
  let (build, install) = Pipeline::new(&ctx, &ProcessRunner)
    .build_and_install(args)
    .context("Build and install failed")?;

  if output.is_json() {
    print_json(&BuildInstallReport { build, install })?;
  } else {
    print_build(&build);
    print_install(&install);
  }
  Ok(())
}
