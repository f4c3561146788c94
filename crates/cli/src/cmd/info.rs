use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use kdev_lib::config::BuildConfig;

use super::load_context;
use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Serialize)]
struct InfoReport<'a> {
  root: &'a Path,
  config_path: &'a Path,
  config: &'a BuildConfig,
  jobs: usize,
  make_args: Vec<String>,
  out_dir: PathBuf,
  baseline_config: PathBuf,
  package_script: PathBuf,
}

pub fn cmd_info(config: Option<&Path>, output: OutputFormat) -> Result<()> {
  let ctx = load_context(config)?;
  let build = ctx.config();

  if output.is_json() {
    return print_json(&InfoReport {
      root: ctx.root(),
      config_path: ctx.config_path(),
      config: build,
      jobs: build.jobs(),
      make_args: ctx.make_args(),
      out_dir: ctx.out_dir(),
      baseline_config: ctx.baseline_config(),
      package_script: ctx.package_script(),
    });
  }

  println!("Kernel:");
  print_stat("Name", &build.kernel_name);
  print_stat("Device", &build.device_name);
  print_stat("Arch", &build.arch);
  print_stat("Defconfig", &build.defconfig);
  print_stat("Compiler", build.compiler.as_str());
  print_stat("Jobs", &build.jobs().to_string());
  println!("Paths:");
  print_stat("Root", &ctx.root().display().to_string());
  print_stat("Config", &ctx.config_path().display().to_string());
  print_stat("Output", &ctx.out_dir().display().to_string());
  print_stat("Payload", &ctx.payload_dir().display().to_string());
  print_stat("Builds", &ctx.builds_dir().display().to_string());
  println!("Make:");
  print_stat("Args", &ctx.make_args().join(" "));
  Ok(())
}
