use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use kdev_lib::exec::ProcessRunner;
use kdev_lib::kconfig::{
  ConfigChange, commit_config, diff_config, edit_config_interactive, edit_config_raw, reset_config,
};

use super::load_context;
use crate::output::{OutputFormat, print_info, print_json, print_success, symbols};

fn print_change(change: &ConfigChange) {
  match change {
    ConfigChange::Removed { name, value } => println!(
      "  {} {} {}",
      symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()),
      name,
      value
    ),
    ConfigChange::Added { name, value } => println!(
      "  {} {} {}",
      symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()),
      name,
      value
    ),
    ConfigChange::Changed { name, from, to } => println!(
      "  {} {} {} {} {}",
      symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()),
      name,
      from,
      symbols::ARROW,
      to
    ),
  }
}

pub fn cmd_config_diff(config: Option<&Path>, output: OutputFormat) -> Result<()> {
  let ctx = load_context(config)?;
  let diff = diff_config(&ctx).context("Failed to diff kernel config")?;

  if output.is_json() {
    print_json(&diff)?;
  } else if diff.is_empty() {
    print_info(&format!("{} matches the generated config", ctx.config().defconfig));
  } else {
    for change in &diff.changes {
      print_change(change);
    }
  }
  Ok(())
}

pub fn cmd_config_commit(config: Option<&Path>) -> Result<()> {
  let ctx = load_context(config)?;
  let baseline = commit_config(&ctx).context("Failed to commit kernel config")?;

  print_success(&format!("Saved generated config to {}", baseline.display()));
  Ok(())
}

pub fn cmd_config_reset(config: Option<&Path>) -> Result<()> {
  let ctx = load_context(config)?;
  reset_config(&ctx, &ProcessRunner).context("Failed to regenerate kernel config")?;

  print_success(&format!("Regenerated config from {}", ctx.config().defconfig));
  Ok(())
}

pub fn cmd_config_edit(config: Option<&Path>, raw: bool, editor: Option<&str>) -> Result<()> {
  let ctx = load_context(config)?;
  if raw {
    edit_config_raw(&ctx, &ProcessRunner, editor).context("Editor failed")?;
  } else {
    edit_config_interactive(&ctx, &ProcessRunner).context("menuconfig failed")?;
  }
  Ok(())
}
