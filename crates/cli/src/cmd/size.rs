use std::path::Path;

use anyhow::{Context, Result};

use kdev_lib::exec::ProcessRunner;
use kdev_lib::inspect::{object_size_report, symbol_size_report};

use super::load_context;
use crate::output::{OutputFormat, print_json, print_size_row};

pub fn cmd_size_objects(config: Option<&Path>, limit: usize, output: OutputFormat) -> Result<()> {
  let ctx = load_context(config)?;
  let objects = object_size_report(&ctx, limit).context("Failed to scan build output")?;

  if output.is_json() {
    print_json(&objects)?;
  } else {
    for object in &objects {
      print_size_row(object.size, &[object.name.as_str()]);
    }
  }
  Ok(())
}

pub fn cmd_size_symbols(config: Option<&Path>, limit: usize, output: OutputFormat) -> Result<()> {
  let ctx = load_context(config)?;
  let symbols = symbol_size_report(&ctx, &ProcessRunner, limit).context("Failed to read vmlinux symbols")?;

  if output.is_json() {
    print_json(&symbols)?;
  } else {
    for symbol in &symbols {
      print_size_row(symbol.size, &[symbol.kind.to_string().as_str(), symbol.name.as_str()]);
    }
  }
  Ok(())
}
