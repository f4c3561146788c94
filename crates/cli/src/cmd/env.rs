use std::path::Path;

use anyhow::{Context, Result};

use kdev_lib::session::{ScriptEnvironment, Session, Shell};

use super::load_context;

/// Print the setup script, or with `teardown` the script that undoes every
/// earlier setup in the calling shell.
pub fn cmd_env(config: Option<&Path>, shell: Option<Shell>, teardown: bool) -> Result<()> {
  let shell = shell.unwrap_or_else(Shell::detect);

  if teardown {
    print!("{}", shell.teardown_script());
    return Ok(());
  }

  let ctx = load_context(config)?;
  let exe = std::env::current_exe().context("Failed to locate the kdev executable")?;
  let program = dunce::canonicalize(&exe).unwrap_or(exe);

  let mut script = ScriptEnvironment::new(shell);
  Session::new(&ctx, program.display().to_string()).initialize(&mut script);

  print!("{}", script.render());
  Ok(())
}
