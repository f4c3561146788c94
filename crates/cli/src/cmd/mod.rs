mod build;
mod config;
mod device;
mod env;
mod info;
mod size;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use kdev_lib::config::locate_config;
use kdev_lib::context::BuildContext;

pub use build::{
  BuildKind, cmd_build, cmd_clean, cmd_compile, cmd_package, cmd_package_test, cmd_release, cmd_reset_counter,
};
pub use config::{cmd_config_commit, cmd_config_diff, cmd_config_edit, cmd_config_reset};
pub use device::{cmd_build_install, cmd_install};
pub use env::cmd_env;
pub use info::cmd_info;
pub use size::{cmd_size_objects, cmd_size_symbols};

/// Find and load `kdev.toml` for the current invocation.
fn load_context(explicit: Option<&Path>) -> Result<BuildContext> {
  let cwd = std::env::current_dir().context("Failed to determine current directory")?;
  let path = locate_config(explicit, &cwd)?;
  let ctx = BuildContext::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;
  debug!(root = %ctx.root().display(), "loaded build context");
  Ok(ctx)
}

/// Paths typed on the command line are relative to where the user stands,
/// not to the kernel root.
fn from_cwd(path: &Path) -> Result<PathBuf> {
  std::path::absolute(path).with_context(|| format!("Failed to resolve {}", path.display()))
}
