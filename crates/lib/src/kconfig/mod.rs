//! Kernel configuration inspection and editing.
//!
//! The checked-in baseline lives at `arch/<arch>/configs/<defconfig>`; kbuild
//! generates the working configuration at `<out>/.config`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::consts::{DEFAULT_EDITOR, EDITOR_ENV};
use crate::context::BuildContext;
use crate::exec::{CommandRunner, ExecError, Invocation};

#[derive(Debug, Error)]
pub enum KconfigError {
  #[error("config file not found: {}", path.display())]
  Missing { path: PathBuf },

  #[error("io error at {}: {source}", path.display())]
  Io { path: PathBuf, source: std::io::Error },

  #[error("editor command is empty")]
  EmptyEditor,

  #[error(transparent)]
  Exec(#[from] ExecError),
}

/// Option name to value. `# CONFIG_X is not set` is recorded as `n`.
pub type KconfigOptions = BTreeMap<String, String>;

/// Parse a kconfig file into its options. Other comments and blank lines are
/// ignored.
pub fn parse_kconfig(text: &str) -> KconfigOptions {
  let mut options = BTreeMap::new();
  for line in text.lines().map(str::trim) {
    let entry = match line.strip_prefix("# ") {
      Some(comment) => comment.strip_suffix(" is not set").map(|name| (name, "n")),
      None => line.split_once('='),
    };
    if let Some((name, value)) = entry.filter(|(name, _)| name.starts_with("CONFIG_")) {
      options.insert(name.to_string(), value.to_string());
    }
  }
  options
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum ConfigChange {
  Removed { name: String, value: String },
  Added { name: String, value: String },
  Changed { name: String, from: String, to: String },
}

impl fmt::Display for ConfigChange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigChange::Removed { name, value } => write!(f, "-{} {}", name, value),
      ConfigChange::Added { name, value } => write!(f, "+{} {}", name, value),
      ConfigChange::Changed { name, from, to } => write!(f, "{} {} -> {}", name, from, to),
    }
  }
}

/// Option-level difference between two configurations, ordered by option name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigDiff {
  pub changes: Vec<ConfigChange>,
}

impl ConfigDiff {
  pub fn between(baseline: &KconfigOptions, current: &KconfigOptions) -> Self {
    let mut names: Vec<&String> = baseline.keys().chain(current.keys()).collect();
    names.sort();
    names.dedup();

    let changes = names
      .into_iter()
      .filter_map(|name| match (baseline.get(name), current.get(name)) {
        (Some(from), Some(to)) if from != to => Some(ConfigChange::Changed {
          name: name.clone(),
          from: from.clone(),
          to: to.clone(),
        }),
        (Some(value), None) => Some(ConfigChange::Removed {
          name: name.clone(),
          value: value.clone(),
        }),
        (None, Some(value)) => Some(ConfigChange::Added {
          name: name.clone(),
          value: value.clone(),
        }),
        _ => None,
      })
      .collect();

    Self { changes }
  }

  pub fn is_empty(&self) -> bool {
    self.changes.is_empty()
  }
}

impl fmt::Display for ConfigDiff {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for change in &self.changes {
      writeln!(f, "{}", change)?;
    }
    Ok(())
  }
}

fn read_config(path: &Path) -> Result<String, KconfigError> {
  fs::read_to_string(path).map_err(|source| match source.kind() {
    ErrorKind::NotFound => KconfigError::Missing {
      path: path.to_path_buf(),
    },
    _ => KconfigError::Io {
      path: path.to_path_buf(),
      source,
    },
  })
}

/// Compare the baseline against the generated configuration.
pub fn diff_config(ctx: &BuildContext) -> Result<ConfigDiff, KconfigError> {
  let baseline = parse_kconfig(&read_config(&ctx.baseline_config())?);
  let current = parse_kconfig(&read_config(&ctx.generated_config())?);
  Ok(ConfigDiff::between(&baseline, &current))
}

/// Overwrite the baseline with the generated configuration.
pub fn commit_config(ctx: &BuildContext) -> Result<PathBuf, KconfigError> {
  let generated = ctx.generated_config();
  let baseline = ctx.baseline_config();
  let content = read_config(&generated)?;

  if let Some(parent) = baseline.parent() {
    fs::create_dir_all(parent).map_err(|source| KconfigError::Io {
      path: parent.to_path_buf(),
      source,
    })?;
  }
  fs::write(&baseline, content).map_err(|source| KconfigError::Io {
    path: baseline.clone(),
    source,
  })?;

  info!(baseline = %baseline.display(), "committed generated config");
  Ok(baseline)
}

fn make_target<R: CommandRunner + ?Sized>(ctx: &BuildContext, runner: &R, target: &str) -> Result<(), KconfigError> {
  runner.run(
    &Invocation::new(&ctx.config().tools.make)
      .args(ctx.make_args())
      .arg(target)
      .current_dir(ctx.root()),
  )?;
  Ok(())
}

/// Regenerate `<out>/.config` from the baseline with `make <defconfig>`.
pub fn reset_config<R: CommandRunner + ?Sized>(ctx: &BuildContext, runner: &R) -> Result<(), KconfigError> {
  make_target(ctx, runner, &ctx.config().defconfig)
}

pub fn edit_config_interactive<R: CommandRunner + ?Sized>(ctx: &BuildContext, runner: &R) -> Result<(), KconfigError> {
  make_target(ctx, runner, "menuconfig")
}

/// Editor command: explicit value, then `$EDITOR`, then `vi`.
pub fn resolve_editor(explicit: Option<&str>) -> String {
  explicit
    .map(str::to_string)
    .or_else(|| std::env::var(EDITOR_ENV).ok())
    .filter(|editor| !editor.trim().is_empty())
    .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

/// Open the generated configuration in a text editor.
pub fn edit_config_raw<R: CommandRunner + ?Sized>(
  ctx: &BuildContext,
  runner: &R,
  editor: Option<&str>,
) -> Result<(), KconfigError> {
  let editor = resolve_editor(editor);
  let mut words = editor.split_whitespace();
  let program = words.next().ok_or(KconfigError::EmptyEditor)?;

  runner.run(
    &Invocation::new(program)
      .args(words)
      .arg(ctx.generated_config().to_string_lossy()),
  )?;
  Ok(())
}
