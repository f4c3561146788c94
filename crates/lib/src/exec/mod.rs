//! External command execution.
//!
//! Every tool kdev drives (`make`, `adb`, `fastboot`, `nm`, the packaging
//! script, the editor) goes through a [`CommandRunner`], so workflows can be
//! exercised against a scripted runner in tests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Errors from spawning or running an external command.
#[derive(Debug, Error)]
pub enum ExecError {
  #[error("failed to run {cmd}: {source}")]
  Spawn { cmd: String, source: std::io::Error },

  #[error("command failed with exit code {code:?}: {cmd}")]
  Failed { cmd: String, code: Option<i32> },
}

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
}

impl Invocation {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, dir: &Path) -> Self {
    self.cwd = Some(dir.to_path_buf());
    self
  }

  fn command(&self) -> Command {
    let mut command = Command::new(&self.program);
    command.args(&self.args);
    if let Some(cwd) = &self.cwd {
      command.current_dir(cwd);
    }
    command
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// Seam between workflows and the processes they start.
pub trait CommandRunner {
  /// Run to completion with the terminal attached.
  fn run(&self, invocation: &Invocation) -> Result<(), ExecError>;

  /// Run to completion and return stdout.
  fn output(&self, invocation: &Invocation) -> Result<String, ExecError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
  fn run(&self, invocation: &Invocation) -> Result<(), ExecError> {
    debug!(cmd = %invocation, cwd = ?invocation.cwd, "spawning process");

    let status = invocation.command().status().map_err(|source| ExecError::Spawn {
      cmd: invocation.to_string(),
      source,
    })?;

    if !status.success() {
      return Err(ExecError::Failed {
        cmd: invocation.to_string(),
        code: status.code(),
      });
    }

    Ok(())
  }

  fn output(&self, invocation: &Invocation) -> Result<String, ExecError> {
    debug!(cmd = %invocation, cwd = ?invocation.cwd, "spawning process");

    let output = invocation.command().output().map_err(|source| ExecError::Spawn {
      cmd: invocation.to_string(),
      source,
    })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }
      return Err(ExecError::Failed {
        cmd: invocation.to_string(),
        code: output.status.code(),
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }
}
