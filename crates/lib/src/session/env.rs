//! The environment a session mutates.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use super::registry::EntryKind;
use crate::consts::ORIG_PATH_VAR;

const PATH_VAR: &str = "PATH";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
  #[error("{kind} {name} is not defined")]
  NotFound { kind: EntryKind, name: String },
}

/// What a helper function does when called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionBody {
  /// Call `program` with the session config, `args`, then the caller's arguments.
  Forward { program: String, args: Vec<String> },
  /// Evaluate `program env --teardown` in the calling shell.
  Teardown { program: String },
}

/// An environment that can hold variables and functions.
pub trait Environment {
  fn set_variable(&mut self, name: &str, value: &str);

  fn define_function(&mut self, name: &str, body: &FunctionBody);

  /// Put `dirs` in front of `PATH`. The original `PATH` is saved the first
  /// time only.
  fn prepend_path(&mut self, dirs: &[PathBuf]);

  /// Record `name` in the environment's own bookkeeping, if it keeps any.
  fn track(&mut self, _kind: EntryKind, _name: &str) {}
}

/// An environment a session can be taken back out of in the same process.
pub trait Reversible: Environment {
  fn remove_variable(&mut self, name: &str) -> Result<(), EnvError>;

  fn remove_function(&mut self, name: &str) -> Result<(), EnvError>;

  /// Restore the saved `PATH`. Returns whether anything was saved.
  fn restore_path(&mut self) -> bool;
}

/// In-process environment.
///
/// An empty `PATH` is treated like an unset one when it is restored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryEnvironment {
  variables: BTreeMap<String, String>,
  functions: BTreeMap<String, FunctionBody>,
}

impl MemoryEnvironment {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_variable(mut self, name: &str, value: &str) -> Self {
    self.set_variable(name, value);
    self
  }

  pub fn variable(&self, name: &str) -> Option<&str> {
    self.variables.get(name).map(String::as_str)
  }

  pub fn function(&self, name: &str) -> Option<&FunctionBody> {
    self.functions.get(name)
  }

  pub fn variables(&self) -> &BTreeMap<String, String> {
    &self.variables
  }

  pub fn functions(&self) -> &BTreeMap<String, FunctionBody> {
    &self.functions
  }
}

impl Environment for MemoryEnvironment {
  fn set_variable(&mut self, name: &str, value: &str) {
    self.variables.insert(name.to_string(), value.to_string());
  }

  fn define_function(&mut self, name: &str, body: &FunctionBody) {
    self.functions.insert(name.to_string(), body.clone());
  }

  fn prepend_path(&mut self, dirs: &[PathBuf]) {
    let current = self.variable(PATH_VAR).unwrap_or_default().to_string();
    if !self.variables.contains_key(ORIG_PATH_VAR) {
      self.set_variable(ORIG_PATH_VAR, &current);
    }

    let mut entries: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
    if !current.is_empty() {
      entries.push(current);
    }
    self.set_variable(PATH_VAR, &entries.join(":"));
  }
}

impl Reversible for MemoryEnvironment {
  fn remove_variable(&mut self, name: &str) -> Result<(), EnvError> {
    self.variables.remove(name).map(|_| ()).ok_or_else(|| EnvError::NotFound {
      kind: EntryKind::Variable,
      name: name.to_string(),
    })
  }

  fn remove_function(&mut self, name: &str) -> Result<(), EnvError> {
    self.functions.remove(name).map(|_| ()).ok_or_else(|| EnvError::NotFound {
      kind: EntryKind::Function,
      name: name.to_string(),
    })
  }

  fn restore_path(&mut self) -> bool {
    let Some(saved) = self.variables.remove(ORIG_PATH_VAR) else {
      return false;
    };
    if saved.is_empty() {
      self.variables.remove(PATH_VAR);
    } else {
      self.set_variable(PATH_VAR, &saved);
    }
    true
  }
}
