use std::fmt;

/// What kind of name a registry entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
  Variable,
  Function,
}

impl fmt::Display for EntryKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EntryKind::Variable => write!(f, "variable"),
      EntryKind::Function => write!(f, "function"),
    }
  }
}

/// Names introduced into an environment by setup, in registration order.
///
/// Append-only until cleared. Registering a name twice keeps both entries;
/// teardown treats the second removal as a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
  variables: Vec<String>,
  functions: Vec<String>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&mut self, name: impl Into<String>, kind: EntryKind) {
    match kind {
      EntryKind::Variable => self.variables.push(name.into()),
      EntryKind::Function => self.functions.push(name.into()),
    }
  }

  pub fn variables(&self) -> &[String] {
    &self.variables
  }

  pub fn functions(&self) -> &[String] {
    &self.functions
  }

  pub fn is_empty(&self) -> bool {
    self.variables.is_empty() && self.functions.is_empty()
  }

  pub fn clear(&mut self) {
    self.variables.clear();
    self.functions.clear();
  }
}
