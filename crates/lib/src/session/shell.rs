//! Shell detection and setup/teardown script generation.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::env::{Environment, FunctionBody};
use super::registry::EntryKind;
use crate::consts::{CONFIG_ENV, ORIG_PATH_VAR, TRACKED_FUNCS_LIST, TRACKED_VARS_LIST};

/// Supported shell types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
  Bash,
  Zsh,
  Sh,
  Fish,
}

impl Shell {
  /// Detect the current shell from `$SHELL`, falling back to POSIX sh.
  pub fn detect() -> Self {
    let Ok(shell) = env::var("SHELL") else {
      return Shell::Sh;
    };
    let name = Path::new(&shell)
      .file_name()
      .and_then(|n| n.to_str())
      .unwrap_or("")
      .to_lowercase();

    match name.as_str() {
      "zsh" => Shell::Zsh,
      "bash" => Shell::Bash,
      "fish" => Shell::Fish,
      _ if name.contains("zsh") => Shell::Zsh,
      _ if name.contains("bash") => Shell::Bash,
      _ if name.contains("fish") => Shell::Fish,
      _ => Shell::Sh,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Shell::Bash => "bash",
      Shell::Zsh => "zsh",
      Shell::Sh => "sh",
      Shell::Fish => "fish",
    }
  }

  fn is_fish(&self) -> bool {
    matches!(self, Shell::Fish)
  }

  /// Quote `value` so the shell reads it literally.
  pub fn quote(&self, value: &str) -> String {
    if self.is_fish() {
      format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    } else {
      format!("'{}'", value.replace('\'', r"'\''"))
    }
  }

  pub fn export_var(&self, name: &str, value: &str) -> String {
    if self.is_fish() {
      format!("set -gx {} {}", name, self.quote(value))
    } else {
      format!("export {}={}", name, self.quote(value))
    }
  }

  /// Define a shell function named `name`.
  pub fn function(&self, name: &str, body: &FunctionBody) -> String {
    let command = match body {
      FunctionBody::Forward { program, args } => {
        let mut parts = vec![self.quote(program), "--config".to_string(), format!("\"${}\"", CONFIG_ENV)];
        parts.extend(args.iter().map(|arg| self.quote(arg)));
        parts.push(if self.is_fish() { "$argv" } else { "\"$@\"" }.to_string());
        parts.join(" ")
      }
      FunctionBody::Teardown { program } => {
        if self.is_fish() {
          format!("{} env --teardown --shell fish | source", self.quote(program))
        } else {
          format!("eval \"$({} env --teardown --shell {})\"", self.quote(program), self.as_str())
        }
      }
    };

    if self.is_fish() {
      format!("function {}; {}; end", name, command)
    } else {
      format!("{}() {{ {}; }}", name, command)
    }
  }

  /// Append `name` to the in-shell list for `kind`.
  pub fn track(&self, kind: EntryKind, name: &str) -> String {
    let list = list_name(kind);
    if self.is_fish() {
      format!("set -ga {} {}", list, name)
    } else {
      format!("{list}=\"${{{list}:+${list} }}{name}\"")
    }
  }

  /// Save `PATH` unless an earlier setup already did.
  pub fn save_path(&self) -> String {
    if self.is_fish() {
      format!("set -q {0}; or set -g {0} $PATH", ORIG_PATH_VAR)
    } else {
      format!("[ -n \"${{{0}+x}}\" ] || {0}=\"$PATH\"", ORIG_PATH_VAR)
    }
  }

  pub fn prepend_path(&self, dirs: &[PathBuf]) -> String {
    if self.is_fish() {
      let quoted: Vec<String> = dirs.iter().map(|d| self.quote(&d.display().to_string())).collect();
      format!("set -gx PATH {} $PATH", quoted.join(" "))
    } else {
      let joined: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
      format!("export PATH={}\"${{PATH:+:$PATH}}\"", self.quote(&joined.join(":")))
    }
  }

  /// Restore `PATH` from the saved value, if any.
  pub fn restore_path(&self) -> String {
    if self.is_fish() {
      format!("if set -q {0}; set -gx PATH ${0}; set -e {0}; end", ORIG_PATH_VAR)
    } else {
      format!(
        "if [ -n \"${{{0}+x}}\" ]; then if [ -n \"${0}\" ]; then export PATH=\"${0}\"; else unset PATH; fi; unset {0}; fi",
        ORIG_PATH_VAR
      )
    }
  }

  /// Script that removes every name recorded in the in-shell lists,
  /// restores `PATH` and drops the lists themselves.
  pub fn teardown_script(&self) -> String {
    let funcs = TRACKED_FUNCS_LIST;
    let vars = TRACKED_VARS_LIST;

    let lines = if self.is_fish() {
      vec![
        format!("for _kdev_name in ${funcs}; functions -e $_kdev_name 2>/dev/null; end"),
        format!("for _kdev_name in ${vars}; set -e $_kdev_name 2>/dev/null; end"),
        format!("set -e _kdev_name 2>/dev/null; set -e {funcs} 2>/dev/null; set -e {vars} 2>/dev/null; or true"),
        self.restore_path(),
      ]
    } else {
      // zsh does not split unquoted parameters without `=`
      let split = |list: &str| match self {
        Shell::Zsh => format!("${{={list}}}"),
        _ => format!("${{{list}-}}"),
      };
      vec![
        format!(
          "for _kdev_name in {}; do unset -f \"$_kdev_name\" 2>/dev/null || true; done",
          split(funcs)
        ),
        format!(
          "for _kdev_name in {}; do unset \"$_kdev_name\" 2>/dev/null || true; done",
          split(vars)
        ),
        format!("unset _kdev_name {funcs} {vars} 2>/dev/null || true"),
        self.restore_path(),
      ]
    };

    let mut script = lines.join("\n");
    script.push('\n');
    script
  }
}

fn list_name(kind: EntryKind) -> &'static str {
  match kind {
    EntryKind::Variable => TRACKED_VARS_LIST,
    EntryKind::Function => TRACKED_FUNCS_LIST,
  }
}

impl fmt::Display for Shell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Shell {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "bash" => Ok(Shell::Bash),
      "zsh" => Ok(Shell::Zsh),
      "sh" | "dash" | "posix" => Ok(Shell::Sh),
      "fish" => Ok(Shell::Fish),
      other => Err(format!("unsupported shell '{}' (expected bash, zsh, sh or fish)", other)),
    }
  }
}

/// An [`Environment`] that records its operations as shell statements.
///
/// Only setup is rendered this way. Every name is also tracked in the shell,
/// where [`Shell::teardown_script`] finds it later.
#[derive(Debug, Clone)]
pub struct ScriptEnvironment {
  shell: Shell,
  lines: Vec<String>,
}

impl ScriptEnvironment {
  pub fn new(shell: Shell) -> Self {
    Self {
      shell,
      lines: Vec::new(),
    }
  }

  pub fn shell(&self) -> Shell {
    self.shell
  }

  pub fn lines(&self) -> &[String] {
    &self.lines
  }

  pub fn render(&self) -> String {
    let mut script = self.lines.join("\n");
    script.push('\n');
    script
  }
}

impl Environment for ScriptEnvironment {
  fn set_variable(&mut self, name: &str, value: &str) {
    self.lines.push(self.shell.export_var(name, value));
  }

  fn define_function(&mut self, name: &str, body: &FunctionBody) {
    self.lines.push(self.shell.function(name, body));
  }

  fn prepend_path(&mut self, dirs: &[PathBuf]) {
    self.lines.push(self.shell.save_path());
    self.lines.push(self.shell.prepend_path(dirs));
  }

  fn track(&mut self, kind: EntryKind, name: &str) {
    self.lines.push(self.shell.track(kind, name));
  }
}
