//! Compiler profiles.
//!
//! A profile contributes the toolchain selection flags that are appended to
//! every `make` invocation after the architecture and output directory.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerProfile {
  #[default]
  Gcc,
  Clang,
}

impl CompilerProfile {
  pub fn as_str(&self) -> &'static str {
    match self {
      CompilerProfile::Gcc => "gcc",
      CompilerProfile::Clang => "clang",
    }
  }

  /// Flags passed to `make` for this profile.
  ///
  /// Empty cross-compile prefixes are omitted so native builds work.
  pub fn make_flags(&self, cross_compile: &str, cross_compile_arm32: &str) -> Vec<String> {
    let mut flags = Vec::new();

    if *self == CompilerProfile::Clang {
      flags.push("CC=clang".to_string());
      if !cross_compile.is_empty() {
        flags.push(format!("CLANG_TRIPLE={}", cross_compile));
      }
    }

    if !cross_compile.is_empty() {
      flags.push(format!("CROSS_COMPILE={}", cross_compile));
    }
    if !cross_compile_arm32.is_empty() {
      flags.push(format!("CROSS_COMPILE_ARM32={}", cross_compile_arm32));
    }

    flags
  }
}

impl fmt::Display for CompilerProfile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
