//! Build configuration loaded from `kdev.toml`.
//!
//! The configuration is read once per invocation and is immutable afterwards.
//! A handful of values can be overridden from the environment:
//! - `KDEV_CONFIG` selects the configuration file
//! - `KDEV_JOBS` overrides the make parallelism
//! - `RELEASE_VER` selects release packaging (see [`crate::workflow::VersionMode`])

mod profile;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::{CONFIG_ENV, CONFIG_FILENAME, JOBS_ENV};

pub use profile::CompilerProfile;

const FALLBACK_JOBS: usize = 4;

/// Errors that can occur while locating or loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("no kdev.toml found in {} or any parent directory", start.display())]
  NotFound { start: PathBuf },

  #[error("config file not found: {}", path.display())]
  Missing { path: PathBuf },

  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse {}: {source}", path.display())]
  Parse { path: PathBuf, source: toml::de::Error },

  #[error("invalid config: {0}")]
  Invalid(String),
}

/// Output locations and artifact names, relative to the kernel root unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
  /// Kernel build output directory (`O=`)
  pub out: PathBuf,
  /// Staging payload directory consumed by the packaging script
  pub payload: PathBuf,
  /// Destination directory for packaged zips
  pub builds: PathBuf,
  /// Kernel image file name under `arch/<arch>/boot`
  pub image: String,
  /// Image booted by `install` when none is given
  pub install_image: String,
  /// Packaging script; defaults to `<payload>/build.sh`
  pub package_script: Option<PathBuf>,
}

impl Default for PathsConfig {
  fn default() -> Self {
    Self {
      out: PathBuf::from("out"),
      payload: PathBuf::from("flasher"),
      builds: PathBuf::from("builds"),
      image: "Image.gz".to_string(),
      install_image: "Image.gz-dtb".to_string(),
      package_script: None,
    }
  }
}

/// External programs, overridable for wrappers and testing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
  pub make: String,
  pub adb: String,
  pub fastboot: String,
  pub nm: String,
}

impl Default for ToolsConfig {
  fn default() -> Self {
    Self {
      make: "make".to_string(),
      adb: "adb".to_string(),
      fastboot: "fastboot".to_string(),
      nm: "nm".to_string(),
    }
  }
}

/// The fixed build configuration for a kernel tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
  pub kernel_name: String,
  pub defconfig: String,
  pub arch: String,
  pub device_name: String,
  /// Base flags appended to every `make` invocation
  #[serde(default)]
  pub flags: Vec<String>,
  #[serde(default)]
  pub compiler: CompilerProfile,
  #[serde(default = "default_cross_compile")]
  pub cross_compile: String,
  #[serde(default = "default_cross_compile_arm32")]
  pub cross_compile_arm32: String,
  #[serde(default)]
  pub jobs: Option<usize>,
  /// Directories prepended to `PATH` by the shell setup
  #[serde(default)]
  pub toolchain_path: Vec<PathBuf>,
  #[serde(default)]
  pub paths: PathsConfig,
  #[serde(default)]
  pub tools: ToolsConfig,
}

fn default_cross_compile() -> String {
  "aarch64-linux-gnu-".to_string()
}

fn default_cross_compile_arm32() -> String {
  "arm-linux-gnueabi-".to_string()
}

impl BuildConfig {
  /// Parse and validate configuration text. `origin` is only used in error messages.
  pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
    let config: BuildConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
      path: origin.to_path_buf(),
      source,
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Load configuration from a file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    if !path.is_file() {
      return Err(ConfigError::Missing {
        path: path.to_path_buf(),
      });
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), "loaded config");
    Self::from_toml(&text, path)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    for (key, value) in [
      ("kernel_name", &self.kernel_name),
      ("defconfig", &self.defconfig),
      ("arch", &self.arch),
      ("device_name", &self.device_name),
    ] {
      if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("`{}` must not be empty", key)));
      }
    }

    if self.arch.contains('/') || self.arch.contains('\\') {
      return Err(ConfigError::Invalid(format!(
        "`arch` must be a bare architecture name, got {:?}",
        self.arch
      )));
    }

    if self.jobs == Some(0) {
      return Err(ConfigError::Invalid("`jobs` must be at least 1".to_string()));
    }

    Ok(())
  }

  /// Make parallelism: `KDEV_JOBS`, then `jobs`, then the detected CPU count.
  pub fn jobs(&self) -> usize {
    if let Ok(value) = std::env::var(JOBS_ENV) {
      match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => return n,
        _ => warn!(value = %value, "ignoring invalid {}", JOBS_ENV),
      }
    }

    if let Some(jobs) = self.jobs {
      return jobs;
    }

    match std::thread::available_parallelism() {
      Ok(n) => n.get(),
      Err(e) => {
        warn!(error = %e, "could not detect CPU count, using {} jobs", FALLBACK_JOBS);
        FALLBACK_JOBS
      }
    }
  }

  /// Toolchain selection flags from the compiler profile.
  pub fn profile_flags(&self) -> Vec<String> {
    self
      .compiler
      .make_flags(&self.cross_compile, &self.cross_compile_arm32)
  }
}

/// Resolve which configuration file to use.
///
/// Precedence: the explicit path, then `KDEV_CONFIG`, then the nearest
/// `kdev.toml` walking upward from `start`.
pub fn locate_config(explicit: Option<&Path>, start: &Path) -> Result<PathBuf, ConfigError> {
  if let Some(path) = explicit {
    return existing(path.to_path_buf());
  }

  if let Ok(path) = std::env::var(CONFIG_ENV) {
    if !path.is_empty() {
      return existing(PathBuf::from(path));
    }
  }

  start
    .ancestors()
    .map(|dir| dir.join(CONFIG_FILENAME))
    .find(|candidate| candidate.is_file())
    .ok_or_else(|| ConfigError::NotFound {
      start: start.to_path_buf(),
    })
}

fn existing(path: PathBuf) -> Result<PathBuf, ConfigError> {
  if path.is_file() {
    Ok(path)
  } else {
    Err(ConfigError::Missing { path })
  }
}
