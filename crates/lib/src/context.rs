//! Build context: the kernel tree plus its immutable configuration.
//!
//! Every workflow operation receives a `BuildContext` and derives its paths
//! from it instead of reading ambient state.

use std::path::{Path, PathBuf};

use crate::config::{BuildConfig, ConfigError};
use crate::consts::COUNTER_FILENAME;

#[derive(Debug, Clone)]
pub struct BuildContext {
  root: PathBuf,
  config_path: PathBuf,
  config: BuildConfig,
}

impl BuildContext {
  /// Create a context for a kernel tree rooted at `root`.
  pub fn new(root: PathBuf, config_path: PathBuf, config: BuildConfig) -> Self {
    Self {
      root,
      config_path,
      config,
    }
  }

  /// Load `config_path`; the kernel root is the directory containing it.
  pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
    let config = BuildConfig::load(config_path)?;
    let config_path = dunce::canonicalize(config_path).map_err(|source| ConfigError::Read {
      path: config_path.to_path_buf(),
      source,
    })?;
    let root = config_path
      .parent()
      .map(Path::to_path_buf)
      .ok_or_else(|| ConfigError::Invalid(format!("{} has no parent directory", config_path.display())))?;
    Ok(Self::new(root, config_path, config))
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn config_path(&self) -> &Path {
    &self.config_path
  }

  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  /// Resolve a path relative to the kernel root.
  pub fn resolve(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.root.join(path)
    }
  }

  pub fn out_dir(&self) -> PathBuf {
    self.resolve(&self.config.paths.out)
  }

  /// `<out>/arch/<arch>/boot`
  pub fn boot_dir(&self) -> PathBuf {
    self.out_dir().join("arch").join(&self.config.arch).join("boot")
  }

  pub fn image_path(&self) -> PathBuf {
    self.boot_dir().join(&self.config.paths.image)
  }

  pub fn dtb_dir(&self) -> PathBuf {
    self.boot_dir().join("dts")
  }

  pub fn default_install_image(&self) -> PathBuf {
    self.boot_dir().join(&self.config.paths.install_image)
  }

  pub fn vmlinux(&self) -> PathBuf {
    self.out_dir().join("vmlinux")
  }

  pub fn counter_file(&self) -> PathBuf {
    self.out_dir().join(COUNTER_FILENAME)
  }

  /// Checked-in baseline: `arch/<arch>/configs/<defconfig>`
  pub fn baseline_config(&self) -> PathBuf {
    self
      .root
      .join("arch")
      .join(&self.config.arch)
      .join("configs")
      .join(&self.config.defconfig)
  }

  pub fn generated_config(&self) -> PathBuf {
    self.out_dir().join(".config")
  }

  pub fn payload_dir(&self) -> PathBuf {
    self.resolve(&self.config.paths.payload)
  }

  pub fn package_script(&self) -> PathBuf {
    match &self.config.paths.package_script {
      Some(script) => self.resolve(script),
      None => self.payload_dir().join("build.sh"),
    }
  }

  pub fn builds_dir(&self) -> PathBuf {
    self.resolve(&self.config.paths.builds)
  }

  /// `<builds>/<kernel>-<device>-<tag>.zip`
  pub fn artifact_path(&self, tag: &str) -> PathBuf {
    self.builds_dir().join(format!(
      "{}-{}-{}.zip",
      self.config.kernel_name, self.config.device_name, tag
    ))
  }

  /// Untagged artifact overwritten by every working-copy build.
  pub fn working_copy_artifact(&self) -> PathBuf {
    self
      .builds_dir()
      .join(format!("{}-{}.zip", self.config.kernel_name, self.config.device_name))
  }

  /// Arguments shared by every `make` invocation:
  /// `-j<jobs> ARCH=<arch> O=<out> <profile flags> <flags>`.
  pub fn make_args(&self) -> Vec<String> {
    let mut args = vec![
      format!("-j{}", self.config.jobs()),
      format!("ARCH={}", self.config.arch),
      format!("O={}", self.out_dir().display()),
    ];
    args.extend(self.config.profile_flags());
    args.extend(self.config.flags.iter().cloned());
    args
  }

  /// Toolchain directories resolved against the kernel root.
  pub fn toolchain_dirs(&self) -> Vec<PathBuf> {
    self.config.toolchain_path.iter().map(|dir| self.resolve(dir)).collect()
  }
}
