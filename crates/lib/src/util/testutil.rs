//! Test utilities for kdev-lib.
//!
//! [`FakeRunner`] stands in for the external tools. It records every
//! invocation and lets a test script stdout, failures and side effects by
//! matching a substring of the rendered command line.

use std::cell::RefCell;
use std::path::Path;

use crate::config::BuildConfig;
use crate::context::BuildContext;
use crate::exec::{CommandRunner, ExecError, Invocation};

type Hook = Box<dyn Fn(&Invocation)>;

#[derive(Default)]
pub struct FakeRunner {
  calls: RefCell<Vec<Invocation>>,
  outputs: Vec<(String, String)>,
  failures: Vec<String>,
  hooks: Vec<(String, Hook)>,
}

impl FakeRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Return `stdout` for commands containing `pattern`.
  pub fn respond(mut self, pattern: &str, stdout: &str) -> Self {
    self.outputs.push((pattern.to_string(), stdout.to_string()));
    self
  }

  /// Fail commands containing `pattern` with exit code 1.
  pub fn fail(mut self, pattern: &str) -> Self {
    self.failures.push(pattern.to_string());
    self
  }

  /// Run `hook` for commands containing `pattern`, before any scripted failure.
  pub fn on(mut self, pattern: &str, hook: impl Fn(&Invocation) + 'static) -> Self {
    self.hooks.push((pattern.to_string(), Box::new(hook)));
    self
  }

  pub fn calls(&self) -> Vec<Invocation> {
    self.calls.borrow().clone()
  }

  /// Rendered command lines in call order.
  pub fn commands(&self) -> Vec<String> {
    self.calls.borrow().iter().map(|inv| inv.to_string()).collect()
  }

  pub fn count(&self, pattern: &str) -> usize {
    self.commands().iter().filter(|cmd| cmd.contains(pattern)).count()
  }

  fn dispatch(&self, invocation: &Invocation) -> Result<String, ExecError> {
    self.calls.borrow_mut().push(invocation.clone());
    let rendered = invocation.to_string();

    for (pattern, hook) in &self.hooks {
      if rendered.contains(pattern.as_str()) {
        hook(invocation);
      }
    }

    if self.failures.iter().any(|pattern| rendered.contains(pattern.as_str())) {
      return Err(ExecError::Failed {
        cmd: rendered,
        code: Some(1),
      });
    }

    Ok(
      self
        .outputs
        .iter()
        .find(|(pattern, _)| rendered.contains(pattern.as_str()))
        .map(|(_, stdout)| stdout.clone())
        .unwrap_or_default(),
    )
  }
}

impl CommandRunner for FakeRunner {
  fn run(&self, invocation: &Invocation) -> Result<(), ExecError> {
    self.dispatch(invocation).map(|_| ())
  }

  fn output(&self, invocation: &Invocation) -> Result<String, ExecError> {
    self.dispatch(invocation)
  }
}

pub const TEST_CONFIG: &str = r#"
kernel_name = "proton"
defconfig = "proton_defconfig"
arch = "arm64"
device_name = "coral"
jobs = 4
"#;

/// A context rooted at `root` using [`TEST_CONFIG`].
pub fn test_context(root: &Path) -> BuildContext {
  let config = BuildConfig::from_toml(TEST_CONFIG, Path::new("kdev.toml")).unwrap();
  BuildContext::new(root.to_path_buf(), root.join("kdev.toml"), config)
}

/// Lay out the artifacts a successful kernel build leaves behind.
pub fn write_build_outputs(ctx: &BuildContext, counter: &str) {
  let boot = ctx.boot_dir();
  std::fs::create_dir_all(ctx.dtb_dir().join("qcom")).unwrap();
  std::fs::write(boot.join("Image.gz"), b"kernel-image").unwrap();
  std::fs::write(ctx.dtb_dir().join("qcom/sm8150-v1.dtb"), b"dtb-a;").unwrap();
  std::fs::write(ctx.dtb_dir().join("qcom/sm8150-v2.dtb"), b"dtb-b;").unwrap();
  std::fs::write(ctx.counter_file(), format!("{}\n", counter)).unwrap();
  std::fs::create_dir_all(ctx.payload_dir()).unwrap();
}

/// Hook that behaves like a packaging script: writes a zip marker at the
/// path passed as the first argument.
pub fn fake_packager(invocation: &Invocation) {
  let output = Path::new(&invocation.args[0]);
  std::fs::write(output, b"fresh-zip").unwrap();
}
