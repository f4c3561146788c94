//! Shell session lifecycle.
//!
//! A [`Session`] introduces the kernel variables and helper functions into an
//! [`Environment`], remembering each name in a [`Registry`] so that
//! [`Session::shutdown`] can take them all back out again.

mod env;
mod registry;
mod shell;

use tracing::{debug, info};

use crate::consts::{CONFIG_ENV, ROOT_ENV};
use crate::context::BuildContext;

pub use env::{EnvError, Environment, FunctionBody, MemoryEnvironment, Reversible};
pub use registry::{EntryKind, Registry};
pub use shell::{ScriptEnvironment, Shell};

/// A shell function forwarding to a `kdev` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Helper {
  pub name: &'static str,
  pub args: &'static [&'static str],
}

const fn helper(name: &'static str, args: &'static [&'static str]) -> Helper {
  Helper { name, args }
}

/// Helper functions defined by setup.
pub const HELPERS: &[Helper] = &[
  helper("kmake", &["compile"]),
  helper("kclean", &["clean"]),
  helper("mkzip", &["package"]),
  helper("dzip", &["package-test"]),
  helper("zerover", &["reset-counter"]),
  helper("rel", &["release"]),
  helper("crel", &["clean-release"]),
  helper("cleanbuild", &["clean-build"]),
  helper("incbuild", &["inc-build"]),
  helper("dbuild", &["test-build"]),
  helper("ktest", &["install"]),
  helper("inc", &["build-install"]),
  helper("dc", &["config", "diff"]),
  helper("cpc", &["config", "commit"]),
  helper("mc", &["config", "reset"]),
  helper("cf", &["config", "edit"]),
  helper("ec", &["config", "edit", "--raw"]),
  helper("osize", &["size", "objects"]),
  helper("ssize", &["size", "symbols"]),
];

/// The function that undoes setup.
pub const TEARDOWN_HELPER: &str = "unsetup";

pub struct Session<'a> {
  ctx: &'a BuildContext,
  program: String,
  registry: Registry,
}

impl<'a> Session<'a> {
  /// `program` is what the helper functions invoke, normally the absolute
  /// path of the running binary.
  pub fn new(ctx: &'a BuildContext, program: impl Into<String>) -> Self {
    Self {
      ctx,
      program: program.into(),
      registry: Registry::new(),
    }
  }

  pub fn registry(&self) -> &Registry {
    &self.registry
  }

  fn variables(&self) -> Vec<(&'static str, String)> {
    let config = self.ctx.config();
    vec![
      (ROOT_ENV, self.ctx.root().display().to_string()),
      (CONFIG_ENV, self.ctx.config_path().display().to_string()),
      ("kernel_name", config.kernel_name.clone()),
      ("device_name", config.device_name.clone()),
      ("defconfig", config.defconfig.clone()),
      ("arch", config.arch.clone()),
    ]
  }

  fn register<E: Environment + ?Sized>(&mut self, env: &mut E, kind: EntryKind, name: &str) {
    env.track(kind, name);
    self.registry.register(name, kind);
  }

  /// Define the session variables and helper functions in `env`.
  ///
  /// Calling this again without a shutdown only adds duplicate registry
  /// entries.
  pub fn initialize<E: Environment + ?Sized>(&mut self, env: &mut E) {
    for (name, value) in self.variables() {
      env.set_variable(name, &value);
      self.register(env, EntryKind::Variable, name);
    }

    for helper in HELPERS {
      let body = FunctionBody::Forward {
        program: self.program.clone(),
        args: helper.args.iter().map(|arg| arg.to_string()).collect(),
      };
      env.define_function(helper.name, &body);
      self.register(env, EntryKind::Function, helper.name);
    }

    let teardown = FunctionBody::Teardown {
      program: self.program.clone(),
    };
    env.define_function(TEARDOWN_HELPER, &teardown);
    self.register(env, EntryKind::Function, TEARDOWN_HELPER);

    let toolchains = self.ctx.toolchain_dirs();
    if !toolchains.is_empty() {
      env.prepend_path(&toolchains);
    }

    info!(
      kernel = %self.ctx.config().kernel_name,
      device = %self.ctx.config().device_name,
      functions = self.registry.functions().len(),
      "session initialized"
    );
  }

  /// Remove everything this session introduced. Always succeeds; names that
  /// are already gone are skipped.
  ///
  /// A real shell outlives the process that set it up, so it is torn down
  /// by [`Shell::teardown_script`] walking the names tracked in the shell
  /// instead.
  pub fn shutdown<E: Reversible + ?Sized>(&mut self, env: &mut E) {
    for name in self.registry.functions() {
      if let Err(e) = env.remove_function(name) {
        debug!(error = %e, "skipping");
      }
    }
    for name in self.registry.variables() {
      if let Err(e) = env.remove_variable(name) {
        debug!(error = %e, "skipping");
      }
    }
    if env.restore_path() {
      debug!("restored PATH");
    }
    self.registry.clear();
  }
}
