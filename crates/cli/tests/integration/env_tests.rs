use std::process::{Command as StdCommand, ExitStatus};

use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

/// Checks after two setups and an `unsetup`, for sh, bash and zsh.
const POSIX_TEARDOWN_CHECKS: &str = r#"
unsetup
command -v kmake >/dev/null && exit 20
command -v unsetup >/dev/null && exit 21
[ -z "${arch+x}" ] || exit 22
[ -z "${KDEV_CONFIG+x}" ] || exit 23
[ -z "${_kdev_funcs+x}" ] || exit 24
[ "$PATH" = "$orig_path" ] || exit 25
exit 0
"#;

const FISH_TEARDOWN_CHECKS: &str = r#"
unsetup
functions -q kmake; and exit 20
functions -q unsetup; and exit 21
set -q arch; and exit 22
set -q KDEV_CONFIG; and exit 23
set -q _kdev_funcs; and exit 24
test "$PATH" = "$orig_path"; or exit 25
exit 0
"#;

fn shell_available(shell: &str) -> bool {
  StdCommand::new(shell)
    .args(["-c", "exit 0"])
    .status()
    .is_ok_and(|status| status.success())
}

/// Source the setup script `setups` times in a real `shell`, then run `checks`.
fn run_in_shell(env: &TestEnv, shell: &str, setups: usize, checks: &str) -> ExitStatus {
  let assert = env.kdev_cmd().args(["env", "--shell", shell]).assert().success();
  let setup = format!("setup.{}", shell);
  env.write_file(&setup, &String::from_utf8(assert.get_output().stdout.clone()).unwrap());

  let (save_path, source) = if shell == "fish" {
    ("set -g orig_path $PATH\n", format!("source ./{}\n", setup))
  } else {
    ("orig_path=\"$PATH\"\n", format!(". ./{}\n", setup))
  };
  let script = format!("{}{}{}", save_path, source.repeat(setups), checks);

  StdCommand::new(shell)
    .arg("-c")
    .arg(script)
    .current_dir(&env.root)
    .env_remove("KDEV_CONFIG")
    .env_remove("KDEV_TEST_FAIL")
    .status()
    .unwrap()
}

#[test]
#[serial]
fn setup_script_defines_helpers() {
  let env = TestEnv::new();

  env
    .kdev_cmd()
    .args(["env", "--shell", "bash"])
    .assert()
    .success()
    .stdout(predicate::str::contains("export arch='arm64'"))
    .stdout(predicate::str::contains("kmake() {"))
    .stdout(predicate::str::contains("unsetup() {"))
    .stdout(predicate::str::contains("toolchain/bin"));
}

#[test]
#[serial]
fn helpers_forward_to_subcommands() {
  let env = TestEnv::new();

  let status = run_in_shell(
    &env,
    "sh",
    1,
    r#"
command -v kmake >/dev/null || exit 10
[ "$arch" = arm64 ] || exit 11
case "$PATH" in */toolchain/bin:*) ;; *) exit 12 ;; esac
kmake V=1 >/dev/null 2>&1 || exit 13
exit 0
"#,
  );

  assert_eq!(status.code(), Some(0));
  assert!(env.calls()[0].ends_with(" V=1"));
}

#[test]
#[serial]
fn unsetup_restores_shell_after_repeated_setup() {
  let env = TestEnv::new();

  let status = run_in_shell(&env, "sh", 2, POSIX_TEARDOWN_CHECKS);

  assert_eq!(status.code(), Some(0));
}

#[test]
#[serial]
fn unsetup_restores_bash_after_repeated_setup() {
  let env = TestEnv::new();

  let status = run_in_shell(&env, "bash", 2, POSIX_TEARDOWN_CHECKS);

  assert_eq!(status.code(), Some(0));
}

#[test]
#[serial]
fn unsetup_restores_zsh_after_repeated_setup() {
  if !shell_available("zsh") {
    eprintln!("zsh not installed, skipping");
    return;
  }
  let env = TestEnv::new();

  let status = run_in_shell(&env, "zsh", 2, POSIX_TEARDOWN_CHECKS);

  assert_eq!(status.code(), Some(0));
}

#[test]
#[serial]
fn unsetup_restores_fish_after_repeated_setup() {
  if !shell_available("fish") {
    eprintln!("fish not installed, skipping");
    return;
  }
  let env = TestEnv::new();

  let status = run_in_shell(&env, "fish", 2, FISH_TEARDOWN_CHECKS);

  assert_eq!(status.code(), Some(0));
}
