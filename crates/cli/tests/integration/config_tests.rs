use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

const BASELINE: &str = "CONFIG_X=y\nCONFIG_Z=y\n# CONFIG_W is not set\n";
const GENERATED: &str = "CONFIG_Y=m\nCONFIG_Z=m\n# CONFIG_W is not set\n";

fn with_configs() -> TestEnv {
  let env = TestEnv::new();
  env.write_file("arch/arm64/configs/proton_defconfig", BASELINE);
  env.write_file("out/.config", GENERATED);
  env
}

#[test]
#[serial]
fn diff_lists_option_changes() {
  let env = with_configs();

  env
    .kdev_cmd()
    .args(["config", "diff"])
    .assert()
    .success()
    .stdout(predicate::str::contains("CONFIG_X y"))
    .stdout(predicate::str::contains("CONFIG_Y m"))
    .stdout(predicate::str::contains("CONFIG_Z y → m"))
    .stdout(predicate::str::contains("CONFIG_W").not());

  assert_eq!(env.read_file("arch/arm64/configs/proton_defconfig"), BASELINE);
}

#[test]
#[serial]
fn commit_then_diff_is_clean() {
  let env = with_configs();

  env.kdev_cmd().args(["config", "commit"]).assert().success();
  assert_eq!(env.read_file("arch/arm64/configs/proton_defconfig"), GENERATED);

  env
    .kdev_cmd()
    .args(["config", "diff"])
    .assert()
    .success()
    .stdout(predicate::str::contains("matches the generated config"));
}

#[test]
#[serial]
fn reset_regenerates_from_defconfig() {
  let env = with_configs();

  env.kdev_cmd().args(["config", "reset"]).assert().success();

  assert!(env.calls()[0].ends_with(" proton_defconfig"));
  assert_eq!(env.read_file("out/.config"), BASELINE);
}

#[test]
#[serial]
fn raw_edit_runs_editor_on_generated_config() {
  let env = with_configs();

  env
    .kdev_cmd()
    .args(["config", "edit", "--raw"])
    .env("EDITOR", format!("{} --wait", env.path("bin/fastboot").display()))
    .assert()
    .success();

  assert_eq!(
    env.calls(),
    vec![format!("fastboot --wait {}", env.path("out/.config").display())]
  );
}

#[test]
#[serial]
fn menuconfig_is_a_make_target() {
  let env = with_configs();

  env.kdev_cmd().args(["config", "edit"]).assert().success();

  assert!(env.calls()[0].ends_with(" menuconfig"));
}
