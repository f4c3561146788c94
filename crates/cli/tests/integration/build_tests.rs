use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

#[test]
#[serial]
fn compile_passes_base_and_extra_args_to_make() {
  let env = TestEnv::new();

  env.kdev_cmd().args(["compile", "W=1"]).assert().success();

  let out = env.path("out");
  assert_eq!(
    env.calls(),
    vec![format!(
      "make -j2 ARCH=arm64 O={} CROSS_COMPILE=aarch64-linux-gnu- CROSS_COMPILE_ARM32=arm-linux-gnueabi- W=1",
      out.display()
    )]
  );
}

#[test]
#[serial]
fn package_test_names_artifact_after_counter() {
  let env = TestEnv::new();
  env.write_build_outputs(42);

  env
    .kdev_cmd()
    .arg("package-test")
    .assert()
    .success()
    .stdout(predicate::str::contains("proton-coral-test42.zip"));

  assert_eq!(env.read_file("builds/proton-coral-test42.zip"), "proton test42 (test)\n");
  assert_eq!(env.read_file("flasher/dtb"), "dtb");
  assert_eq!(env.read_file("flasher/Image.gz"), "kernel");
  assert_eq!(env.read_file("package_cwd").trim(), env.path("flasher").display().to_string());
}

#[test]
#[serial]
fn package_uses_release_version_from_env() {
  let env = TestEnv::new();
  env.write_build_outputs(7);

  env.kdev_cmd().arg("package").env("RELEASE_VER", "5").assert().success();

  assert_eq!(env.read_file("builds/proton-coral-v5.zip"), "proton v5 (stable)\n");
}

#[test]
#[serial]
fn package_to_explicit_path_as_json() {
  let env = TestEnv::new();
  env.write_build_outputs(3);

  env
    .kdev_cmd()
    .args(["package", "dist/custom.zip", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"artifact\""))
    .stdout(predicate::str::contains("custom.zip"));

  assert!(env.exists("dist/custom.zip"));
}

#[test]
#[serial]
fn package_path_is_relative_to_working_directory() {
  let env = TestEnv::new();
  env.write_build_outputs(3);
  env.write_file("work/notes.txt", "");

  env
    .kdev_cmd()
    .current_dir(env.path("work"))
    .args(["package", "x.zip"])
    .assert()
    .success();

  assert!(env.exists("work/x.zip"));
  assert!(!env.exists("x.zip"));
}

#[test]
#[serial]
fn release_rejects_empty_version() {
  let env = TestEnv::new();

  env
    .kdev_cmd()
    .args(["release", ""])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("invalid release version"));

  assert!(env.calls().is_empty());
  assert!(!env.exists("builds"));
}

#[test]
#[serial]
fn release_builds_then_packages() {
  let env = TestEnv::new();

  env
    .kdev_cmd()
    .args(["release", "3"])
    .assert()
    .success()
    .stdout(predicate::str::contains("proton-coral-v3.zip"));

  let calls = env.calls();
  assert_eq!(calls.len(), 2);
  assert!(calls[0].starts_with("make "));
  assert!(calls[0].ends_with("LOCALVERSION=-v3 KBUILD_BUILD_VERSION=1"));
  assert!(calls[1].starts_with("build.sh "));
  assert_eq!(env.read_file("builds/proton-coral-v3.zip"), "proton v3 (stable)\n");
}

#[test]
#[serial]
fn release_build_failure_skips_packaging() {
  let env = TestEnv::new();

  env
    .kdev_cmd()
    .args(["release", "3"])
    .env("KDEV_TEST_FAIL", "make")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Release v3 failed"));

  assert_eq!(env.calls().len(), 1);
  assert!(!env.exists("builds/proton-coral-v3.zip"));
}

#[test]
#[serial]
fn clean_release_cleans_first() {
  let env = TestEnv::new();

  env.kdev_cmd().args(["clean-release", "4"]).assert().success();

  let calls = env.calls();
  assert!(calls[0].ends_with(" clean"));
  assert!(calls[1].contains("LOCALVERSION=-v4"));
  assert!(env.exists("builds/proton-coral-v4.zip"));
}

#[test]
#[serial]
fn inc_build_packages_working_copy() {
  let env = TestEnv::new();

  env.kdev_cmd().arg("inc-build").assert().success();

  assert_eq!(env.read_file("builds/proton-coral.zip"), "proton test1 (test)\n");
}

#[test]
#[serial]
fn test_build_counts_up() {
  let env = TestEnv::new();

  env.kdev_cmd().arg("test-build").assert().success();
  env.kdev_cmd().arg("test-build").assert().success();

  assert!(env.exists("builds/proton-coral-test1.zip"));
  assert!(env.exists("builds/proton-coral-test2.zip"));
}

#[test]
#[serial]
fn reset_counter_then_package_test_fails() {
  let env = TestEnv::new();
  env.write_build_outputs(9);

  env
    .kdev_cmd()
    .arg("reset-counter")
    .assert()
    .success()
    .stdout(predicate::str::contains("Build counter reset"));
  env
    .kdev_cmd()
    .arg("reset-counter")
    .assert()
    .success()
    .stdout(predicate::str::contains("No build counter"));

  env
    .kdev_cmd()
    .arg("package-test")
    .assert()
    .failure()
    .stderr(predicate::str::contains("build counter not found"));
}

#[test]
#[serial]
fn packaging_script_failure_leaves_no_artifact() {
  let env = TestEnv::new();
  env.write_build_outputs(1);

  env
    .kdev_cmd()
    .arg("package-test")
    .env("KDEV_TEST_FAIL", "build.sh")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Packaging failed"));

  assert!(!env.exists("builds/proton-coral-test1.zip"));
}
