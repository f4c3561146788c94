use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

#[test]
#[serial]
fn objects_report_lists_sources_largest_first() {
  let env = TestEnv::new();
  env.write_file("out/kernel/sched/core.o", &"x".repeat(3000));
  env.write_file("out/mm/slub.o", &"x".repeat(2000));
  env.write_file("out/kernel/built-in.o", &"x".repeat(9000));

  let assert = env.kdev_cmd().args(["size", "objects", "-n", "5"]).assert().success();
  let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

  let lines: Vec<&str> = stdout.lines().collect();
  assert_eq!(lines.len(), 2);
  assert!(lines[0].ends_with("kernel/sched/core.c"));
  assert!(lines[0].trim_start().starts_with("2.9 KiB  "));
  assert!(lines[1].ends_with("mm/slub.c"));
}

#[test]
#[serial]
fn symbols_report_skips_bss() {
  let env = TestEnv::new();
  env.write_file("out/vmlinux", "elf");

  env
    .kdev_cmd()
    .args(["size", "symbols", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("big_table"))
    .stdout(predicate::str::contains("__log_buf").not());
}

#[test]
#[serial]
fn symbols_without_vmlinux_fail() {
  let env = TestEnv::new();

  env
    .kdev_cmd()
    .args(["size", "symbols"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("vmlinux not found"));
}
