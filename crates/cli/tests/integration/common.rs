//! Shared test helpers for CLI integration tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Every stub logs its invocation and can be told to fail via
/// `KDEV_TEST_FAIL=<name>`.
const STUB_PRELUDE: &str = r#"#!/bin/sh
name=$(basename "$0")
echo "$name $*" >> "@ROOT@/calls.log"
if [ "$name" = "${KDEV_TEST_FAIL:-}" ]; then exit 2; fi
"#;

/// Behaves like a kernel build: configure targets copy the defconfig, other
/// targets produce boot images and bump the counter.
const MAKE_STUB: &str = r#"cd "@ROOT@"
case "$*" in
  *" clean"|*" menuconfig") ;;
  *_defconfig) mkdir -p out && cp arch/arm64/configs/proton_defconfig out/.config ;;
  *)
    boot=out/arch/arm64/boot
    mkdir -p "$boot/dts/qcom"
    printf kernel > "$boot/Image.gz"
    printf kernel-dtb > "$boot/Image.gz-dtb"
    printf dtb > "$boot/dts/qcom/sm8150.dtb"
    n=$(cat out/.version 2>/dev/null || echo 0)
    echo $((n + 1)) > out/.version
    ;;
esac
"#;

const ADB_STUB: &str = r#"if [ "$1" = devices ]; then
  cat "@ROOT@/adb_devices" 2>/dev/null || echo "List of devices attached"
fi
"#;

const NM_STUB: &str = r#"echo "ffffff8009000000 0000000000100000 B __log_buf"
echo "ffffff8008200000 0000000000004000 D big_table"
echo "ffffff8008300000 0000000000000800 T medium_fn"
"#;

/// The payload's packaging script: zips up the version file.
const PACKAGE_SCRIPT: &str = r#"pwd > "@ROOT@/package_cwd"
cat version > "$1"
"#;

const CONFIG: &str = r#"
kernel_name = "proton"
defconfig = "proton_defconfig"
arch = "arm64"
device_name = "coral"
jobs = 2
toolchain_path = ["toolchain/bin"]

[tools]
make = "@ROOT@/bin/make"
adb = "@ROOT@/bin/adb"
fastboot = "@ROOT@/bin/fastboot"
nm = "@ROOT@/bin/nm"
"#;

/// Isolated kernel tree with stub tools.
pub struct TestEnv {
  _temp: TempDir,
  pub root: PathBuf,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();
    let env = Self { _temp: temp, root };

    env.write_file("kdev.toml", &env.expand(CONFIG));
    env.write_script("bin/make", MAKE_STUB);
    env.write_script("bin/adb", ADB_STUB);
    env.write_script("bin/fastboot", "");
    env.write_script("bin/nm", NM_STUB);
    env.write_script("flasher/build.sh", PACKAGE_SCRIPT);
    env
  }

  fn expand(&self, template: &str) -> String {
    template.replace("@ROOT@", &self.root.display().to_string())
  }

  fn write_script(&self, relative_path: &str, body: &str) {
    let path = self.path(relative_path);
    self.write_file(relative_path, &self.expand(&format!("{}{}", STUB_PRELUDE, body)));
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.root.join(relative_path)
  }

  /// Write a file relative to the kernel root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    fs::read_to_string(self.path(relative_path)).unwrap_or_default()
  }

  /// Lay out what a finished kernel build leaves behind.
  pub fn write_build_outputs(&self, counter: u32) {
    self.write_file("out/arch/arm64/boot/Image.gz", "kernel");
    self.write_file("out/arch/arm64/boot/Image.gz-dtb", "kernel-dtb");
    self.write_file("out/arch/arm64/boot/dts/qcom/sm8150.dtb", "dtb");
    self.write_file("out/.version", &format!("{}\n", counter));
  }

  /// Invocations recorded by the stub tools, one per line.
  pub fn calls(&self) -> Vec<String> {
    self.read_file("calls.log").lines().map(str::to_string).collect()
  }

  pub fn exists(&self, relative_path: &str) -> bool {
    self.path(relative_path).exists()
  }

  /// A `kdev` command running inside the kernel tree with a clean environment.
  pub fn kdev_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("kdev");
    cmd.current_dir(&self.root);
    cmd.env_remove("KDEV_CONFIG");
    cmd.env_remove("KDEV_JOBS");
    cmd.env_remove("RELEASE_VER");
    cmd.env_remove("KDEV_TEST_FAIL");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
