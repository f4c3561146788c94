//! Transient boot of a kernel image on an attached device.
//!
//! The device is moved into the bootloader when adb can see it (either in
//! recovery or in the full OS), then `fastboot boot` loads the image for a
//! single session without flashing it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::WorkflowError;
use crate::context::BuildContext;
use crate::exec::{CommandRunner, Invocation};

/// State column of `adb devices`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
  /// Full OS (`device`)
  System,
  Recovery,
  Sideload,
  Bootloader,
  Unauthorized,
  Offline,
  Unknown,
}

impl DeviceState {
  fn parse(state: &str) -> Self {
    match state {
      "device" => DeviceState::System,
      "recovery" => DeviceState::Recovery,
      "sideload" => DeviceState::Sideload,
      "bootloader" => DeviceState::Bootloader,
      "unauthorized" => DeviceState::Unauthorized,
      "offline" => DeviceState::Offline,
      _ => DeviceState::Unknown,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachedDevice {
  pub serial: String,
  pub state: DeviceState,
}

/// Parse the output of `adb devices`.
pub fn parse_adb_devices(output: &str) -> Vec<AttachedDevice> {
  output
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty() && !line.starts_with("List of devices") && !line.starts_with('*'))
    .filter_map(|line| {
      let mut columns = line.split_whitespace();
      let serial = columns.next()?;
      let state = columns.next()?;
      Some(AttachedDevice {
        serial: serial.to_string(),
        state: DeviceState::parse(state),
      })
    })
    .collect()
}

/// What `install` did.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
  pub image: PathBuf,
  pub rebooted_from_recovery: bool,
  pub rebooted_from_system: bool,
}

pub(crate) fn install<R: CommandRunner + ?Sized>(
  ctx: &BuildContext,
  runner: &R,
  image: Option<&Path>,
) -> Result<InstallReport, WorkflowError> {
  let image = match image {
    Some(path) => ctx.resolve(path),
    None => ctx.default_install_image(),
  };
  let tools = &ctx.config().tools;

  let devices = match runner.output(&Invocation::new(&tools.adb).arg("devices")) {
    Ok(output) => parse_adb_devices(&output),
    Err(e) => {
      warn!(error = %e, "could not query adb devices, assuming none attached");
      Vec::new()
    }
  };

  let reboot = Invocation::new(&tools.adb).args(["reboot", "bootloader"]);

  // Both checks are independent; a host with two devices may trigger both.
  let in_recovery = devices.iter().any(|d| d.state == DeviceState::Recovery);
  if in_recovery {
    info!("device in recovery, rebooting to bootloader");
    runner.run(&reboot)?;
  }

  let in_system = devices.iter().any(|d| d.state == DeviceState::System);
  if in_system {
    info!("device booted, rebooting to bootloader");
    runner.run(&reboot)?;
  }

  info!(image = %image.display(), "booting image");
  runner.run(
    &Invocation::new(&tools.fastboot)
      .arg("boot")
      .arg(image.to_string_lossy()),
  )?;

  Ok(InstallReport {
    image,
    rebooted_from_recovery: in_recovery,
    rebooted_from_system: in_system,
  })
}
