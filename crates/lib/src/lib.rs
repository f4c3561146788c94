//! kdev-lib: Android kernel development workflow
//!
//! This crate provides the pieces behind the `kdev` command:
//! - `BuildContext`: the kernel tree and its `kdev.toml` configuration
//! - `Pipeline`: compile, package and install stages chained with `?`
//! - `Session`: shell helper setup and teardown tracked in a `Registry`
//! - `kconfig` / `inspect`: config diffing and size reports over the build output

pub mod config;
pub mod consts;
pub mod context;
pub mod exec;
pub mod inspect;
pub mod kconfig;
pub mod session;
pub mod util;
pub mod workflow;
