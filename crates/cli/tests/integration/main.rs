#![cfg(unix)]

mod common;

mod build_tests;
mod config_tests;
mod env_tests;
mod size_tests;
