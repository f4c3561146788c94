//! Shared utilities.
//!
//! Test helpers for driving workflows without real tools.

#[cfg(test)]
pub mod testutil;
