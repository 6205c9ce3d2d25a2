//! Shared utilities.
//!
//! Test helpers for running real processes and faking the toolchain.

#[cfg(test)]
pub mod testutil;
