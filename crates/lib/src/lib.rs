//! bake-lib: target-graph build orchestration.
//!
//! This crate provides the pieces of a `bake` invocation:
//! - `changelog`: release notes parsed from a changelog, newest first
//! - `params`: immutable `BuildParameters` and version derivation
//! - `target`: named targets and the dependency graph that orders them
//! - `execute`: the engine that runs a goal's targets at most once each
//! - `tools`: the external toolchain target actions delegate to
//! - `pipeline`: the standard restore/compile/test/pack/publish targets

pub mod changelog;
pub mod consts;
pub mod execute;
pub mod init;
pub mod params;
pub mod pipeline;
pub mod project;
pub mod settings;
pub mod target;
pub mod tools;
pub mod util;
