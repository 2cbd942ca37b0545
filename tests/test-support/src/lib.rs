//! Test support utilities for wtree integration tests
//!
//! This crate provides shared fixtures for integration tests: temporary
//! repositories driven by the real `git` binary, an optional bare "origin"
//! remote, and helpers for running the CLI. It is never published.

pub mod test_env;

pub use test_env::{CliTestEnvironment, git_in};
