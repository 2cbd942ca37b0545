//! Command implementations behind the CLI.
//!
//! Each command has a thin entry point that uses the process working
//! directory and the system runner, and a `*_with_runner` variant that
//! takes both explicitly.

pub mod completions;
pub mod create;
pub mod list;
pub mod remove;
pub mod settings;

use anyhow::{Context, Result};
use std::path::Path;

use crate::repository::{self, RepositoryContext};

/// Locates and validates the repository enclosing `start_dir`
///
/// # Errors
/// Returns an error if no repository encloses `start_dir` or its metadata
/// store is unusable
pub fn open_repository(start_dir: &Path) -> Result<RepositoryContext> {
    let context = repository::locate(start_dir)?;
    repository::validate(&context)
        .with_context(|| format!("Repository at {} is not usable", context.root_dir.display()))?;
    Ok(context)
}
