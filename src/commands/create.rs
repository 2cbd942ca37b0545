use anyhow::{Context, Result};
use std::path::Path;

use super::open_repository;
use crate::config::JsonConfigStore;
use crate::hooks::{HookEnv, run_hook};
use crate::manager::{CreateOutcome, WorktreeManager};
use crate::process::SystemCommandRunner;
use crate::storage;
use crate::traits::{CommandRunner, ConfigStore};

/// Creates a worktree for `branch` in the repository around the current
/// directory
///
/// # Errors
/// Returns an error if:
/// - No usable repository encloses the current directory
/// - The target worktree path already exists
/// - The worktree creation command fails
pub fn create_worktree(branch: &str) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    create_worktree_with_runner(&SystemCommandRunner, &current_dir, branch)?;
    Ok(())
}

/// Creates a worktree using an explicit runner and start directory
///
/// # Errors
/// Returns an error if:
/// - No usable repository encloses `start_dir`
/// - The settings file cannot be read
/// - The target worktree path already exists
/// - Failed to create the parent directory
/// - The worktree creation command fails
pub fn create_worktree_with_runner(
    runner: &dyn CommandRunner,
    start_dir: &Path,
    branch: &str,
) -> Result<CreateOutcome> {
    let branch = branch.trim();
    if branch.is_empty() {
        anyhow::bail!("Branch name must not be empty");
    }

    let context = open_repository(start_dir)?;
    let settings = JsonConfigStore::new(runner).load(&context)?;
    let worktree_path = storage::worktree_path(&settings, &context, branch);

    if worktree_path.exists() {
        anyhow::bail!("Worktree path already exists: {}", worktree_path.display());
    }

    // Ensure parent directory exists
    if let Some(parent) = worktree_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory: {}", parent.display()))?;
    }

    println!(
        "Creating worktree for branch '{}' at: {}",
        branch,
        worktree_path.display()
    );

    let outcome = WorktreeManager::new(runner).create(&context, branch, &worktree_path, &settings)?;

    if let Some(hook) = &settings.post_create_hook {
        let env = HookEnv {
            branch,
            worktree_path: &outcome.path,
            repo_root: &context.root_dir,
        };
        run_hook(runner, "post-create", hook, &outcome.path, &env);
    }

    println!("✓ Worktree created successfully!");
    println!("  Branch: {}", outcome.branch);
    println!("  Path: {}", outcome.path.display());
    println!("  Source: {}", outcome.provenance);
    println!("  Upstream: {}", outcome.upstream);

    Ok(outcome)
}
