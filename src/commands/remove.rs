use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use super::open_repository;
use crate::config::JsonConfigStore;
use crate::hooks::{HookEnv, run_hook};
use crate::manager::{WorktreeManager, WorktreeRecord};
use crate::process::SystemCommandRunner;
use crate::traits::{CommandRunner, ConfigStore};

/// Options for [`remove_worktree_with_runner`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    /// Remove even with local modifications
    pub force: bool,
    /// Confirms removal when `confirmBeforeDelete` is enabled
    pub confirmed: bool,
}

/// Removes a worktree of the repository around the current directory
///
/// # Errors
/// Returns an error if:
/// - The target worktree doesn't exist
/// - The target is the worktree containing the current directory
/// - Confirmation is required but was not given
/// - The removal command fails
pub fn remove_worktree(
    target: Option<&str>,
    options: RemoveOptions,
    list_completions: bool,
) -> Result<()> {
    let current_dir = std::env::current_dir()?;

    if list_completions {
        return list_worktree_completions(&SystemCommandRunner, &current_dir);
    }

    let Some(target) = target else {
        anyhow::bail!("Specify the branch name or path of the worktree to remove");
    };
    remove_worktree_with_runner(&SystemCommandRunner, &current_dir, target, options)?;
    Ok(())
}

/// Removes a worktree using an explicit runner and start directory.
///
/// `target` is a branch name or a worktree path (relative to `start_dir`).
/// Returns the removed worktree's path.
///
/// # Errors
/// Returns an error if:
/// - No usable repository encloses `start_dir`
/// - The target worktree doesn't exist or is the bare store
/// - `start_dir` lies inside the target worktree
/// - Confirmation is required but was not given
/// - The removal command fails
pub fn remove_worktree_with_runner(
    runner: &dyn CommandRunner,
    start_dir: &Path,
    target: &str,
    options: RemoveOptions,
) -> Result<PathBuf> {
    let context = open_repository(start_dir)?;
    let settings = JsonConfigStore::new(runner).load(&context)?;
    let manager = WorktreeManager::new(runner);

    let records = manager.list(&context)?;
    let Some(record) = find_worktree(&records, start_dir, target) else {
        anyhow::bail!("No worktree found for '{}'", target);
    };

    if record.is_bare {
        anyhow::bail!("Cannot remove the bare repository store: {}", record.path.display());
    }

    if canonical(start_dir).starts_with(canonical(&record.path)) {
        anyhow::bail!(
            "Cannot remove the worktree you are currently in: {}",
            record.path.display()
        );
    }

    if settings.confirm_before_delete && !options.confirmed {
        anyhow::bail!(
            "Removing {} needs confirmation: re-run with --yes (confirmBeforeDelete is enabled)",
            record.path.display()
        );
    }

    manager.remove(&context, &record.path, options.force)?;

    if let Some(hook) = &settings.post_remove_hook {
        let branch = record.branch_name.clone().unwrap_or_default();
        let env = HookEnv {
            branch: &branch,
            worktree_path: &record.path,
            repo_root: &context.root_dir,
        };
        run_hook(runner, "post-remove", hook, &context.root_dir, &env);
    }

    println!("✓ Removed worktree: {}", record.path.display());
    if let Some(branch) = &record.branch_name {
        println!("  Branch '{}' was kept", branch);
    }

    Ok(record.path.clone())
}

/// Matches a branch name first, then a path
fn find_worktree<'r>(
    records: &'r [WorktreeRecord],
    start_dir: &Path,
    target: &str,
) -> Option<&'r WorktreeRecord> {
    if let Some(record) = records
        .iter()
        .find(|record| record.branch_name.as_deref() == Some(target))
    {
        return Some(record);
    }

    let target_path = canonical(&start_dir.join(target));
    records
        .iter()
        .find(|record| canonical(&record.path) == target_path)
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn list_worktree_completions(runner: &dyn CommandRunner, start_dir: &Path) -> Result<()> {
    let context = open_repository(start_dir)?;
    for record in WorktreeManager::new(runner).list(&context)? {
        if let Some(branch) = record.branch_name {
            if !record.is_current {
                println!("{}", branch);
            }
        }
    }
    Ok(())
}
