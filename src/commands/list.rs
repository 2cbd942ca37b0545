use anyhow::Result;
use std::path::Path;

use super::open_repository;
use crate::config::JsonConfigStore;
use crate::manager::{WorktreeManager, WorktreeRecord};
use crate::process::SystemCommandRunner;
use crate::traits::{CommandRunner, ConfigStore};

/// Lists the worktrees of the repository around the current directory
///
/// # Errors
/// Returns an error if no usable repository is found or listing fails
pub fn list_worktrees(json: bool) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let records = list_worktrees_with_runner(&SystemCommandRunner, &current_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No worktrees found");
        return Ok(());
    }

    let context = open_repository(&current_dir)?;
    let settings = JsonConfigStore::new(&SystemCommandRunner).load(&context)?;
    for record in &records {
        println!("{}", format_record(record, &settings.default_branch_name));
    }

    Ok(())
}

/// Lists worktrees using an explicit runner and start directory
///
/// # Errors
/// Returns an error if no usable repository is found or listing fails
pub fn list_worktrees_with_runner(
    runner: &dyn CommandRunner,
    start_dir: &Path,
) -> Result<Vec<WorktreeRecord>> {
    let context = open_repository(start_dir)?;
    Ok(WorktreeManager::new(runner).list(&context)?)
}

/// One display line: current marker, name, path and state flags
#[must_use]
pub fn format_record(record: &WorktreeRecord, default_branch: &str) -> String {
    let marker = if record.is_current { "*" } else { " " };
    let mut line = format!(
        "{} {:<30} {}",
        marker,
        record.display_name(),
        record.path.display()
    );

    if record.branch_name.as_deref() == Some(default_branch) {
        line.push_str(" (default)");
    }
    if record.is_detached {
        line.push_str(" [detached]");
    }
    if record.is_locked {
        match &record.lock_reason {
            Some(reason) => line.push_str(&format!(" [locked: {}]", reason)),
            None => line.push_str(" [locked]"),
        }
    }
    if record.is_prunable {
        line.push_str(" [prunable]");
    }

    line
}
