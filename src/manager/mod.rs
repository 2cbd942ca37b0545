//! Worktree lifecycle: create, remove and list.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::git::{Git, RemoteBranch, short_branch_name};
use crate::process::CommandOutput;
use crate::repository::RepositoryContext;
use crate::resolver::{BranchProvenance, BranchResolver};
use crate::traits::CommandRunner;
use crate::upstream::{UpstreamStatus, UpstreamTracker};

const SHORT_HASH_LEN: usize = 7;

/// One worktree as reported by `git worktree list --porcelain`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorktreeRecord {
    pub path: PathBuf,
    pub branch_name: Option<String>,
    pub head_commit: Option<String>,
    pub is_current: bool,
    pub is_bare: bool,
    pub is_detached: bool,
    pub is_locked: bool,
    pub lock_reason: Option<String>,
    pub is_prunable: bool,
}

impl WorktreeRecord {
    /// Branch name, or a short commit hash for detached worktrees
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(branch) = &self.branch_name {
            return branch.clone();
        }
        if self.is_bare {
            return "(bare)".to_string();
        }
        match &self.head_commit {
            Some(commit) => commit.chars().take(SHORT_HASH_LEN).collect(),
            None => "(unknown)".to_string(),
        }
    }
}

/// Parses porcelain listing output.
///
/// Each `worktree <path>` line opens a record; every following line up to
/// the next `worktree` line belongs to it. Blank separators and unknown
/// keys are ignored. `is_current` is left for the caller to fill in.
#[must_use]
pub fn parse_worktree_list(output: &str) -> Vec<WorktreeRecord> {
    let mut records = Vec::new();
    let mut current: Option<WorktreeRecord> = None;

    for line in output.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let (key, value) = match line.split_once(' ') {
            Some((key, value)) => (key, Some(value)),
            None => (line, None),
        };

        if key == "worktree" {
            if let Some(record) = current.take() {
                records.push(record);
            }
            current = Some(WorktreeRecord {
                path: PathBuf::from(value.unwrap_or_default()),
                ..WorktreeRecord::default()
            });
            continue;
        }

        // Lines before the first `worktree` line have no owner
        let Some(record) = current.as_mut() else {
            continue;
        };

        match key {
            "HEAD" => record.head_commit = value.map(str::to_string),
            "branch" => record.branch_name = value.map(|r| short_branch_name(r).to_string()),
            "detached" => record.is_detached = true,
            "bare" => record.is_bare = true,
            "locked" => {
                record.is_locked = true;
                record.lock_reason = value.map(str::to_string);
            }
            "prunable" => record.is_prunable = true,
            _ => {}
        }
    }

    if let Some(record) = current {
        records.push(record);
    }

    records
}

/// Result of a successful [`WorktreeManager::create`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOutcome {
    pub path: PathBuf,
    pub branch: String,
    pub provenance: BranchProvenance,
    pub upstream: UpstreamStatus,
}

pub struct WorktreeManager<'a> {
    runner: &'a dyn CommandRunner,
    resolver: BranchResolver<'a>,
    tracker: UpstreamTracker<'a>,
}

impl<'a> WorktreeManager<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            resolver: BranchResolver::new(runner),
            tracker: UpstreamTracker::new(runner),
        }
    }

    /// Creates a worktree for `branch` at `target_path`.
    ///
    /// Local branches are attached and then have their upstream reconciled;
    /// remote-only branches get a tracking branch in the same step; unknown
    /// names become new branches at the current head.
    ///
    /// # Errors
    /// Returns [`Error::WorktreeCreationFailed`] when the creation command
    /// fails. Nothing is retried or rolled back.
    pub fn create(
        &self,
        context: &RepositoryContext,
        branch: &str,
        target_path: &Path,
        settings: &Settings,
    ) -> Result<CreateOutcome> {
        let provenance = self.resolver.resolve(context, branch, settings);
        let git = Git::new(self.runner, context);

        let upstream = match &provenance {
            BranchProvenance::New => {
                let output = git.add_worktree_new_branch(branch, target_path);
                Self::check_created(branch, &output)?;
                UpstreamStatus::NotApplicable
            }
            BranchProvenance::Local { is_stale } => {
                if *is_stale {
                    warn!(
                        "Branch '{}' is behind its upstream; pull to update it",
                        branch
                    );
                }
                let output = git.add_worktree_existing(branch, target_path);
                Self::check_created(branch, &output)?;
                self.tracker.reconcile(context, branch)
            }
            BranchProvenance::Remote { remote_name } => {
                let remote_branch = RemoteBranch {
                    remote: remote_name.clone(),
                    branch: branch.to_string(),
                };
                let output = git.add_worktree_tracking(&remote_branch, target_path);
                Self::check_created(branch, &output)?;
                UpstreamStatus::Established(remote_branch.short_name())
            }
        };

        info!(branch, path = %target_path.display(), "worktree created");
        Ok(CreateOutcome {
            path: target_path.to_path_buf(),
            branch: branch.to_string(),
            provenance,
            upstream,
        })
    }

    fn check_created(branch: &str, output: &CommandOutput) -> Result<()> {
        match output.failure_kind() {
            None => Ok(()),
            Some(kind) => Err(Error::WorktreeCreationFailed {
                branch: branch.to_string(),
                kind,
                cause: output.error_line(),
            }),
        }
    }

    /// Removes the worktree at `path`.
    ///
    /// Refusing to remove the worktree in use is the caller's job.
    ///
    /// # Errors
    /// Returns [`Error::WorktreeRemovalFailed`] when git refuses or fails.
    pub fn remove(&self, context: &RepositoryContext, path: &Path, force: bool) -> Result<()> {
        let output = Git::new(self.runner, context).remove_worktree(path, force);
        if let Some(kind) = output.failure_kind() {
            return Err(Error::WorktreeRemovalFailed {
                path: path.to_path_buf(),
                kind,
                cause: output.error_line(),
            });
        }
        info!(path = %path.display(), "worktree removed");
        Ok(())
    }

    /// Lists every worktree of the repository, freshly read each call.
    ///
    /// # Errors
    /// Returns [`Error::ListFailed`] when the listing command fails.
    pub fn list(&self, context: &RepositoryContext) -> Result<Vec<WorktreeRecord>> {
        let output = Git::new(self.runner, context).list_worktrees_porcelain();
        if let Some(kind) = output.failure_kind() {
            return Err(Error::ListFailed {
                kind,
                cause: output.error_line(),
            });
        }

        let root = canonical(&context.root_dir);
        let mut records = parse_worktree_list(&output.stdout);
        for record in &mut records {
            record.is_current = canonical(&record.path) == root;
        }
        Ok(records)
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
