use std::path::Path;
use tracing::debug;

use crate::process::{CommandOutput, CommandRequest};
use crate::repository::RepositoryContext;
use crate::traits::CommandRunner;

const LOCAL_BRANCH_PREFIX: &str = "refs/heads/";
const REMOTE_REFS_PREFIX: &str = "refs/remotes/";

/// A remote-tracking branch, e.g. `origin/feature`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBranch {
    pub remote: String,
    pub branch: String,
}

impl RemoteBranch {
    /// Splits a full `refs/remotes/<remote>/<branch>` ref name
    #[must_use]
    pub fn from_ref(full_ref: &str) -> Option<Self> {
        let (remote, branch) = full_ref.strip_prefix(REMOTE_REFS_PREFIX)?.split_once('/')?;
        if remote.is_empty() || branch.is_empty() {
            return None;
        }
        Some(Self {
            remote: remote.to_string(),
            branch: branch.to_string(),
        })
    }

    /// Short form accepted by git as a start point, `<remote>/<branch>`
    #[must_use]
    pub fn short_name(&self) -> String {
        format!("{}/{}", self.remote, self.branch)
    }
}

/// Git commands bound to one repository.
///
/// Every command targets the context's metadata store through
/// `--git-dir` and runs from the repository root.
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    context: &'a RepositoryContext,
}

impl<'a> Git<'a> {
    pub fn new(runner: &'a dyn CommandRunner, context: &'a RepositoryContext) -> Self {
        Self { runner, context }
    }

    #[must_use]
    pub fn context(&self) -> &RepositoryContext {
        self.context
    }

    /// Runs `git --git-dir=<metadata> <args>` and returns the raw output
    pub fn run<I, S>(&self, args: I) -> CommandOutput
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = CommandRequest::new("git", &self.context.root_dir)
            .arg(format!("--git-dir={}", self.context.metadata_dir.display()))
            .args(args);
        let output = self.runner.run(&request);
        if !output.is_success() {
            debug!(
                command = %request.display(),
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "git command failed"
            );
        }
        output
    }

    /// Whether `refs/heads/<branch>` exists. Any failure reads as "no".
    #[must_use]
    pub fn local_branch_exists(&self, branch: &str) -> bool {
        self.run([
            "show-ref".to_string(),
            "--verify".to_string(),
            "--quiet".to_string(),
            format!("{LOCAL_BRANCH_PREFIX}{branch}"),
        ])
        .is_success()
    }

    /// The full upstream ref configured for a local branch, if any
    #[must_use]
    pub fn upstream_of(&self, branch: &str) -> Option<String> {
        let output = self.run([
            "for-each-ref".to_string(),
            "--format=%(upstream)".to_string(),
            format!("{LOCAL_BRANCH_PREFIX}{branch}"),
        ]);
        if !output.is_success() {
            return None;
        }
        let upstream = output.stdout.trim();
        (!upstream.is_empty()).then(|| upstream.to_string())
    }

    /// Commit id a ref points at
    #[must_use]
    pub fn commit_of(&self, reference: &str) -> Option<String> {
        let output = self.run([
            "rev-parse".to_string(),
            "--verify".to_string(),
            "--quiet".to_string(),
            format!("{reference}^{{commit}}"),
        ]);
        if !output.is_success() {
            return None;
        }
        let commit = output.stdout.trim();
        (!commit.is_empty()).then(|| commit.to_string())
    }

    /// Whether `ancestor` is reachable from `descendant`. Errors read as "no".
    #[must_use]
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        self.run(["merge-base", "--is-ancestor", ancestor, descendant])
            .is_success()
    }

    /// All remote-tracking branches in listing order, skipping `<remote>/HEAD`
    #[must_use]
    pub fn remote_branches(&self) -> Vec<RemoteBranch> {
        let output = self.run(["for-each-ref", "--format=%(refname)", "refs/remotes"]);
        if !output.is_success() {
            return Vec::new();
        }
        output
            .stdout
            .lines()
            .map(str::trim)
            .filter_map(RemoteBranch::from_ref)
            .filter(|remote_branch| remote_branch.branch != "HEAD")
            .collect()
    }

    /// First remote-tracking branch whose name equals `branch`.
    ///
    /// With several remotes carrying the same branch, the first one in
    /// `for-each-ref` order wins (refs are listed sorted by name).
    #[must_use]
    pub fn find_remote_branch(&self, branch: &str) -> Option<RemoteBranch> {
        self.remote_branches()
            .into_iter()
            .find(|remote_branch| remote_branch.branch == branch)
    }

    /// Short name a symbolic ref points at, e.g. `origin/main` for
    /// `refs/remotes/origin/HEAD`
    #[must_use]
    pub fn symbolic_ref(&self, name: &str) -> Option<String> {
        let output = self.run(["symbolic-ref", "--quiet", "--short", name]);
        if !output.is_success() {
            return None;
        }
        let target = output.stdout.trim();
        (!target.is_empty()).then(|| target.to_string())
    }

    pub fn fetch_all(&self) -> CommandOutput {
        self.run(["fetch", "--all"])
    }

    /// `worktree add -b <branch> <path>`: new branch at the current head
    pub fn add_worktree_new_branch(&self, branch: &str, path: &Path) -> CommandOutput {
        self.run([
            "worktree".to_string(),
            "add".to_string(),
            "-b".to_string(),
            branch.to_string(),
            path.display().to_string(),
        ])
    }

    /// `worktree add <path> <branch>`: attach an existing local branch
    pub fn add_worktree_existing(&self, branch: &str, path: &Path) -> CommandOutput {
        self.run([
            "worktree".to_string(),
            "add".to_string(),
            path.display().to_string(),
            branch.to_string(),
        ])
    }

    /// `worktree add --track -b <branch> <path> <remote>/<branch>`
    pub fn add_worktree_tracking(&self, remote: &RemoteBranch, path: &Path) -> CommandOutput {
        self.run([
            "worktree".to_string(),
            "add".to_string(),
            "--track".to_string(),
            "-b".to_string(),
            remote.branch.clone(),
            path.display().to_string(),
            remote.short_name(),
        ])
    }

    pub fn remove_worktree(&self, path: &Path, force: bool) -> CommandOutput {
        let mut args = vec!["worktree".to_string(), "remove".to_string()];
        if force {
            args.push("--force".to_string());
        }
        args.push(path.display().to_string());
        self.run(args)
    }

    pub fn list_worktrees_porcelain(&self) -> CommandOutput {
        self.run(["worktree", "list", "--porcelain"])
    }

    pub fn set_upstream(&self, branch: &str, upstream: &str) -> CommandOutput {
        self.run([
            "branch".to_string(),
            format!("--set-upstream-to={upstream}"),
            branch.to_string(),
        ])
    }
}

/// Strips the local branch namespace from a full ref name
#[must_use]
pub fn short_branch_name(full_ref: &str) -> &str {
    full_ref.strip_prefix(LOCAL_BRANCH_PREFIX).unwrap_or(full_ref)
}
