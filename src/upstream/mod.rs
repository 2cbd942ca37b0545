use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::git::Git;
use crate::repository::RepositoryContext;
use crate::traits::CommandRunner;

/// Tracking state of a branch after worktree creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "kebab-case")]
pub enum UpstreamStatus {
    /// The branch already tracked this ref; nothing changed
    AlreadySet(String),
    /// Tracking was configured by reconciliation
    Set(String),
    /// Tracking was configured by the creation command itself
    Established(String),
    /// No remote carries a branch of the same name
    NoRemote,
    /// Setting the upstream failed; the worktree is still usable
    Failed(String),
    /// Brand-new branches get no upstream
    NotApplicable,
}

impl fmt::Display for UpstreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamStatus::AlreadySet(upstream) => write!(f, "{} (already set)", upstream),
            UpstreamStatus::Set(upstream) => write!(f, "{} (set)", upstream),
            UpstreamStatus::Established(upstream) => write!(f, "{}", upstream),
            UpstreamStatus::NoRemote => write!(f, "none (no matching remote branch)"),
            UpstreamStatus::Failed(message) => write!(f, "not set ({})", message),
            UpstreamStatus::NotApplicable => write!(f, "none"),
        }
    }
}

/// Best-effort repair of missing upstream tracking
pub struct UpstreamTracker<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> UpstreamTracker<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Points `branch` at the first remote branch of the same name unless
    /// it already tracks something. Never fails; problems are logged and
    /// reported through the returned status.
    pub fn reconcile(&self, context: &RepositoryContext, branch: &str) -> UpstreamStatus {
        let git = Git::new(self.runner, context);

        if let Some(upstream) = git.upstream_of(branch) {
            info!(branch, upstream = %upstream, "upstream already configured");
            return UpstreamStatus::AlreadySet(upstream);
        }

        let Some(remote_branch) = git.find_remote_branch(branch) else {
            info!(branch, "no matching remote branch, skipping upstream setup");
            return UpstreamStatus::NoRemote;
        };

        let upstream = remote_branch.short_name();
        let output = git.set_upstream(branch, &upstream);
        if output.is_success() {
            info!(branch, upstream = %upstream, "upstream set");
            UpstreamStatus::Set(upstream)
        } else {
            let message = output.error_line();
            warn!("Could not set upstream of '{}' to '{}': {}", branch, upstream, message);
            UpstreamStatus::Failed(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandOutput;
    use crate::process::fake::ScriptedRunner;
    use crate::repository::LayoutKind;
    use std::path::PathBuf;

    fn context() -> RepositoryContext {
        RepositoryContext {
            root_dir: PathBuf::from("/work/repo"),
            metadata_dir: PathBuf::from("/work/repo/.git"),
            layout: LayoutKind::Standard,
            bare_store: None,
        }
    }

    fn remote_refs(refs: &str) -> ScriptedRunner {
        ScriptedRunner::new().on(
            &["for-each-ref", "--format=%(refname)", "refs/remotes"],
            CommandOutput::success(refs),
        )
    }

    #[test]
    fn test_existing_upstream_is_noop() {
        let runner = ScriptedRunner::new().on(
            &["for-each-ref", "--format=%(upstream)", "refs/heads/feature"],
            CommandOutput::success("refs/remotes/origin/feature\n"),
        );
        let tracker = UpstreamTracker::new(&runner);

        let status = tracker.reconcile(&context(), "feature");
        assert_eq!(
            status,
            UpstreamStatus::AlreadySet("refs/remotes/origin/feature".to_string())
        );
        assert_eq!(runner.count_prefix(&["branch"]), 0);
    }

    #[test]
    fn test_sets_upstream_from_matching_remote() {
        let runner = remote_refs("refs/remotes/origin/feature\n").on(
            &["branch", "--set-upstream-to=origin/feature", "feature"],
            CommandOutput::success("branch 'feature' set up to track 'origin/feature'.\n"),
        );
        let tracker = UpstreamTracker::new(&runner);

        let status = tracker.reconcile(&context(), "feature");
        assert_eq!(status, UpstreamStatus::Set("origin/feature".to_string()));
    }

    #[test]
    fn test_no_matching_remote_skips() {
        let runner = remote_refs("refs/remotes/origin/main\n");
        let tracker = UpstreamTracker::new(&runner);

        let status = tracker.reconcile(&context(), "feature");
        assert_eq!(status, UpstreamStatus::NoRemote);
        assert_eq!(runner.count_prefix(&["branch"]), 0);
    }

    #[test]
    fn test_set_upstream_failure_is_reported_not_raised() {
        let runner = remote_refs("refs/remotes/origin/feature\n").on(
            &["branch", "--set-upstream-to=origin/feature", "feature"],
            CommandOutput::failure(128, "fatal: the requested upstream branch does not exist\n"),
        );
        let tracker = UpstreamTracker::new(&runner);

        let status = tracker.reconcile(&context(), "feature");
        assert_eq!(
            status,
            UpstreamStatus::Failed(
                "fatal: the requested upstream branch does not exist".to_string()
            )
        );
    }
}
