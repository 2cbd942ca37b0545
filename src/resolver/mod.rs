//! Decides how a requested branch name maps onto existing refs.
//!
//! The resolver is optimistic: a query that fails for any reason counts as
//! "does not exist", and resolution falls through to the next, safer case.

use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::git::Git;
use crate::repository::RepositoryContext;
use crate::traits::CommandRunner;

/// Where a requested branch comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BranchProvenance {
    /// A local branch exists; `is_stale` when it is strictly behind its upstream
    Local { is_stale: bool },
    /// Only a remote-tracking branch exists on `remote_name`
    Remote { remote_name: String },
    /// Neither exists
    New,
}

impl fmt::Display for BranchProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchProvenance::Local { is_stale: false } => write!(f, "existing local branch"),
            BranchProvenance::Local { is_stale: true } => {
                write!(f, "existing local branch (behind upstream)")
            }
            BranchProvenance::Remote { remote_name } => {
                write!(f, "remote branch on '{}'", remote_name)
            }
            BranchProvenance::New => write!(f, "new branch"),
        }
    }
}

pub struct BranchResolver<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> BranchResolver<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Classifies `branch`, fetching all remotes first when enabled.
    ///
    /// A failed fetch is logged and resolution continues with whatever refs
    /// are already present.
    pub fn resolve(
        &self,
        context: &RepositoryContext,
        branch: &str,
        settings: &Settings,
    ) -> BranchProvenance {
        let git = Git::new(self.runner, context);

        if settings.auto_fetch {
            let output = git.fetch_all();
            match output.failure_kind() {
                None => debug!("fetched all remotes"),
                Some(kind) => warn!(
                    "Fetch failed ({}), continuing with local refs: {}",
                    kind,
                    output.error_line()
                ),
            }
        }

        let provenance = if git.local_branch_exists(branch) {
            BranchProvenance::Local {
                is_stale: Self::is_stale(&git, branch),
            }
        } else if let Some(remote_branch) = git.find_remote_branch(branch) {
            BranchProvenance::Remote {
                remote_name: remote_branch.remote,
            }
        } else {
            BranchProvenance::New
        };

        info!(branch, provenance = %provenance, "resolved branch");
        provenance
    }

    /// Stale means strictly behind the upstream: equal commits, a missing
    /// upstream, or a diverged/ahead branch are all not stale.
    fn is_stale(git: &Git<'_>, branch: &str) -> bool {
        let Some(upstream) = git.upstream_of(branch) else {
            debug!(branch, "no upstream configured");
            return false;
        };

        let local_ref = format!("refs/heads/{branch}");
        let (Some(local_commit), Some(upstream_commit)) =
            (git.commit_of(&local_ref), git.commit_of(&upstream))
        else {
            return false;
        };

        if local_commit == upstream_commit {
            return false;
        }

        git.is_ancestor(&local_commit, &upstream_commit)
    }
}
