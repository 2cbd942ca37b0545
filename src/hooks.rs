//! User-configured shell hooks run after create and remove.

use std::path::Path;
use tracing::{debug, warn};

use crate::process::CommandRequest;
use crate::traits::CommandRunner;

/// Values exported to a hook's environment
pub struct HookEnv<'a> {
    pub branch: &'a str,
    pub worktree_path: &'a Path,
    pub repo_root: &'a Path,
}

/// Runs `hook` through `sh -c` in `cwd`. Failures are warnings only.
///
/// Returns whether the hook succeeded.
pub fn run_hook(
    runner: &dyn CommandRunner,
    name: &str,
    hook: &str,
    cwd: &Path,
    env: &HookEnv<'_>,
) -> bool {
    debug!(hook = name, command = hook, "running hook");

    let request = CommandRequest::new("sh", cwd)
        .args(["-c", hook])
        .env("WTREE_BRANCH", env.branch)
        .env("WTREE_PATH", env.worktree_path.display().to_string())
        .env("WTREE_ROOT", env.repo_root.display().to_string());
    let output = runner.run(&request);

    if !output.stdout.trim().is_empty() {
        println!("{}", output.stdout.trim_end());
    }

    match output.failure_kind() {
        None => true,
        Some(kind) => {
            warn!("{} hook failed ({}): {}", name, kind, output.error_line());
            false
        }
    }
}
