#![allow(clippy::unwrap_used)] // Tests use unwrap for simplicity

use anyhow::{Context, Result};
use assert_fs::prelude::*;
use assert_fs::TempDir;

use std::path::Path;
use std::process::Command;

/// Runs git in `dir` and returns trimmed stdout
///
/// # Errors
/// Returns an error if git cannot be started or exits non-zero
pub fn git_in(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .context("Failed to execute git command")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Git command `git {}` failed: {}", args.join(" "), stderr);
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// A temporary git repository (`test_repo`) with one commit on `main`
pub struct CliTestEnvironment {
    pub repo_dir: assert_fs::fixture::ChildPath,
    pub origin_dir: assert_fs::fixture::ChildPath,
    temp_dir: TempDir, // Keep temp_dir private to ensure cleanup, but don't expose it
}

impl CliTestEnvironment {
    /// Creates a new test environment with a real git repository
    ///
    /// # Errors
    /// Returns an error if:
    /// - Failed to create temporary directory
    /// - Failed to initialize git repository
    /// - Failed to configure git settings
    /// - Failed to create initial commit
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
        let repo_dir = temp_dir.child("test_repo");
        let origin_dir = temp_dir.child("origin.git");

        repo_dir.create_dir_all()?;

        git_in(repo_dir.path(), &["init"])?;
        git_in(repo_dir.path(), &["config", "user.name", "Test User"])?;
        git_in(repo_dir.path(), &["config", "user.email", "test@example.com"])?;

        repo_dir.child("README.md").write_str("# Test Repo")?;
        git_in(repo_dir.path(), &["add", "."])?;
        git_in(repo_dir.path(), &["commit", "-m", "Initial commit"])?;

        // Ensure we have a main branch (some git versions default to 'master')
        git_in(repo_dir.path(), &["branch", "-M", "main"])?;

        Ok(Self {
            repo_dir,
            origin_dir,
            temp_dir,
        })
    }

    /// Creates the environment plus a bare `origin` remote holding `main`
    ///
    /// # Errors
    /// Returns an error if any git setup command fails
    pub fn with_origin() -> Result<Self> {
        let env = Self::new()?;
        env.origin_dir.create_dir_all()?;
        git_in(env.origin_dir.path(), &["init", "--bare"])?;

        let origin = env.origin_dir.path().to_string_lossy().to_string();
        env.git(&["remote", "add", "origin", &origin])?;
        env.git(&["push", "-u", "origin", "main"])?;
        Ok(env)
    }

    /// Run a git command in the repository directory
    ///
    /// # Errors
    /// Returns an error if the command fails
    pub fn git(&self, args: &[&str]) -> Result<String> {
        git_in(self.repo_dir.path(), args)
    }

    /// Creates a commit on top of `parent` without touching any checkout
    ///
    /// # Errors
    /// Returns an error if the commit cannot be created
    pub fn commit_on(&self, parent: &str, message: &str) -> Result<String> {
        self.git(&["commit-tree", "HEAD^{tree}", "-p", parent, "-m", message])
    }

    /// Points a remote-tracking ref at `commit` as if it had been fetched
    ///
    /// # Errors
    /// Returns an error if the ref cannot be written
    pub fn fake_remote_branch(&self, remote: &str, branch: &str, commit: &str) -> Result<()> {
        self.git(&[
            "update-ref",
            &format!("refs/remotes/{remote}/{branch}"),
            commit,
        ])?;
        Ok(())
    }

    /// The configured upstream of a local branch, e.g. `origin/feature`
    pub fn upstream_of(&self, branch: &str) -> Option<String> {
        self.git(&[
            "rev-parse",
            "--abbrev-ref",
            "--symbolic-full-name",
            &format!("{branch}@{{upstream}}"),
        ])
        .ok()
    }

    /// Execute a CLI command from the repository directory
    ///
    /// # Errors
    /// Returns an error if the command setup fails
    pub fn run_command(&self, args: &[&str]) -> Result<assert_cmd::Command> {
        self.run_command_in(self.repo_dir.path(), args)
    }

    /// Execute a CLI command from an arbitrary directory
    ///
    /// # Errors
    /// Returns an error if the command setup fails
    pub fn run_command_in(&self, dir: &Path, args: &[&str]) -> Result<assert_cmd::Command> {
        let mut cmd =
            assert_cmd::Command::cargo_bin("wtree").context("Failed to find wtree binary")?;

        cmd.current_dir(dir).env_remove("WTREE_LOG");
        cmd.args(args);
        Ok(cmd)
    }

    /// Default directory new worktrees land in: `<temp>/test_repo.worktrees`
    pub fn worktrees_dir(&self) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child("test_repo.worktrees")
    }

    /// Get the default path of a branch's worktree
    pub fn worktree_path(&self, branch_name: &str) -> assert_fs::fixture::ChildPath {
        // Use the same sanitization logic as the main application
        let sanitized = branch_name.replace('/', "-");
        self.worktrees_dir().child(&sanitized)
    }

    /// A scratch path inside the temporary directory
    pub fn scratch(&self, name: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use predicates::prelude::*;

    #[test]
    fn test_cli_test_environment_creation() -> Result<()> {
        let env = CliTestEnvironment::new()?;

        env.repo_dir.assert(predicate::path::is_dir());
        env.repo_dir.child(".git").assert(predicate::path::exists());
        env.repo_dir
            .child("README.md")
            .assert(predicate::str::contains("# Test Repo"));

        Ok(())
    }

    #[test]
    fn test_origin_has_main() -> Result<()> {
        let env = CliTestEnvironment::with_origin()?;
        assert_eq!(env.upstream_of("main").as_deref(), Some("origin/main"));
        Ok(())
    }

    #[test]
    fn test_worktree_path_sanitization() {
        let env = CliTestEnvironment::new().unwrap();
        let path = env.worktree_path("feature/test-branch");
        assert!(path
            .path()
            .to_string_lossy()
            .ends_with("test_repo.worktrees/feature-test-branch"));
    }
}
