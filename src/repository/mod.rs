//! Repository layout detection.
//!
//! A repository is recognised in one of three layouts, checked at each
//! directory level in a fixed order:
//!
//! 1. **Bare**: a `.bare` directory holds the shared metadata store and the
//!    directory containing it is the root that sibling worktrees live under.
//! 2. **Linked file**: a `.git` *file* containing `gitdir: <path>` points at
//!    the metadata store (a `.bare` store, or a per-worktree directory).
//! 3. **Standard**: a `.git` directory.
//!
//! The bare store wins over a link file at the same level so one root can
//! serve many worktrees that each carry only a link file.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Directory name of the bare metadata store
pub const BARE_DIR: &str = ".bare";
/// Name of both the standard metadata directory and the linkage file
pub const GIT_ENTRY: &str = ".git";
/// Configuration file every bare store must contain
pub const BARE_CONFIG_FILE: &str = "config";

const GITDIR_PREFIX: &str = "gitdir:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    Bare,
    LinkedFile,
    Standard,
}

/// The repository governing one command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    pub root_dir: PathBuf,
    pub metadata_dir: PathBuf,
    pub layout: LayoutKind,
    /// Set when a link file resolves directly to a `.bare` store
    pub bare_store: Option<PathBuf>,
}

impl RepositoryContext {
    /// The shared metadata store.
    ///
    /// Per-worktree metadata directories record the shared store in a
    /// `commondir` file; every other layout already points at it.
    #[must_use]
    pub fn common_dir(&self) -> PathBuf {
        if self.layout != LayoutKind::LinkedFile {
            return self.metadata_dir.clone();
        }

        let commondir_file = self.metadata_dir.join("commondir");
        match fs::read_to_string(&commondir_file) {
            Ok(content) if !content.trim().is_empty() => {
                let common = self.metadata_dir.join(content.trim());
                fs::canonicalize(&common).unwrap_or(common)
            }
            _ => self.metadata_dir.clone(),
        }
    }

    /// Whether the shared store is a `.bare` directory
    #[must_use]
    pub fn uses_bare_store(&self) -> bool {
        self.common_dir().file_name().is_some_and(|name| name == BARE_DIR)
    }

    /// Display name of the repository, taken from the directory that
    /// holds the shared store
    #[must_use]
    pub fn repo_name(&self) -> String {
        let common = self.common_dir();
        let owner = if common.file_name().is_some_and(|n| n == BARE_DIR || n == GIT_ENTRY) {
            common.parent().map(Path::to_path_buf)
        } else {
            Some(common.clone())
        };

        owner
            .as_deref()
            .and_then(Path::file_name)
            .map_or_else(
                || "repository".to_string(),
                |n| {
                    let name = n.to_string_lossy();
                    name.strip_suffix(".git").unwrap_or(&name).to_string()
                },
            )
    }
}

/// Walks from `start_dir` towards the filesystem root and classifies the
/// first enclosing repository.
///
/// # Errors
/// Returns [`Error::NotARepository`] when no level matches.
pub fn locate(start_dir: &Path) -> Result<RepositoryContext> {
    let start = fs::canonicalize(start_dir).unwrap_or_else(|_| start_dir.to_path_buf());

    // `ancestors` ends at the root, which bounds the walk
    for dir in start.ancestors() {
        if let Some(context) = classify(dir) {
            debug!(
                root = %context.root_dir.display(),
                metadata = %context.metadata_dir.display(),
                layout = ?context.layout,
                "located repository"
            );
            return Ok(context);
        }
    }

    Err(Error::NotARepository {
        start: start_dir.to_path_buf(),
    })
}

fn classify(dir: &Path) -> Option<RepositoryContext> {
    let bare = dir.join(BARE_DIR);
    if bare.is_dir() {
        return Some(RepositoryContext {
            root_dir: dir.to_path_buf(),
            metadata_dir: bare,
            layout: LayoutKind::Bare,
            bare_store: None,
        });
    }

    let git_entry = dir.join(GIT_ENTRY);
    if git_entry.is_file() {
        if let Some(target) = read_link_file(&git_entry, dir) {
            let points_at_bare = target.file_name().is_some_and(|name| name == BARE_DIR);
            return Some(RepositoryContext {
                root_dir: dir.to_path_buf(),
                bare_store: points_at_bare.then(|| target.clone()),
                metadata_dir: target,
                layout: LayoutKind::LinkedFile,
            });
        }
    }

    if git_entry.is_dir() {
        return Some(RepositoryContext {
            root_dir: dir.to_path_buf(),
            metadata_dir: git_entry,
            layout: LayoutKind::Standard,
            bare_store: None,
        });
    }

    None
}

/// Parses a `gitdir: <path>` link file, resolving relative paths against
/// the directory holding the file. Returns `None` for any other content.
fn read_link_file(file: &Path, dir: &Path) -> Option<PathBuf> {
    let content = fs::read_to_string(file).ok()?;
    let target = content.lines().next()?.trim().strip_prefix(GITDIR_PREFIX)?.trim();
    if target.is_empty() {
        return None;
    }

    let resolved = dir.join(target);
    Some(fs::canonicalize(&resolved).unwrap_or(resolved))
}

/// Checks that the metadata store is usable.
///
/// # Errors
/// Returns [`Error::InvalidRepository`] when the metadata path is missing,
/// or when a bare store has no configuration file.
pub fn validate(context: &RepositoryContext) -> Result<()> {
    if !context.metadata_dir.exists() {
        return Err(Error::InvalidRepository {
            path: context.metadata_dir.clone(),
            reason: "metadata directory does not exist".to_string(),
        });
    }

    if context.layout == LayoutKind::Bare
        && !context.metadata_dir.join(BARE_CONFIG_FILE).is_file()
    {
        return Err(Error::InvalidRepository {
            path: context.metadata_dir.clone(),
            reason: format!("bare store has no '{}' file", BARE_CONFIG_FILE),
        });
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn canonical(path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap()
    }

    #[test]
    fn test_locate_standard_layout() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::create_dir_all(temp.path().join("src/nested")).unwrap();

        let context = locate(&temp.path().join("src/nested")).unwrap();
        assert_eq!(context.layout, LayoutKind::Standard);
        assert_eq!(context.root_dir, canonical(temp.path()));
        assert_eq!(context.metadata_dir, canonical(temp.path()).join(".git"));
    }

    #[test]
    fn test_locate_bare_from_deep_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".bare")).unwrap();
        fs::write(temp.path().join(".bare/config"), "[core]\n\tbare = true\n").unwrap();
        fs::create_dir_all(temp.path().join("a/b/c")).unwrap();

        let context = locate(&temp.path().join("a/b/c")).unwrap();
        assert_eq!(context.layout, LayoutKind::Bare);
        assert_eq!(context.root_dir, canonical(temp.path()));
        assert!(validate(&context).is_ok());
    }

    #[test]
    fn test_bare_dir_takes_priority_over_link_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".bare")).unwrap();
        fs::write(temp.path().join(".git"), "gitdir: ./.bare\n").unwrap();

        let context = locate(temp.path()).unwrap();
        assert_eq!(context.layout, LayoutKind::Bare);
    }

    #[test]
    fn test_link_file_to_bare_store_sets_back_reference() {
        let temp = TempDir::new().unwrap();
        let store = temp.path().join("store/.bare");
        fs::create_dir_all(&store).unwrap();
        let worktree = temp.path().join("checkout");
        fs::create_dir_all(&worktree).unwrap();
        fs::write(worktree.join(".git"), "gitdir: ../store/.bare\n").unwrap();

        let context = locate(&worktree).unwrap();
        assert_eq!(context.layout, LayoutKind::LinkedFile);
        assert_eq!(context.root_dir, canonical(&worktree));
        assert_eq!(context.bare_store, Some(canonical(&store)));
        assert!(context.uses_bare_store());
    }

    #[test]
    fn test_link_file_to_worktree_metadata() {
        let temp = TempDir::new().unwrap();
        let main_git = temp.path().join("main/.git");
        let per_worktree = main_git.join("worktrees/feature");
        fs::create_dir_all(&per_worktree).unwrap();
        fs::write(per_worktree.join("commondir"), "../..\n").unwrap();

        let worktree = temp.path().join("feature");
        fs::create_dir_all(&worktree).unwrap();
        fs::write(
            worktree.join(".git"),
            format!("gitdir: {}\n", per_worktree.display()),
        )
        .unwrap();

        let context = locate(&worktree).unwrap();
        assert_eq!(context.layout, LayoutKind::LinkedFile);
        assert_eq!(context.bare_store, None);
        assert_eq!(context.metadata_dir, canonical(&per_worktree));
        assert_eq!(context.common_dir(), canonical(&main_git));
        assert_eq!(context.repo_name(), "main");
    }

    #[test]
    fn test_malformed_link_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        let child = temp.path().join("child");
        fs::create_dir_all(&child).unwrap();
        fs::write(child.join(".git"), "not a link\n").unwrap();

        let context = locate(&child).unwrap();
        assert_eq!(context.layout, LayoutKind::Standard);
        assert_eq!(context.root_dir, canonical(temp.path()));
    }

    #[test]
    fn test_validate_bare_without_config_fails() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".bare")).unwrap();

        let context = locate(temp.path()).unwrap();
        assert!(matches!(
            validate(&context),
            Err(Error::InvalidRepository { .. })
        ));
    }

    #[test]
    fn test_validate_missing_metadata_dir_fails() {
        let context = RepositoryContext {
            root_dir: PathBuf::from("/nonexistent-wtree-root"),
            metadata_dir: PathBuf::from("/nonexistent-wtree-root/.git"),
            layout: LayoutKind::Standard,
            bare_store: None,
        };
        assert!(matches!(
            validate(&context),
            Err(Error::InvalidRepository { .. })
        ));
    }
}
