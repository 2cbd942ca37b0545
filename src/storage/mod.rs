use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::repository::RepositoryContext;

/// Characters that cannot appear in a directory name on every platform
const UNSAFE_PATH_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Turns a branch name into a single directory name
#[must_use]
pub fn sanitize_branch_name(branch_name: &str) -> String {
    branch_name.replace(UNSAFE_PATH_CHARS, "-")
}

/// Expands a leading `~` to the user's home directory
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// The configured worktree directory as an absolute path
#[must_use]
pub fn worktree_root(settings: &Settings, context: &RepositoryContext) -> PathBuf {
    let configured = expand_home(&settings.worktree_directory);
    if configured.is_absolute() {
        configured
    } else {
        context.root_dir.join(configured)
    }
}

/// Where the worktree for `branch_name` is created
#[must_use]
pub fn worktree_path(
    settings: &Settings,
    context: &RepositoryContext,
    branch_name: &str,
) -> PathBuf {
    worktree_root(settings, context).join(sanitize_branch_name(branch_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::LayoutKind;

    fn context() -> RepositoryContext {
        RepositoryContext {
            root_dir: PathBuf::from("/work/repo"),
            metadata_dir: PathBuf::from("/work/repo/.git"),
            layout: LayoutKind::Standard,
            bare_store: None,
        }
    }

    #[test]
    fn test_sanitize_branch_name() {
        assert_eq!(sanitize_branch_name("feature/auth"), "feature-auth");
        assert_eq!(sanitize_branch_name("fix:bug*1"), "fix-bug-1");
        assert_eq!(sanitize_branch_name("plain"), "plain");
    }

    #[test]
    fn test_relative_directory_resolves_against_root() {
        let settings = Settings {
            worktree_directory: PathBuf::from("../trees"),
            ..Settings::default()
        };
        assert_eq!(
            worktree_path(&settings, &context(), "feature/auth"),
            PathBuf::from("/work/repo/../trees/feature-auth")
        );
    }

    #[test]
    fn test_absolute_directory_used_as_is() {
        let settings = Settings {
            worktree_directory: PathBuf::from("/srv/trees"),
            ..Settings::default()
        };
        assert_eq!(
            worktree_path(&settings, &context(), "main"),
            PathBuf::from("/srv/trees/main")
        );
    }

    #[test]
    fn test_expand_home() {
        let expanded = expand_home(Path::new("~/trees"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("trees"));
        }
        assert_eq!(expand_home(Path::new("/abs")), PathBuf::from("/abs"));
    }
}
