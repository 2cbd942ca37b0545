//! Per-repository settings.
//!
//! Settings live in `wtree.json` inside the shared metadata store, so every
//! worktree of a repository sees the same values. Every field is optional
//! on disk; absent fields take defaults detected from the repository:
//!
//! ```json
//! {
//!   "worktreeDirectory": "../worktrees",
//!   "autoFetch": false
//! }
//! ```
//!
//! A file that fails to parse is reported and ignored rather than aborting
//! the command.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::git::Git;
use crate::manager::{WorktreeRecord, parse_worktree_list};
use crate::repository::{GIT_ENTRY, RepositoryContext};
use crate::traits::{CommandRunner, ConfigStore};

/// File name of the settings file inside the shared metadata store
pub const SETTINGS_FILE: &str = "wtree.json";

const FALLBACK_DEFAULT_BRANCH: &str = "main";

/// Keys accepted by [`Settings::get`] and [`Settings::set`]
pub const SETTING_KEYS: &[&str] = &[
    "worktreeDirectory",
    "autoFetch",
    "confirmBeforeDelete",
    "defaultBranch",
    "postCreateHook",
    "postRemoveHook",
];

/// Settings for one invocation. Built once and passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Directory new worktrees are created under. Relative paths are
    /// resolved against the repository root; `~` expands to home.
    pub worktree_directory: PathBuf,
    /// Fetch all remotes before resolving a branch
    pub auto_fetch: bool,
    /// Require explicit confirmation (`--yes`) before removing a worktree
    pub confirm_before_delete: bool,
    #[serde(rename = "defaultBranch")]
    pub default_branch_name: String,
    /// Shell command run inside a new worktree after creation
    pub post_create_hook: Option<String>,
    /// Shell command run in the repository root after removal
    pub post_remove_hook: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            worktree_directory: PathBuf::from(".."),
            auto_fetch: true,
            confirm_before_delete: false,
            default_branch_name: FALLBACK_DEFAULT_BRANCH.to_string(),
            post_create_hook: None,
            post_remove_hook: None,
        }
    }
}

/// On-disk shape: every field optional so partial files merge with defaults
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    worktree_directory: Option<PathBuf>,
    auto_fetch: Option<bool>,
    confirm_before_delete: Option<bool>,
    default_branch: Option<String>,
    post_create_hook: Option<String>,
    post_remove_hook: Option<String>,
}

impl StoredSettings {
    fn merged_with(self, defaults: Settings) -> Settings {
        Settings {
            worktree_directory: self
                .worktree_directory
                .unwrap_or(defaults.worktree_directory),
            auto_fetch: self.auto_fetch.unwrap_or(defaults.auto_fetch),
            confirm_before_delete: self
                .confirm_before_delete
                .unwrap_or(defaults.confirm_before_delete),
            default_branch_name: self
                .default_branch
                .unwrap_or(defaults.default_branch_name),
            post_create_hook: self.post_create_hook.or(defaults.post_create_hook),
            post_remove_hook: self.post_remove_hook.or(defaults.post_remove_hook),
        }
    }
}

impl Settings {
    /// Defaults for a repository, given its current worktrees.
    ///
    /// The worktree directory is, in order: the shared parent of existing
    /// secondary worktrees, the directory holding a `.bare` store, or a
    /// `<repo>.worktrees` directory next to the main checkout.
    #[must_use]
    pub fn detected(
        context: &RepositoryContext,
        worktrees: &[WorktreeRecord],
        default_branch: Option<String>,
    ) -> Self {
        Self {
            worktree_directory: detect_worktree_directory(context, worktrees),
            default_branch_name: default_branch
                .unwrap_or_else(|| FALLBACK_DEFAULT_BRANCH.to_string()),
            ..Self::default()
        }
    }

    /// Reads one setting as text
    ///
    /// # Errors
    /// Returns [`Error::UnknownSetting`] for keys outside [`SETTING_KEYS`]
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "worktreeDirectory" => self.worktree_directory.display().to_string(),
            "autoFetch" => self.auto_fetch.to_string(),
            "confirmBeforeDelete" => self.confirm_before_delete.to_string(),
            "defaultBranch" => self.default_branch_name.clone(),
            "postCreateHook" => self.post_create_hook.clone().unwrap_or_default(),
            "postRemoveHook" => self.post_remove_hook.clone().unwrap_or_default(),
            _ => return Err(Error::UnknownSetting(key.to_string())),
        };
        Ok(value)
    }

    /// Parses and validates one setting. An empty hook value clears it.
    ///
    /// # Errors
    /// Returns [`Error::UnknownSetting`] or [`Error::InvalidSetting`]; the
    /// settings are left unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "worktreeDirectory" => {
                if value.is_empty() {
                    return Err(invalid(key, "must not be empty"));
                }
                self.worktree_directory = PathBuf::from(value);
            }
            "autoFetch" => self.auto_fetch = parse_bool(key, value)?,
            "confirmBeforeDelete" => self.confirm_before_delete = parse_bool(key, value)?,
            "defaultBranch" => {
                if value.is_empty() || value.chars().any(char::is_whitespace) {
                    return Err(invalid(key, "must be a branch name without whitespace"));
                }
                self.default_branch_name = value.to_string();
            }
            "postCreateHook" => self.post_create_hook = non_empty(value),
            "postRemoveHook" => self.post_remove_hook = non_empty(value),
            _ => return Err(Error::UnknownSetting(key.to_string())),
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> Error {
    Error::InvalidSetting {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, "expected true or false")),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn detect_worktree_directory(context: &RepositoryContext, worktrees: &[WorktreeRecord]) -> PathBuf {
    // The first listed worktree is the main checkout (or the bare store)
    let mut parents = worktrees
        .iter()
        .skip(1)
        .filter(|record| !record.is_bare)
        .filter_map(|record| record.path.parent());
    if let Some(first) = parents.next() {
        if parents.all(|parent| parent == first) {
            return first.to_path_buf();
        }
    }

    let common = context.common_dir();
    if context.uses_bare_store() {
        if let Some(parent) = common.parent() {
            return parent.to_path_buf();
        }
    }

    let main_root = if common.file_name().is_some_and(|name| name == GIT_ENTRY) {
        common.parent().map_or_else(|| context.root_dir.clone(), Path::to_path_buf)
    } else {
        context.root_dir.clone()
    };
    let container = main_root.parent().unwrap_or(&main_root);
    container.join(format!("{}.worktrees", context.repo_name()))
}

/// JSON-file [`ConfigStore`] that detects defaults through git
pub struct JsonConfigStore<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> JsonConfigStore<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    #[must_use]
    pub fn settings_path(context: &RepositoryContext) -> PathBuf {
        context.common_dir().join(SETTINGS_FILE)
    }

    fn detect_defaults(&self, context: &RepositoryContext) -> Settings {
        let git = Git::new(self.runner, context);

        let listing = git.list_worktrees_porcelain();
        let worktrees = if listing.is_success() {
            parse_worktree_list(&listing.stdout)
        } else {
            Vec::new()
        };

        // HEAD of a per-worktree metadata dir is that worktree's branch;
        // the default comes from the shared store's HEAD
        let store = RepositoryContext {
            metadata_dir: context.common_dir(),
            ..context.clone()
        };
        let store_git = Git::new(self.runner, &store);

        let default_branch = store_git
            .symbolic_ref("refs/remotes/origin/HEAD")
            .and_then(|target| target.split_once('/').map(|(_, branch)| branch.to_string()))
            .or_else(|| store_git.symbolic_ref("HEAD"));

        Settings::detected(context, &worktrees, default_branch)
    }
}

impl ConfigStore for JsonConfigStore<'_> {
    fn load(&self, context: &RepositoryContext) -> Result<Settings> {
        let defaults = self.detect_defaults(context);
        let path = Self::settings_path(context);

        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(defaults);
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(defaults);
        }

        match serde_json::from_str::<StoredSettings>(&content) {
            Ok(stored) => Ok(stored.merged_with(defaults)),
            Err(e) => {
                warn!(
                    "Invalid settings in {}: {}. \
                     Using defaults; fix the file or run `wtree config set`.",
                    path.display(),
                    e
                );
                Ok(defaults)
            }
        }
    }

    fn save(&self, context: &RepositoryContext, settings: &Settings) -> Result<()> {
        let path = Self::settings_path(context);
        let mut content = serde_json::to_string_pretty(settings)?;
        content.push('\n');

        // Write to a temp file then rename so readers never see a partial file
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;

        debug!(path = %path.display(), "settings saved");
        Ok(())
    }
}
