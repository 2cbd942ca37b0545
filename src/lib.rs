//! # wtree
//!
//! Manages one git worktree per branch. Given a branch name, wtree decides
//! whether to attach an existing local branch, adopt a remote branch, or
//! start a new one, creates the worktree, and makes sure the branch tracks
//! its remote counterpart.
//!
//! ## Quick Start
//!
//! ```bash
//! # Worktree for a branch, wherever it currently lives
//! wtree create feature/auth
//!
//! # List all worktrees of the repository
//! wtree list
//!
//! # Remove a worktree by branch name or path
//! wtree remove feature/auth
//! ```
//!
//! ## Module Structure
//!
//! - [`repository`] - Locates the enclosing repository and classifies its layout
//! - [`resolver`] - Decides whether a branch is local, remote-only or new
//! - [`manager`] - Creates, removes and lists worktrees
//! - [`upstream`] - Repairs missing upstream tracking after creation
//! - [`git`] - Git commands bound to one repository
//! - [`process`] - Subprocess execution and failure classification
//! - [`config`] - Per-repository JSON settings
//! - [`storage`] - Maps branch names to worktree directories
//! - [`commands`] - Command implementations behind the CLI
//! - [`traits`] - `CommandRunner` and `ConfigStore` capability traits

pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod hooks;
pub mod logging;
pub mod manager;
pub mod process;
pub mod repository;
pub mod resolver;
pub mod storage;
pub mod traits;
pub mod upstream;

pub use error::{Error, Result};
