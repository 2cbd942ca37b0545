use crate::config::Settings;
use crate::error::Result;
use crate::process::{CommandOutput, CommandRequest};
use crate::repository::RepositoryContext;

/// Executes external processes on behalf of the core.
///
/// Implementations never fail: a process that could not be spawned is
/// reported through the returned [`CommandOutput`], and a non-zero exit
/// code is the only failure signal callers inspect.
pub trait CommandRunner {
    fn run(&self, request: &CommandRequest) -> CommandOutput;
}

/// Loads and persists the per-repository [`Settings`] object
pub trait ConfigStore {
    /// Loads settings, filling absent fields with detected defaults
    ///
    /// # Errors
    /// Returns an error if the settings file exists but cannot be read
    fn load(&self, context: &RepositoryContext) -> Result<Settings>;

    /// Rewrites the whole settings object
    ///
    /// # Errors
    /// Returns an error if the settings file cannot be written
    fn save(&self, context: &RepositoryContext, settings: &Settings) -> Result<()>;
}
