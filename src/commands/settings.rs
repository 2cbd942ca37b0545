use anyhow::{Context, Result};
use std::path::Path;

use super::open_repository;
use crate::config::{JsonConfigStore, Settings};
use crate::process::SystemCommandRunner;
use crate::traits::{CommandRunner, ConfigStore};

/// What `wtree config` should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    Show,
    Get { key: String },
    Set { key: String, value: String },
}

/// Runs a settings action against the repository around the current directory
///
/// # Errors
/// Returns an error if no usable repository is found, the key is unknown,
/// the value is invalid, or the settings file cannot be written
pub fn run_settings(action: &SettingsAction) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    run_settings_with_runner(&SystemCommandRunner, &current_dir, action)?;
    Ok(())
}

/// Runs a settings action with an explicit runner; returns the settings
/// in effect afterwards
///
/// # Errors
/// Returns an error if no usable repository is found, the key is unknown,
/// the value is invalid, or the settings file cannot be written
pub fn run_settings_with_runner(
    runner: &dyn CommandRunner,
    start_dir: &Path,
    action: &SettingsAction,
) -> Result<Settings> {
    let context = open_repository(start_dir)?;
    let store = JsonConfigStore::new(runner);
    let mut settings = store.load(&context)?;

    match action {
        SettingsAction::Show => {
            println!("# {}", JsonConfigStore::settings_path(&context).display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Get { key } => {
            println!("{}", settings.get(key)?);
        }
        SettingsAction::Set { key, value } => {
            settings.set(key, value)?;
            store
                .save(&context, &settings)
                .context("Failed to save settings")?;
            println!("✓ {} = {}", key, settings.get(key)?);
        }
    }

    Ok(settings)
}
