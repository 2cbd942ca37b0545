use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use wtree::commands::completions::{self, Shell};
use wtree::commands::remove::RemoveOptions;
use wtree::commands::settings::SettingsAction;
use wtree::commands::{create, list, remove, settings};
use wtree::logging;

#[derive(Parser)]
#[command(name = "wtree")]
#[command(about = "Manage one git worktree per branch")]
#[command(version)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a worktree for a local, remote or new branch
    Create {
        /// Branch name for the worktree
        #[arg(value_hint = ValueHint::Other)]
        branch: String,
    },
    /// List all worktrees of the repository
    List {
        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a worktree (the branch is kept)
    Remove {
        /// Branch name or path of the worktree
        #[arg(value_hint = ValueHint::Other)]
        target: Option<String>,
        /// Remove even if the worktree has local modifications
        #[arg(long)]
        force: bool,
        /// Confirm removal when confirmBeforeDelete is enabled
        #[arg(short, long)]
        yes: bool,
        /// List removable worktrees for completion (internal use)
        #[arg(long, hide = true)]
        list_completions: bool,
    },
    /// Show or change repository settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print all settings
    Show,
    /// Print one setting
    Get { key: String },
    /// Change one setting
    Set { key: String, value: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match cli.command {
        Commands::Create { branch } => {
            create::create_worktree(&branch)?;
        }
        Commands::List { json } => {
            list::list_worktrees(json)?;
        }
        Commands::Remove {
            target,
            force,
            yes,
            list_completions,
        } => {
            let options = RemoveOptions {
                force,
                confirmed: yes,
            };
            remove::remove_worktree(target.as_deref(), options, list_completions)?;
        }
        Commands::Config { action } => {
            let action = match action {
                ConfigCommand::Show => SettingsAction::Show,
                ConfigCommand::Get { key } => SettingsAction::Get { key },
                ConfigCommand::Set { key, value } => SettingsAction::Set { key, value },
            };
            settings::run_settings(&action)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            completions::generate_completions(shell, &mut cmd);
        }
    }

    Ok(())
}
