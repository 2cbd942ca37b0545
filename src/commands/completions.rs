use clap::{Command, ValueEnum};
use clap_complete::{Shell as CompleteShell, generate};
use std::io;

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl From<Shell> for CompleteShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompleteShell::Bash,
            Shell::Zsh => CompleteShell::Zsh,
            Shell::Fish => CompleteShell::Fish,
        }
    }
}

/// Writes clap-generated completions for `shell` to stdout
pub fn generate_completions(shell: Shell, cmd: &mut Command) {
    let name = cmd.get_name().to_string();
    generate(CompleteShell::from(shell), cmd, name, &mut io::stdout());
}
